//! InMemory Name Repository 実装
//!
//! 匿名の表示名プール。予約済み（`reserved`）の名前は払い出さない。

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tokio::sync::RwLock;

use crate::domain::{DisplayName, NameRepository, RepositoryError};

/// デフォルトの表示名（果物の名前）
const DEFAULT_NAMES: &[&str] = &[
    "Apple",
    "Apricot",
    "Avocado",
    "Banana",
    "Blackberry",
    "Blueberry",
    "Cherry",
    "Coconut",
    "Cranberry",
    "Date",
    "Dragonfruit",
    "Durian",
    "Fig",
    "Grape",
    "Grapefruit",
    "Guava",
    "Kiwi",
    "Kumquat",
    "Lemon",
    "Lime",
    "Lychee",
    "Mango",
    "Melon",
    "Mulberry",
    "Nectarine",
    "Olive",
    "Orange",
    "Papaya",
    "Passionfruit",
    "Peach",
    "Pear",
    "Persimmon",
    "Pineapple",
    "Plum",
    "Pomegranate",
    "Quince",
    "Raspberry",
    "Strawberry",
    "Tangerine",
    "Watermelon",
    "Yuzu",
];

/// 名前プールの 1 エントリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameEntry {
    pub name: DisplayName,
    pub reserved: bool,
}

impl NameEntry {
    pub fn new(name: DisplayName, reserved: bool) -> Self {
        Self { name, reserved }
    }
}

/// インメモリ Name Repository 実装
pub struct InMemoryNameRepository {
    entries: RwLock<Vec<NameEntry>>,
}

impl InMemoryNameRepository {
    pub fn new(entries: Vec<NameEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// デフォルトの名前一覧で作成（全て未予約）
    pub fn with_default_names() -> Self {
        let entries = DEFAULT_NAMES
            .iter()
            .filter_map(|name| DisplayName::new((*name).to_string()).ok())
            .map(|name| NameEntry::new(name, false))
            .collect();
        Self::new(entries)
    }
}

#[async_trait]
impl NameRepository for InMemoryNameRepository {
    async fn random_name(&self) -> Result<DisplayName, RepositoryError> {
        let entries = self.entries.read().await;
        let unreserved: Vec<&NameEntry> = entries.iter().filter(|e| !e.reserved).collect();
        unreserved
            .choose(&mut rand::thread_rng())
            .map(|entry| entry.name.clone())
            .ok_or(RepositoryError::NamePoolExhausted)
    }
}
