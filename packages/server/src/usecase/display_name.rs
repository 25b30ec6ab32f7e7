//! 表示名の解決

use crate::domain::{DisplayName, NameRepository};

/// 名前プールから表示名を 1 つ取得する。
///
/// プールが空、または取得に失敗した場合は `Anonymous` を返す。
pub(crate) async fn resolve_display_name(name_repository: &dyn NameRepository) -> DisplayName {
    match name_repository.random_name().await {
        Ok(name) => name,
        Err(e) => {
            tracing::warn!("Falling back to anonymous display name: {}", e);
            DisplayName::anonymous()
        }
    }
}
