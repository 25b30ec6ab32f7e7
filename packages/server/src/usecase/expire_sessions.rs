//! UseCase: 期限切れセッションの削除

use std::sync::Arc;

use crate::domain::{RepositoryError, SessionRepository};

/// 期限切れセッション削除のユースケース（定期実行される）
pub struct ExpireSessionsUseCase {
    session_repository: Arc<dyn SessionRepository>,
}

impl ExpireSessionsUseCase {
    pub fn new(session_repository: Arc<dyn SessionRepository>) -> Self {
        Self { session_repository }
    }

    /// 期限切れのセッションを削除し、削除件数を返す
    pub async fn execute(&self) -> Result<usize, RepositoryError> {
        let purged = self.session_repository.purge_expired().await?;
        if purged > 0 {
            tracing::info!("Purged {} expired session(s)", purged);
        }
        Ok(purged)
    }
}
