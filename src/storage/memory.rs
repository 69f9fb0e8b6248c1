use crate::storage::AuthRepository;
use crate::store::auth::AuthState;
use async_trait::async_trait;
use std::error::Error;
use tokio::sync::Mutex;

/// In-process backend: state lives only as long as the repository. Used by
/// tests and for running without touching the filesystem.
#[derive(Default)]
pub struct MemoryAuthRepository {
    state: Mutex<AuthState>,
}

impl MemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthRepository for MemoryAuthRepository {
    async fn load(&self) -> Result<AuthState, Box<dyn Error + Send + Sync>> {
        Ok(self.state.lock().await.clone())
    }

    async fn save(&self, state: &AuthState) -> Result<(), Box<dyn Error + Send + Sync>> {
        *self.state.lock().await = state.clone();
        Ok(())
    }
}
