mod file;
mod memory;
use crate::cli::Args;
use crate::store::auth::AuthState;
use async_trait::async_trait;
use log::info;
use std::error::Error;
use std::sync::Arc;

pub use file::FileAuthRepository;
pub use memory::MemoryAuthRepository;

/// Persistence seam under the credential store. `load` rehydrates the full
/// auth document at startup; `save` replaces it after a mutation.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn load(&self) -> Result<AuthState, Box<dyn Error + Send + Sync>>;

    async fn save(&self, state: &AuthState) -> Result<(), Box<dyn Error + Send + Sync>>;
}

pub fn create_auth_repository(
    args: &Args
) -> Result<Arc<dyn AuthRepository>, Box<dyn Error + Send + Sync>> {
    match args.auth_store.to_lowercase().as_str() {
        "file" => {
            info!("Credentials will be stored in: {}", args.data_dir);
            let repository = FileAuthRepository::new(&args.data_dir)?;
            Ok(Arc::new(repository))
        }
        "memory" => Ok(Arc::new(MemoryAuthRepository::new())),
        _ =>
            Err(
                Box::new(
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("Unsupported auth store type: {}", args.auth_store)
                    )
                )
            ),
    }
}
