use crate::storage::AuthRepository;
use crate::store::auth::AuthState;
use async_trait::async_trait;
use std::error::Error;
use std::fs;
use std::path::{ Path, PathBuf };
use thiserror::Error as ThisError;

/// Fixed store name, one JSON document per installation.
const STORE_NAME: &str = "auth-storage.json";

#[derive(Debug, ThisError)]
pub enum StorageError {
    #[error("auth store IO error: {0}")] Io(#[from] std::io::Error),
    #[error("auth store parse error: {0}")] Json(#[from] serde_json::Error),
}

/// Stores the serialized auth document as a single JSON file under the data
/// directory. The whole document is rewritten on every save.
pub struct FileAuthRepository {
    path: PathBuf,
}

impl FileAuthRepository {
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;
        Ok(Self {
            path: data_dir.join(STORE_NAME),
        })
    }
}

#[async_trait]
impl AuthRepository for FileAuthRepository {
    async fn load(&self) -> Result<AuthState, Box<dyn Error + Send + Sync>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            // No document yet: a fresh installation starts empty.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(AuthState::default());
            }
            Err(e) => {
                return Err(Box::new(StorageError::Io(e)));
            }
        };
        let state = serde_json::from_str(&content).map_err(StorageError::Json)?;
        Ok(state)
    }

    async fn save(&self, state: &AuthState) -> Result<(), Box<dyn Error + Send + Sync>> {
        let content = serde_json::to_string_pretty(state).map_err(StorageError::Json)?;
        fs::write(&self.path, content).map_err(StorageError::Io)?;
        Ok(())
    }
}
