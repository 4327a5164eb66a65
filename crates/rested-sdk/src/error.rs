use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("collection already mounted: {0}")]
    AlreadyMounted(String),

    #[error("store error: {0}")]
    Store(#[from] rested_store::StoreError),

    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SdkResult<T> = Result<T, SdkError>;
