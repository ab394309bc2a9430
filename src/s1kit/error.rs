use thiserror::Error;

#[derive(Error, Debug)]
pub enum KitError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage capacity exceeded while writing {key}")]
    CapacityExceeded { key: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Api Error: {0}")]
    Api(String),
}

impl KitError {
    /// True when a store rejected a write for size reasons.
    pub fn is_capacity(&self) -> bool {
        matches!(self, KitError::CapacityExceeded { .. })
    }
}

pub type Result<T> = std::result::Result<T, KitError>;
