use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("horizontalrunnerautoscaler {namespace}/{name} not found")]
    NotFound { namespace: String, name: String },

    #[error("optimistic concurrency conflict patching {namespace}/{name}: expected resource_version {expected}, found {actual}")]
    Conflict {
        namespace: String,
        name: String,
        expected: u64,
        actual: u64,
    },
}
