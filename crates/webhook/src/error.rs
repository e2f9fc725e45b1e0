//! Dispatcher-level errors (§4.4). Every early return here ends up as a 500
//! with the error text in the body - the Rust equivalent of the reference
//! implementation's deferred-response-flag idiom, expressed as a typed
//! `Result` instead of a mutable "did we respond yet" boolean.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DispatchError>;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid webhook signature")]
    InvalidSignature,

    #[error("failed to parse {event_kind} payload: {source}")]
    PayloadParse {
        event_kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Resolver(#[from] arc_core::resolver::ResolverError),

    #[error(transparent)]
    Engine(#[from] arc_core::engine::EngineError),
}
