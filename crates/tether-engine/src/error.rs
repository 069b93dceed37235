use thiserror::Error;

pub type Result<T, E = EngineError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid app key (expected a UUID-shaped credential)")]
    InvalidAppKey,
    #[error("invalid app secret (expected a double-UUID-shaped credential)")]
    InvalidAppSecret,
}
