use thiserror::Error;

pub type Result<T, E = ProtocolError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message carries no payload section")]
    MissingPayload,
    #[error("message carries no signature")]
    MissingSignature,
}
