#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid fingerprint: {0:?}")]
    InvalidFingerprint(String),
}
