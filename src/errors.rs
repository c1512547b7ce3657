use err_derive::Error;

/// This is the primary error type of the library
///
/// Most decode entry points will either return their `Ok(result)` or this
/// `Err(Error)`. Tolerated conditions (a skipped metadata document, a
/// truncated trailing packet) never surface here; they are reported as
/// diagnostics on the decoded structures instead.
#[derive(Debug, Error, Clone)]
pub enum Error {
    /// Error raised while deserialising the recording container
    #[error(display = "Recording deserialization error")]
    Deserialization(#[error(source)] crate::replay::de::Error),

    /// Error raised while decoding a gameplay packet
    #[error(display = "Packet deserialization error")]
    PacketDeserialization(#[error(source)] crate::gameplay::de::Error),
}

/// Convenience type alias for the library's error type
pub type Result<T> = std::result::Result<T, Error>;
