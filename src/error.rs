//! Error and read-status types for the picopkt protocol

/// Frame-scoped failures reported by the parser and encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// CRC mismatch; frame discarded, parser reset
    Crc,
    /// Stop byte expected but a different byte arrived; frame discarded
    Stop,
    /// Payload exceeds the instance capacity (receive) or the TX FIFO
    /// lacks space for the whole frame (transmit)
    Memory,
    /// Invalid argument or unreachable parser state
    Hard,
}

impl Error {
    /// Returns a human-readable description of the error
    pub const fn description(&self) -> &'static str {
        match self {
            Error::Crc => "CRC verification failed",
            Error::Stop => "unexpected byte in place of stop byte",
            Error::Memory => "insufficient buffer capacity",
            Error::Hard => "invalid argument or state",
        }
    }
}

#[cfg(feature = "std")]
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Non-error outcome of a single parser invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadResult {
    /// A complete, integrity-verified frame is available through the accessors
    Valid,
    /// Bytes were consumed but the frame is not complete yet
    InProgress,
    /// Parser is idle, waiting for a start byte
    WaitingForData,
}

/// Result type alias for picopkt operations
pub type Result<T> = core::result::Result<T, Error>;
