use std::collections::TryReserveError;
use std::fmt;
pub use Error::*;

/// Error codes
#[non_exhaustive]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// Sampling found no pixel above the alpha cutoff (e.g. fully transparent image)
    EmptyPixelSet = 99,
    /// Swap needs exactly two distinct selected palette entries
    InvalidSelection,
    /// There's no image loaded into the session
    MissingBuffer,
    /// Function called with invalid arguments
    ValueOutOfRange,
    /// Slice needs to be bigger, or width/height needs to be smaller
    BufferTooSmall,
    /// Either the system/process really hit a limit, or some data like image size was ridiculously wrong
    OutOfMemory,
    /// Progress callback said to stop
    Aborted,
    /// Some terrible inconsistency happened
    InternalError,
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    #[cold]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Self::EmptyPixelSet => "EMPTY_PIXEL_SET",
            Self::InvalidSelection => "INVALID_SELECTION",
            Self::MissingBuffer => "MISSING_BUFFER",
            Self::ValueOutOfRange => "VALUE_OUT_OF_RANGE",
            Self::BufferTooSmall => "BUFFER_TOO_SMALL",
            Self::OutOfMemory => "OUT_OF_MEMORY",
            Self::Aborted => "ABORTED",
            Self::InternalError => "INTERNAL_ERROR",
        })
    }
}

impl From<TryReserveError> for Error {
    #[cold]
    fn from(_: TryReserveError) -> Self {
        Self::OutOfMemory
    }
}

#[test]
fn codes() {
    assert_eq!("EMPTY_PIXEL_SET", EmptyPixelSet.to_string());
    assert_eq!("INVALID_SELECTION", InvalidSelection.to_string());
    assert_eq!(Error::OutOfMemory, Error::from(Vec::<u8>::new().try_reserve(usize::MAX).unwrap_err()));
}
