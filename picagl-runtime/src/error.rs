//! GL error codes and the context's error latch.

use crate::gl;
use picagl_core::TilingError;
use thiserror::Error;

/// Recoverable errors reported to the application through `get_error`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlError {
    #[error("invalid enum")]
    InvalidEnum,

    #[error("invalid value")]
    InvalidValue,

    #[error("invalid operation")]
    InvalidOperation,

    #[error("stack overflow")]
    StackOverflow,

    #[error("stack underflow")]
    StackUnderflow,

    #[error("out of memory")]
    OutOfMemory,
}

impl GlError {
    pub fn code(self) -> u32 {
        match self {
            GlError::InvalidEnum => gl::INVALID_ENUM,
            GlError::InvalidValue => gl::INVALID_VALUE,
            GlError::InvalidOperation => gl::INVALID_OPERATION,
            GlError::StackOverflow => gl::STACK_OVERFLOW,
            GlError::StackUnderflow => gl::STACK_UNDERFLOW,
            GlError::OutOfMemory => gl::OUT_OF_MEMORY,
        }
    }
}

impl From<TilingError> for GlError {
    fn from(err: TilingError) -> Self {
        match err {
            TilingError::UnsupportedFormat { .. } => GlError::InvalidEnum,
            TilingError::UnalignedDimensions { .. }
            | TilingError::BufferTooSmall { .. }
            | TilingError::InvalidPointer { .. } => GlError::InvalidValue,
        }
    }
}

/// Holds the first error raised since the last read.
///
/// Later errors are dropped until [`ErrorLatch::take`] clears the latch.
#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorLatch {
    latched: Option<GlError>,
}

impl ErrorLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, error: GlError) {
        match self.latched {
            Some(first) => log::debug!("{} dropped, {} is still latched", error, first),
            None => {
                log::debug!("latched {}", error);
                self.latched = Some(error);
            }
        }
    }

    pub fn peek(&self) -> Option<GlError> {
        self.latched
    }

    pub fn take(&mut self) -> Option<GlError> {
        self.latched.take()
    }

    /// Read and clear, as a GL error code.
    pub fn take_code(&mut self) -> u32 {
        self.take().map_or(gl::NO_ERROR, GlError::code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_error_wins_until_read() {
        let mut latch = ErrorLatch::new();
        assert_eq!(latch.take_code(), gl::NO_ERROR);

        latch.record(GlError::StackOverflow);
        latch.record(GlError::InvalidEnum);
        assert_eq!(latch.peek(), Some(GlError::StackOverflow));
        assert_eq!(latch.take_code(), 0x0503);
        assert_eq!(latch.take(), None);

        latch.record(GlError::InvalidEnum);
        assert_eq!(latch.take(), Some(GlError::InvalidEnum));
    }

    #[test]
    fn codes_match_gl() {
        assert_eq!(GlError::InvalidEnum.code(), 0x0500);
        assert_eq!(GlError::OutOfMemory.code(), 0x0505);
    }
}
