//! Bridging of bit-reader failures into the codec error types.

use wirekit_common::bitio::BitError;
use wirekit_common::{Report, Result};

use crate::error::{FlateError, LzwError};

pub(crate) trait BitResultExt<T>: Sized {
    fn or_truncated(self) -> Result<T, FlateError>;

    fn or_lzw_truncated(self) -> Result<T, LzwError>;
}

impl<T> BitResultExt<T> for Result<T, BitError> {
    #[track_caller]
    fn or_truncated(self) -> Result<T, FlateError> {
        self.map_err(|_| Report::from(FlateError::TruncatedStream))
    }

    #[track_caller]
    fn or_lzw_truncated(self) -> Result<T, LzwError> {
        self.map_err(|_| Report::from(LzwError::TruncatedStream))
    }
}
