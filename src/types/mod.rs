#![allow(clippy::module_name_repetitions)]

mod error;
mod result;

pub use error::{BoxError, ErrorKind};
pub(crate) use error::panic_message;
pub use result::CrawlResult;

/// The crate-wide `Result` type
pub type Result<T> = std::result::Result<T, crate::ErrorKind>;
