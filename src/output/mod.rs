//! Output module
//!
//! The reporting protocol and its console renderers.

mod formatter;
mod reporter;

pub use formatter::{ConsoleRunner, OutputFormat, ResultFormatter};
pub use reporter::{NullRunner, TestRunner};
