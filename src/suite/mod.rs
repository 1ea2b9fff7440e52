//! Test suites
//!
//! The composite node of a test tree and the filesystem conventions used to
//! discover its children.

mod discovery;
#[allow(clippy::module_inception)]
mod suite;

pub use discovery::{
    case_identifiers, definition_path, normalize_home, subdirectories, suite_identifier,
    DiscoveryConventions,
};
pub use suite::Suite;
