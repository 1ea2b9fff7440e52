//! Data models for test trees
//!
//! The node capability, its construction context and result types.

mod node;
mod test_result;

pub use node::{canonical_name, canonical_type_name, NodeContext, TestNode};
pub use test_result::{NodeProperty, TestOutcome, TestRecord, TestStatus};
