//! Test runner infrastructure for tally
//!
//! Locates test files from command-line arguments, filters their cases by
//! line and name, runs them in order and reports the outcome.

pub mod discovery;
pub mod filter;
pub mod locator;
pub mod reporter;
pub mod runner;

pub use filter::{NamePattern, TestFilter};
pub use locator::Locator;
pub use reporter::{ConsoleReporter, JsonReporter};
pub use runner::TestRunner;
