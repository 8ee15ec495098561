//! Command implementations.

mod import;

pub use import::{ImportFixturesArgs, ImportFixturesCommand};
