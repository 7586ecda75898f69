pub mod common;
pub mod failures;
pub mod parse;
pub mod types;
