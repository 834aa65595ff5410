// File: ./src/model/mod.rs
pub mod classify;
pub mod entry;
pub mod expr;

pub use classify::{Capabilities, Threshold};
pub use expr::{ExprNode, ParseError};
