// Crate root library declaration and module exports.
pub mod cli;
pub mod config;
pub mod context;
pub mod document;
pub mod model;
pub mod oracle;
pub mod projector;
pub mod tui;
