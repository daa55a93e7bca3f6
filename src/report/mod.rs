//! Report formatters for a finished pipeline run

pub mod json;
pub mod markdown;

pub use json::JsonFormatter;
pub use markdown::MarkdownFormatter;
