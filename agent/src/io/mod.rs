//! I/O collaborators: model endpoint, search provider, prompts and config.

pub mod config;
pub mod gemini;
pub mod model;
pub mod page;
pub mod prompt;
pub mod search;
