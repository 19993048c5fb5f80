//! Daily travel-memory bot.
//!
//! Picks a random day from an exported trip archive, sends it as a message,
//! and follows up with search-augmented extras generated by the [`agent`]
//! crate, one independent orchestration run per configured prompt.

pub mod config;
pub mod daily;
pub mod exit_codes;
pub mod prompts;
pub mod sender;
pub mod trip;
