//! Search-augmented, self-correcting language-model workflows.
//!
//! This crate turns a natural-language goal into a validated, schema-conforming
//! answer by coordinating model calls, a web search provider, and a
//! critique/retry loop. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure data types and decisions (conversations, target shapes,
//!   relevance pools, acceptance thresholds). No I/O.
//! - **[`io`]**: Side-effecting collaborators (model endpoint, search provider,
//!   page fetching, configuration). Hidden behind traits so tests can script them.
//!
//! Orchestration modules ([`tasks`], [`executor`], [`orchestrator`]) coordinate
//! core logic with I/O. Every failure below [`orchestrator`] degrades to a
//! well-defined default instead of an error.

pub mod core;
pub mod executor;
pub mod io;
pub mod logging;
pub mod orchestrator;
pub mod tasks;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
