//! Stable exit codes for bot CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed due to invalid config, archive or arguments, or other errors.
pub const INVALID: i32 = 1;
