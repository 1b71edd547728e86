//! Process exit codes

/// Command succeeded
pub const EXIT_SUCCESS: i32 = 0;

/// Command failed: bad input, rejected change, unreadable store
pub const EXIT_ERROR: i32 = 1;

/// `validate` ran and reported field errors
pub const EXIT_INVALID: i32 = 2;
