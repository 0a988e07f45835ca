//! Exit code constants for the cache-mutex CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, bad config, bad command)
//! - 2: Invalid mutex name
//! - 3: Lock held by another identity
//! - 4: Cache backend failure
//! - 5: Command run under the lock failed

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration, or unparsable command.
pub const USER_ERROR: i32 = 1;

/// The mutex name failed validation.
pub const INVALID_KEY: i32 = 2;

/// The lock is held by another identity.
pub const LOCK_FAILURE: i32 = 3;

/// The cache backend failed (I/O, network, corrupt entry).
pub const PROVIDER_FAILURE: i32 = 4;

/// The command executed by `run` exited unsuccessfully.
pub const COMMAND_FAILURE: i32 = 5;
