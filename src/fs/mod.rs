//! Filesystem helpers for the file-backed provider.
//!
//! Lock records must never be observed half written, so every record reaches
//! its final path either by an atomic rename or by an exclusive hard link of a
//! fully synced temporary file.

pub mod atomic;

pub use atomic::{atomic_write, publish_exclusive};
