use crate::provider::FileProvider;
use tempfile::TempDir;

/// A file provider over a fresh temporary directory.
///
/// The lock directory itself is not created, so first-claim directory
/// creation is exercised too.
pub(crate) fn file_provider() -> (TempDir, FileProvider) {
    let temp_dir = TempDir::new().unwrap();
    let provider = FileProvider::new(temp_dir.path().join("locks"));
    (temp_dir, provider)
}
