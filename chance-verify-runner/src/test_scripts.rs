//! Shell-script stand-ins for the solver used by unit tests.

use std::os::unix::fs::PermissionsExt;

use camino::{Utf8Path, Utf8PathBuf};

pub(crate) fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp path");
    (dir, root)
}

/// Write an executable script named `name` beneath `root`.
pub(crate) fn write_script(root: &Utf8Path, name: &str, body: &str) -> Utf8PathBuf {
    let path = root.join(name);
    std::fs::write(&path, body).expect("write script");
    let mut permissions = std::fs::metadata(&path).expect("script metadata").permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).expect("make script executable");
    path
}
