//! Filesystem helpers for the verification harness built on `cap-std` and
//! `camino`.
//!
//! Scenario runs operate on scratch copies of a template directory; the
//! helpers here reset those copies, write configuration files and probe for
//! executables without reaching for ambient `std::fs` calls.
#![forbid(unsafe_code)]

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io;
use std::path::Component;

/// Open a UTF-8 file path using ambient authority.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Resolve an ambient directory for the given path and return the directory with the file name.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("target should include a file name"))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Ensure the parent directory for `path` exists, handling absolute paths safely for cap-std.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let (base_dir, relative) = base_dir_and_relative(parent)?;
    if relative.as_os_str().is_empty() {
        return Ok(());
    }
    base_dir.create_dir_all(&relative)?;
    Ok(())
}

/// Return whether a path exists and is a regular file using capability-based IO.
///
/// A missing parent directory or file yields an error of kind
/// [`io::ErrorKind::NotFound`].
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = open_dir_and_file(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_file())
}

/// Return `true` when `path` names an existing regular file, treating any
/// lookup failure as absence.
#[must_use]
pub fn file_exists(path: &Utf8Path) -> bool {
    file_is_file(path).unwrap_or(false)
}

/// Write `contents` to `path`, creating parent directories as needed and
/// truncating any existing file.
pub fn write_utf8_file(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let (dir, name) = open_dir_and_file(path)?;
    dir.write(name.as_str(), contents)
}

/// Remove the file at `path`, succeeding when it does not exist.
pub fn remove_file_if_present(path: &Utf8Path) -> io::Result<()> {
    let (dir, name) = match open_dir_and_file(path) {
        Ok(found) => found,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };
    match dir.remove_file(name.as_str()) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

/// Replace `target` with a fresh recursive copy of `template`.
///
/// Any existing `target` directory is removed first so stale artefacts from
/// an earlier run never mix with the new copy. `target` must neither live
/// inside `template` nor contain it; both paths are resolved before the
/// comparison, so `..` segments and symlinks cannot hide an overlap.
pub fn reset_dir_from_template(template: &Utf8Path, target: &Utf8Path) -> io::Result<()> {
    let source = fs_utf8::Dir::open_ambient_dir(template, ambient_authority())?;
    let resolved_template = resolve_path(template)?;
    let resolved_target = resolve_path(target)?;
    if resolved_target.starts_with(&resolved_template)
        || resolved_template.starts_with(&resolved_target)
    {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("target {target} overlaps template {template}"),
        ));
    }

    let (base_dir, relative) = base_dir_and_relative(target)?;
    if relative.as_os_str().is_empty() || relative == Utf8Path::new(".") {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("refusing to reset {target}"),
        ));
    }
    remove_dir_if_present(&base_dir, &relative)?;
    base_dir.create_dir_all(&relative)?;
    let destination = base_dir.open_dir(&relative)?;
    copy_dir_contents(&source, &destination)
}

/// Resolve `path` to an absolute form suitable for overlap checks.
///
/// `.` and `..` are collapsed lexically, then the longest existing ancestor is
/// canonicalised and any missing trailing components are re-appended.
fn resolve_path(path: &Utf8Path) -> io::Result<Utf8PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_owned()
    } else {
        Utf8PathBuf::from_path_buf(std::env::current_dir()?)
            .map_err(|_| io::Error::other("non-UTF-8 current directory"))?
            .join(path)
    };
    let mut normalised = Utf8PathBuf::new();
    for component in absolute.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                normalised.pop();
            }
            other => normalised.push(other.as_str()),
        }
    }

    let mut missing = Vec::new();
    let mut existing = normalised.as_path();
    loop {
        match existing.canonicalize_utf8() {
            Ok(mut resolved) => {
                for name in missing.iter().rev() {
                    resolved.push(name);
                }
                return Ok(resolved);
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let (Some(parent), Some(name)) = (existing.parent(), existing.file_name()) else {
                    return Err(err);
                };
                missing.push(name);
                existing = parent;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Remove `relative` beneath `base_dir`, ignoring a directory that is already gone.
fn remove_dir_if_present(base_dir: &fs_utf8::Dir, relative: &Utf8Path) -> io::Result<()> {
    match base_dir.remove_dir_all(relative) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

fn copy_dir_contents(source: &fs_utf8::Dir, destination: &fs_utf8::Dir) -> io::Result<()> {
    for entry_result in source.entries()? {
        let entry = entry_result?;
        let name = entry.file_name()?;
        if entry.file_type()?.is_dir() {
            destination.create_dir(&name)?;
            let nested_source = source.open_dir(&name)?;
            let nested_destination = destination.open_dir(&name)?;
            copy_dir_contents(&nested_source, &nested_destination)?;
        } else {
            source.copy(&name, destination, &name)?;
        }
    }
    Ok(())
}

/// Split an absolute or relative parent path into an ambient base directory and a relative suffix.
pub fn base_dir_and_relative(parent: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_parent = parent.as_std_path();

    let (base, relative) = match std_parent.components().next() {
        // Windows absolute path with a drive or UNC prefix.
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;

            let base = Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .or_else(|_| std_parent.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other("failed to strip prefix from parent path"))?
                .to_path_buf();
            (base, relative)
        }
        // Unix-style absolute path.
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from absolute path"))?
                .to_path_buf();
            (base, relative)
        }
        // Relative path: resolve from the current directory.
        _ => (Utf8PathBuf::from("."), std_parent.to_path_buf()),
    };

    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    let relative_utf8 = Utf8PathBuf::from_path_buf(relative)
        .map_err(|_| io::Error::other("non-UTF-8 parent path"))?;

    Ok((dir, relative_utf8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::fs;
    use tempfile::TempDir;

    struct Scratch {
        _dir: TempDir,
        root: Utf8PathBuf,
    }

    #[fixture]
    fn scratch() -> Scratch {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        Scratch { _dir: dir, root }
    }

    fn seed_template(root: &Utf8Path) -> Utf8PathBuf {
        let template = root.join("template");
        fs::create_dir_all(template.join("nested")).expect("create template");
        fs::write(template.join("base.pst"), b"control").expect("write control file");
        fs::write(template.join("nested/model.in"), b"model input").expect("write nested file");
        template
    }

    #[rstest]
    fn reset_copies_template_tree(scratch: Scratch) {
        let template = seed_template(&scratch.root);
        let target = scratch.root.join("run");

        reset_dir_from_template(&template, &target).expect("reset should succeed");

        let control = fs::read(target.join("base.pst")).expect("read copied control file");
        assert_eq!(control, b"control");
        let nested = fs::read(target.join("nested/model.in")).expect("read copied nested file");
        assert_eq!(nested, b"model input");
    }

    #[rstest]
    fn reset_discards_stale_artefacts(scratch: Scratch) {
        let template = seed_template(&scratch.root);
        let target = scratch.root.join("run");
        fs::create_dir_all(&target).expect("create stale target");
        fs::write(target.join("stale.rec"), b"old report").expect("write stale report");

        reset_dir_from_template(&template, &target).expect("reset should succeed");

        assert!(!target.join("stale.rec").exists());
        assert!(target.join("base.pst").exists());
    }

    #[rstest]
    fn reset_rejects_target_inside_template(scratch: Scratch) {
        let template = seed_template(&scratch.root);
        let target = template.join("copy");

        let err = reset_dir_from_template(&template, &target).expect_err("nested target");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[rstest]
    fn reset_rejects_target_containing_template(scratch: Scratch) {
        let case = scratch.root.join("case");
        let template = seed_template(&case);

        let err = reset_dir_from_template(&template, &case).expect_err("enclosing target");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(
            fs::read(template.join("base.pst")).expect("template survives"),
            b"control"
        );
    }

    #[rstest]
    #[case::parent_segments("x/../template/copy")]
    #[case::current_segments("./template/./copy")]
    #[case::template_itself("template")]
    fn reset_rejects_overlap_hidden_by_path_text(scratch: Scratch, #[case] suffix: &str) {
        let template = seed_template(&scratch.root);
        let target = scratch.root.join(suffix);

        let err = reset_dir_from_template(&template, &target).expect_err("overlapping target");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(template.join("nested/model.in").exists());
        assert!(!template.join("copy").exists());
    }

    #[rstest]
    fn reset_accepts_sibling_with_shared_name_prefix(scratch: Scratch) {
        let template = seed_template(&scratch.root);
        let target = scratch.root.join("template-run");

        reset_dir_from_template(&template, &target).expect("sibling target");
        assert!(target.join("base.pst").exists());
    }

    #[rstest]
    fn reset_reports_missing_template(scratch: Scratch) {
        let err = reset_dir_from_template(&scratch.root.join("absent"), &scratch.root.join("run"))
            .expect_err("missing template");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[rstest]
    fn write_creates_parent_directories(scratch: Scratch) {
        let path = scratch.root.join("deep/tree/test.pst");
        write_utf8_file(&path, b"payload").expect("write file");
        assert_eq!(fs::read(&path).expect("read back"), b"payload");
        assert!(file_exists(&path));
    }

    #[rstest]
    fn file_is_file_distinguishes_directories(scratch: Scratch) {
        let sub = scratch.root.join("sub");
        fs::create_dir_all(&sub).expect("create directory");
        assert!(!file_is_file(&sub).expect("inspect directory"));
        let missing = file_is_file(&scratch.root.join("missing")).expect_err("missing file");
        assert_eq!(missing.kind(), io::ErrorKind::NotFound);
    }

    #[rstest]
    fn remove_file_tolerates_absence(scratch: Scratch) {
        let path = scratch.root.join("test.rec");
        fs::write(&path, b"old").expect("write report");
        remove_file_if_present(&path).expect("remove existing");
        assert!(!path.exists());
        remove_file_if_present(&path).expect("remove absent");
        remove_file_if_present(&scratch.root.join("no/such/dir/test.rec"))
            .expect("remove beneath missing directory");
    }
}
