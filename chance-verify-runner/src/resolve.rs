//! Per-platform location of the solver executable.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use thiserror::Error;

/// Operating-system family selecting the executable layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFamily {
    /// `exe/windows/x64/Release/<name>.exe`.
    Windows,
    /// `exe/mac/<name>`.
    MacOs,
    /// `exe/linux/<name>`; also used for any other Unix.
    Linux,
}

impl PlatformFamily {
    /// Family of the running host.
    #[must_use]
    pub fn current() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Family for an [`std::env::consts::OS`] value.
    #[must_use]
    pub fn from_os_name(os: &str) -> Self {
        match os {
            "windows" => Self::Windows,
            "macos" | "ios" => Self::MacOs,
            _ => Self::Linux,
        }
    }

    /// Candidate paths, relative to the distribution root, in preference
    /// order.
    #[must_use]
    pub fn candidates(self, name: &str) -> Vec<Utf8PathBuf> {
        match self {
            Self::Windows => {
                let release = Utf8Path::new("exe").join("windows").join("x64").join("Release");
                vec![
                    release.join(format!("{name}.exe")),
                    // Intel-compiler builds carry an `i` prefix.
                    release.join(format!("i{name}.exe")),
                ]
            }
            Self::MacOs => vec![Utf8Path::new("exe").join("mac").join(name)],
            Self::Linux => vec![Utf8Path::new("exe").join("linux").join(name)],
        }
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::Linux => "linux",
        })
    }
}

/// Errors raised while locating the solver executable.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// None of the candidate paths exists.
    #[error("no {name} executable for {platform}; tried {}", display_paths(.attempted))]
    NotFound {
        /// Executable base name.
        name: String,
        /// Platform the candidates were built for.
        platform: PlatformFamily,
        /// Every path checked.
        attempted: Vec<Utf8PathBuf>,
    },
    /// A found executable could not be made absolute.
    #[error("failed to canonicalise {path}: {source}")]
    Canonicalize {
        /// Found path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

fn display_paths(paths: &[Utf8PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Locates the solver executable beneath a distribution root.
///
/// Resolution runs once, up front; callers keep the returned absolute path
/// for every later invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableResolver {
    root: Utf8PathBuf,
    platform: PlatformFamily,
}

impl ExecutableResolver {
    /// Resolver for the running host.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self::for_platform(root, PlatformFamily::current())
    }

    /// Resolver for an explicit platform.
    #[must_use]
    pub fn for_platform(root: impl Into<Utf8PathBuf>, platform: PlatformFamily) -> Self {
        Self {
            root: root.into(),
            platform,
        }
    }

    /// Platform the resolver builds candidates for.
    #[must_use]
    pub const fn platform(&self) -> PlatformFamily {
        self.platform
    }

    /// Absolute path of the first existing candidate for `name`.
    ///
    /// # Errors
    /// Returns [`ResolveError::NotFound`] listing every attempted path when
    /// no candidate exists.
    pub fn resolve(&self, name: &str) -> Result<Utf8PathBuf, ResolveError> {
        let attempted: Vec<Utf8PathBuf> = self
            .platform
            .candidates(name)
            .into_iter()
            .map(|relative| self.root.join(relative))
            .collect();
        let Some(found) = attempted
            .iter()
            .find(|candidate| chance_verify_fs::file_exists(candidate))
        else {
            return Err(ResolveError::NotFound {
                name: name.to_owned(),
                platform: self.platform,
                attempted,
            });
        };
        debug!("resolved {name} to {found}");
        found
            .canonicalize_utf8()
            .map_err(|source| ResolveError::Canonicalize {
                path: found.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn touch(root: &Utf8Path, relative: &Utf8Path) -> Utf8PathBuf {
        let path = root.join(relative);
        chance_verify_fs::write_utf8_file(&path, b"").expect("create executable stub");
        path.canonicalize_utf8().expect("canonical stub path")
    }

    fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 path");
        (dir, root)
    }

    #[rstest]
    #[case("windows", PlatformFamily::Windows)]
    #[case("macos", PlatformFamily::MacOs)]
    #[case("linux", PlatformFamily::Linux)]
    #[case("freebsd", PlatformFamily::Linux)]
    fn os_names_map_to_families(#[case] os: &str, #[case] expected: PlatformFamily) {
        assert_eq!(PlatformFamily::from_os_name(os), expected);
    }

    #[rstest]
    #[case(PlatformFamily::Linux, "exe/linux/pestpp-opt")]
    #[case(PlatformFamily::MacOs, "exe/mac/pestpp-opt")]
    #[case(PlatformFamily::Windows, "exe/windows/x64/Release/pestpp-opt.exe")]
    fn resolves_primary_layout(#[case] platform: PlatformFamily, #[case] relative: &str) {
        let (_dir, root) = temp_root();
        let expected = touch(&root, Utf8Path::new(relative));
        let resolver = ExecutableResolver::for_platform(&root, platform);
        assert_eq!(resolver.resolve("pestpp-opt").expect("resolved"), expected);
    }

    #[rstest]
    fn windows_falls_back_to_prefixed_build() {
        let (_dir, root) = temp_root();
        let expected = touch(
            &root,
            Utf8Path::new("exe/windows/x64/Release/ipestpp-opt.exe"),
        );
        let resolver = ExecutableResolver::for_platform(&root, PlatformFamily::Windows);
        assert_eq!(resolver.resolve("pestpp-opt").expect("resolved"), expected);
    }

    #[rstest]
    fn missing_executable_lists_attempts() {
        let (_dir, root) = temp_root();
        let resolver = ExecutableResolver::for_platform(&root, PlatformFamily::Windows);
        match resolver.resolve("pestpp-opt") {
            Err(ResolveError::NotFound { attempted, .. }) => {
                assert_eq!(attempted.len(), 2);
                assert!(attempted.iter().all(|path| path.starts_with(&root)));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
