//! Locating the solver executable from layered settings.

use camino::{Utf8Path, Utf8PathBuf};
use chance_verify_runner::ExecutableResolver;

use crate::{ARG_EXECUTABLE, ARG_SOLVER_ROOT, CliError, DEFAULT_SOLVER_NAME};

/// Where the solver executable comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SolverLocation {
    /// An explicit executable path.
    Executable(Utf8PathBuf),
    /// A distribution root searched for the running platform's build.
    Distribution { root: Utf8PathBuf, name: String },
}

impl SolverLocation {
    /// Prefer an explicit executable, otherwise search `root` for `name`.
    pub(crate) fn from_settings(
        executable: Option<Utf8PathBuf>,
        root: Option<Utf8PathBuf>,
        name: Option<String>,
        root_env: &'static str,
    ) -> Result<Self, CliError> {
        match (executable, root) {
            (Some(path), _) => Ok(Self::Executable(path)),
            (None, Some(dir)) => Ok(Self::Distribution {
                root: dir,
                name: name.unwrap_or_else(|| DEFAULT_SOLVER_NAME.to_owned()),
            }),
            (None, None) => Err(CliError::MissingArgument {
                field: ARG_SOLVER_ROOT,
                env: root_env,
            }),
        }
    }

    /// Absolute path of the executable to launch.
    pub(crate) fn locate(&self) -> Result<Utf8PathBuf, CliError> {
        match self {
            Self::Executable(path) => {
                require_existing(path, ARG_EXECUTABLE)?;
                path.canonicalize_utf8()
                    .map_err(|source| CliError::InspectSourcePath {
                        field: ARG_EXECUTABLE,
                        path: path.clone(),
                        source,
                    })
            }
            Self::Distribution { root, name } => ExecutableResolver::new(root.clone())
                .resolve(name)
                .map_err(CliError::from),
        }
    }
}

/// Fail unless `path` names an existing regular file.
pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match chance_verify_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}
