//! Locating the service binary via `cargo metadata`.
//!
//! The Dockerfile builds exactly one binary with
//! `cargo build -p <package> --bin <name>` from the workspace root, so
//! discovery has to settle on a single target even for workspace members
//! and packages with several `[[bin]]` entries.

use cargo_metadata::{Metadata, MetadataCommand, Package, TargetKind};
use std::path::{Path, PathBuf};

/// A binary target in a Cargo package.
///
/// # Examples
///
/// ```
/// use tarship_core::CargoBinary;
///
/// let bin = CargoBinary {
///     name: "myapp".to_owned(),
/// };
/// assert_eq!(bin.name, "myapp");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CargoBinary {
    /// Binary name (used with `cargo build --bin <name>`)
    pub name: String,
}

/// The Cargo package being shipped, as reported by `cargo metadata --no-deps`.
///
/// Use [`CargoProject::discover()`] for real projects. Direct construction is
/// fine in tests as long as `binary` names an entry of `binaries`.
///
/// ```no_run
/// use tarship_core::CargoProject;
/// use std::path::Path;
///
/// let project = CargoProject::discover(Path::new(".")).unwrap();
/// println!("shipping {} v{} (bin {})", project.name, project.version, project.binary);
/// ```
#[derive(Debug, Clone)]
pub struct CargoProject {
    /// Package name from `[package].name`
    pub name: String,
    /// Resolved version (handles `version.workspace = true`)
    pub version: String,
    /// Absolute path to the workspace root; the build context directory.
    /// Equal to the package directory for a standalone package.
    pub workspace_root: PathBuf,
    /// Package directory relative to `workspace_root` (empty when they match)
    pub member_dir: PathBuf,
    /// All binary targets in this package
    pub binaries: Vec<CargoBinary>,
    /// The binary compiled into the image; always one of `binaries`.
    pub binary: String,
}

impl CargoProject {
    /// Discover the package whose manifest lives in `project_dir`.
    ///
    /// # Errors
    ///
    /// - [`Error::CargoMetadata`](crate::Error::CargoMetadata) if `cargo metadata` fails
    /// - [`Error::NoPackageInDir`](crate::Error::NoPackageInDir) for a virtual workspace root
    /// - [`Error::PackageOutsideWorkspace`](crate::Error::PackageOutsideWorkspace) if the
    ///   package does not sit below its workspace root
    /// - [`Error::NoBinaryTarget`](crate::Error::NoBinaryTarget) for library-only packages
    /// - [`Error::MultipleBinaries`](crate::Error::MultipleBinaries) when the choice is ambiguous
    pub fn discover(project_dir: &Path) -> crate::Result<Self> {
        let manifest_path = project_dir.join("Cargo.toml");
        tracing::debug!(path = %manifest_path.display(), "running cargo metadata");

        let metadata = MetadataCommand::new()
            .manifest_path(&manifest_path)
            .no_deps()
            .exec()
            .map_err(|e| crate::Error::CargoMetadata {
                manifest_path: manifest_path.clone(),
                detail: e.to_string(),
            })?;

        let canonical_dir =
            project_dir
                .canonicalize()
                .map_err(|e| crate::Error::ProjectDirResolve {
                    path: project_dir.to_path_buf(),
                    source: e,
                })?;

        let package = find_package(&metadata, &canonical_dir)?;

        let binaries: Vec<CargoBinary> = package
            .targets
            .iter()
            .filter(|t| t.kind.contains(&TargetKind::Bin))
            .map(|t| CargoBinary {
                name: t.name.clone(),
            })
            .collect();

        let binary = select_binary(&binaries, package.default_run.as_deref(), &package.name)?;

        let workspace_root = PathBuf::from(metadata.workspace_root.as_std_path());
        let package_dir = package
            .manifest_path
            .as_std_path()
            .parent()
            .unwrap_or(canonical_dir.as_path());
        let member_dir = match package_dir.strip_prefix(&workspace_root) {
            Ok(relative) => relative.to_path_buf(),
            Err(e) => {
                tracing::debug!(error = %e, "package is not below the workspace root");
                return Err(crate::Error::PackageOutsideWorkspace {
                    package_dir: package_dir.to_path_buf(),
                    workspace_root,
                });
            }
        };

        tracing::debug!(
            name = %package.name,
            version = %package.version,
            binary = %binary,
            member_dir = %member_dir.display(),
            "cargo project discovered"
        );

        Ok(Self {
            name: package.name.clone(),
            version: package.version.to_string(),
            workspace_root,
            member_dir,
            binaries,
            binary,
        })
    }
}

/// The package whose `Cargo.toml` sits directly in `dir`.
fn find_package<'m>(metadata: &'m Metadata, dir: &Path) -> crate::Result<&'m Package> {
    metadata
        .packages
        .iter()
        .find(|p| {
            let Some(parent) = p.manifest_path.as_std_path().parent() else {
                return false;
            };
            match parent.canonicalize() {
                Ok(canonical) => canonical == dir,
                Err(e) => {
                    tracing::warn!(
                        path = %parent.display(),
                        error = %e,
                        "cannot canonicalize manifest directory; skipping package"
                    );
                    false
                }
            }
        })
        .ok_or_else(|| crate::Error::NoPackageInDir {
            dir: dir.to_path_buf(),
            workspace_members: metadata
                .packages
                .iter()
                .filter(|p| metadata.workspace_members.contains(&p.id))
                .map(|p| p.name.clone())
                .collect(),
        })
}

/// Pick the binary to ship.
///
/// `default-run` wins when it names an existing target; otherwise a lone
/// binary, then the binary named after the package.
fn select_binary(
    binaries: &[CargoBinary],
    default_run: Option<&str>,
    package_name: &str,
) -> crate::Result<String> {
    let by_name = |name: &str| binaries.iter().find(|b| b.name == name);

    if let Some(bin) = default_run.and_then(by_name) {
        return Ok(bin.name.clone());
    }

    match binaries {
        [] => Err(crate::Error::NoBinaryTarget {
            package: package_name.to_owned(),
        }),
        [only] => Ok(only.name.clone()),
        _ => by_name(package_name)
            .map(|b| b.name.clone())
            .ok_or_else(|| crate::Error::MultipleBinaries {
                names: binaries.iter().map(|b| b.name.clone()).collect(),
            }),
    }
}
