use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::dockerfile::CONTEXT_ENV_FILE;

/// Build-context directory, recreated on every build.
pub const BUNDLE_DIR: &str = ".tarship-bundle";

/// Directory names never copied into the build context and never counted as
/// dirty, at any depth (a workspace member keeps its own `.tarship/`).
const TARSHIP_EXCLUDES: &[&str] = &[BUNDLE_DIR, tarship_core::STATE_DIR, ".git"];

/// What goes into the build context besides the git-visible project files.
pub struct BundleInput<'a> {
    /// Rendered or ejected Dockerfile
    pub dockerfile: &'a str,
    /// Environment file, copied as [`CONTEXT_ENV_FILE`] even when git-ignored
    pub env_file: &'a Path,
    /// Additional context-relative paths to leave out (e.g. a custom archive path)
    pub exclude: &'a [PathBuf],
}

/// Prepares the build context under `<context_dir>/.tarship-bundle/`.
///
/// `context_dir` is the Cargo workspace root, which is the package directory
/// for a standalone package. Files come from `git ls-files` so `.gitignore`
/// is honoured and `target/` never bloats the context. The environment file
/// is copied separately because it is normally ignored.
///
/// A listed file that no longer exists is an error unless git reports it as
/// deleted from the working tree.
pub fn create_bundle(
    context_dir: &Path,
    input: &BundleInput<'_>,
) -> Result<PathBuf, BundleError> {
    let bundle_dir = context_dir.join(BUNDLE_DIR);

    if bundle_dir.exists() {
        std::fs::remove_dir_all(&bundle_dir).map_err(|e| BundleError::Cleanup {
            path: bundle_dir.clone(),
            source: e,
        })?;
    }
    create_dir(&bundle_dir)?;

    if !input.env_file.is_file() {
        return Err(BundleError::MissingEnvFile(input.env_file.to_path_buf()));
    }

    let deleted: HashSet<PathBuf> = git_ls_files(context_dir, &["--deleted"])?
        .into_iter()
        .collect();

    let mut copied = 0usize;
    let listed = git_ls_files(context_dir, &["--cached", "--others", "--exclude-standard"])?;
    for relative_path in listed {
        if is_excluded(&relative_path, input.exclude) {
            continue;
        }

        let src = context_dir.join(&relative_path);
        if !src.exists() {
            if deleted.contains(&relative_path) {
                tracing::debug!(
                    path = %relative_path.display(),
                    "skipping file deleted from working tree"
                );
                continue;
            }
            return Err(BundleError::MissingFile(src));
        }

        let dst = bundle_dir.join(&relative_path);
        if let Some(parent) = dst.parent() {
            create_dir(parent)?;
        }
        std::fs::copy(&src, &dst).map_err(|e| BundleError::CopyFile {
            path: src,
            source: e,
        })?;
        copied += 1;
    }

    let env_dst = bundle_dir.join(CONTEXT_ENV_FILE);
    std::fs::copy(input.env_file, &env_dst).map_err(|e| BundleError::CopyFile {
        path: input.env_file.to_path_buf(),
        source: e,
    })?;

    let dockerfile_path = bundle_dir.join("Dockerfile");
    std::fs::write(&dockerfile_path, input.dockerfile).map_err(|e| {
        BundleError::WriteDockerfile {
            path: dockerfile_path.clone(),
            source: e,
        }
    })?;

    tracing::debug!(dir = %bundle_dir.display(), files = copied, "build context ready");
    Ok(bundle_dir)
}

/// Remove `<context_dir>/.tarship-bundle/`. Returns whether anything was removed.
pub fn remove_bundle(context_dir: &Path) -> Result<bool, BundleError> {
    let bundle_dir = context_dir.join(BUNDLE_DIR);
    if !bundle_dir.exists() {
        return Ok(false);
    }
    std::fs::remove_dir_all(&bundle_dir).map_err(|e| BundleError::Cleanup {
        path: bundle_dir,
        source: e,
    })?;
    Ok(true)
}

/// Checks whether anything under `context_dir` has uncommitted changes,
/// ignoring tarship's own output and the `exclude` paths (context-relative).
///
/// `context_dir` may be a subdirectory of the repository; only changes
/// beneath it count.
pub fn is_dirty(context_dir: &Path, exclude: &[PathBuf]) -> Result<bool, BundleError> {
    let prefix = git(context_dir, &["rev-parse", "--show-prefix"])?;
    let prefix = Path::new(prefix.trim());
    let status = git(
        context_dir,
        &["status", "--porcelain", "-z", "--untracked-files=all", "--", "."],
    )?;

    // porcelain paths are relative to the repository root
    Ok(changed_paths(&status).into_iter().any(|path| {
        Path::new(path)
            .strip_prefix(prefix)
            .map_or(true, |relative| !is_excluded(relative, exclude))
    }))
}

/// Paths from `git status --porcelain -z` output.
///
/// Rename and copy entries are followed by their source path, which is
/// skipped.
fn changed_paths(status: &str) -> Vec<&str> {
    let mut paths = Vec::new();
    let mut entries = status.split('\0').filter(|entry| !entry.is_empty());
    while let Some(entry) = entries.next() {
        let Some(path) = entry.get(3..) else {
            continue;
        };
        let code = entry.get(..2).unwrap_or_default();
        if code.contains(['R', 'C']) {
            entries.next();
        }
        paths.push(path);
    }
    paths
}

fn is_excluded(relative_path: &Path, extra: &[PathBuf]) -> bool {
    relative_path
        .components()
        .any(|c| TARSHIP_EXCLUDES.iter().any(|ex| c.as_os_str() == *ex))
        || extra.iter().any(|ex| relative_path.starts_with(ex))
}

/// `git ls-files -z` with the given selection flags, relative to `dir`.
fn git_ls_files(dir: &Path, selection: &[&str]) -> Result<Vec<PathBuf>, BundleError> {
    let mut args = vec!["ls-files", "-z"];
    args.extend_from_slice(selection);
    let stdout = git(dir, &args)?;
    Ok(stdout
        .split('\0')
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .collect())
}

fn git(project_dir: &Path, args: &[&str]) -> Result<String, BundleError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(project_dir)
        .output()
        .map_err(|e| BundleError::GitCommand {
            detail: format!("failed to execute git {}", args.join(" ")),
            source: e,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BundleError::GitFailed {
            detail: format!(
                "git {} exited with {}: {}",
                args.join(" "),
                output.status,
                stderr.trim()
            ),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn create_dir(path: &Path) -> Result<(), BundleError> {
    std::fs::create_dir_all(path).map_err(|e| BundleError::Create {
        path: path.to_path_buf(),
        source: e,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("failed to clean up bundle directory {path}")]
    Cleanup { path: PathBuf, source: std::io::Error },
    #[error("failed to create directory {path}")]
    Create { path: PathBuf, source: std::io::Error },
    #[error("failed to copy file {path}")]
    CopyFile { path: PathBuf, source: std::io::Error },
    #[error("failed to write Dockerfile at {path}")]
    WriteDockerfile { path: PathBuf, source: std::io::Error },
    #[error("environment file {0} not found — create it or set [image].env_file")]
    MissingEnvFile(PathBuf),
    #[error("{0} is listed by git but cannot be found; refusing to build an incomplete context")]
    MissingFile(PathBuf),
    #[error("git command failed: {detail}")]
    GitCommand {
        detail: String,
        source: std::io::Error,
    },
    #[error("git failed: {detail}")]
    GitFailed { detail: String },
}
