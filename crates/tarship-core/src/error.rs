use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid [build.env] key {key:?}: expected letters, digits and '_', not starting with a digit")]
    InvalidEnvKey { key: String },

    // ── Image reference ──
    #[error("invalid image name {name:?}: {reason}")]
    InvalidImageName { name: String, reason: &'static str },

    #[error("invalid image tag {tag:?}: {reason}")]
    InvalidImageTag { tag: String, reason: &'static str },

    // ── Remote target ──
    #[error("[remote].host is not set in tarship.toml — set it to enable transfer")]
    RemoteHostMissing,

    #[error("invalid remote {field} {value:?}: {reason}")]
    InvalidRemote {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    // ── Environment file ──
    #[error("environment file not found at {path}")]
    EnvFileMissing { path: PathBuf },

    #[error("failed to parse environment file {path}")]
    EnvFileParse {
        path: PathBuf,
        source: dotenvy::Error,
    },

    #[error(
        "environment file {path} is missing required keys: {}",
        keys.join(", ")
    )]
    EnvKeysMissing { path: PathBuf, keys: Vec<String> },

    // ── Cargo project discovery ──
    #[error("cargo metadata failed for {manifest_path}: {detail}")]
    CargoMetadata {
        manifest_path: PathBuf,
        detail: String,
    },

    #[error("failed to resolve project directory {path}")]
    ProjectDirResolve {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "no package found in {dir}; workspace members: {}",
        format_members(workspace_members)
    )]
    NoPackageInDir {
        dir: PathBuf,
        workspace_members: Vec<String>,
    },

    #[error("package directory {package_dir} is not inside workspace root {workspace_root}")]
    PackageOutsideWorkspace {
        package_dir: PathBuf,
        workspace_root: PathBuf,
    },

    #[error("no binary target in package '{package}' — tarship needs a binary to ship")]
    NoBinaryTarget { package: String },

    #[error(
        "multiple binary targets found: {}; set `default-run` in Cargo.toml to select one",
        names.join(", ")
    )]
    MultipleBinaries { names: Vec<String> },
}

fn format_members(members: &[String]) -> String {
    if members.is_empty() {
        "(none)".to_owned()
    } else {
        members.join(", ")
    }
}
