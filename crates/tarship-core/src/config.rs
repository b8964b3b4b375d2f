use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::image::ImageRef;
use crate::remote::RemoteTarget;

/// Name of the configuration file looked up in the project directory.
pub const CONFIG_FILE: &str = "tarship.toml";

/// Directory holding ejected build files and, by default, the image archive.
pub const STATE_DIR: &str = ".tarship";

/// tarship.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TarshipConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Service name (defaults to Cargo.toml package name)
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Container engine executable (`docker` or a CLI-compatible one such as `podman`)
    #[serde(default = "default_engine")]
    pub engine: String,
    /// Rust builder image
    #[serde(default = "default_builder_image")]
    pub base_image: String,
    /// Runtime base image
    #[serde(default = "default_runtime_image")]
    pub runtime_image: String,
    /// apt packages installed in the builder stage
    #[serde(default)]
    pub build_packages: Vec<String>,
    /// apt packages installed in the runtime stage (TLS/crypto runtime by default)
    #[serde(default = "default_runtime_packages")]
    pub runtime_packages: Vec<String>,
    /// Compile with `SQLX_OFFLINE=true` so queries are checked against the
    /// prepared schema snapshot instead of a live database.
    #[serde(default = "default_true")]
    pub sqlx_offline: bool,
    /// Pass `--locked` to cargo build.
    #[serde(default = "default_true")]
    pub locked: bool,
    /// Static environment variables baked into the runtime stage as ENV directives.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Image repository name (defaults to the service name)
    pub name: Option<String>,
    /// Image tag
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Port the service listens on (EXPOSE)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Environment file copied into the image at `/app/.env`
    #[serde(default = "default_env_file")]
    pub env_file: String,
    /// Keys that must be present in `env_file`
    #[serde(default)]
    pub required_env: Vec<String>,
    /// Archive path, relative to the project directory.
    /// Defaults to `.tarship/<image name>.tar`.
    pub archive: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Destination host (required for transfer)
    pub host: Option<String>,
    /// Login user; ssh defaults apply when unset
    pub user: Option<String>,
    /// SSH port; ssh defaults apply when unset
    pub port: Option<u16>,
    /// Private key passed with `-i`
    pub identity_file: Option<String>,
    /// Destination directory on the remote host
    #[serde(default = "default_remote_path")]
    pub path: String,
    /// Extra `-o` options for scp/ssh, e.g. `StrictHostKeyChecking=accept-new`
    #[serde(default)]
    pub ssh_options: Vec<String>,
    /// Run `<engine> load` on the remote host after the copy
    #[serde(default)]
    pub load: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            base_image: default_builder_image(),
            runtime_image: default_runtime_image(),
            build_packages: Vec::new(),
            runtime_packages: default_runtime_packages(),
            sqlx_offline: true,
            locked: true,
            env: BTreeMap::new(),
        }
    }
}

impl BuildConfig {
    /// Every `[build.env]` key must be a portable variable name
    /// (`[A-Za-z_][A-Za-z0-9_]*`) to form a valid `ENV key=value` line.
    pub fn validate_env_keys(&self) -> crate::Result<()> {
        match self.env.keys().find(|key| !is_env_key(key)) {
            Some(key) => Err(crate::Error::InvalidEnvKey { key: key.clone() }),
            None => Ok(()),
        }
    }
}

fn is_env_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            name: None,
            tag: default_tag(),
            port: default_port(),
            env_file: default_env_file(),
            required_env: Vec::new(),
            archive: None,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: None,
            user: None,
            port: None,
            identity_file: None,
            path: default_remote_path(),
            ssh_options: Vec::new(),
            load: false,
        }
    }
}

impl TarshipConfig {
    /// Load from tarship.toml at the given path, or return defaults if not found.
    ///
    /// `[build.env]` keys are checked here so a bad key never reaches the
    /// rendered Dockerfile.
    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file; using defaults");
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                path: config_path.clone(),
                source: e,
            })?;
        let config: Self = toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
            path: config_path,
            source: e,
        })?;
        config.build.validate_env_keys()?;
        Ok(config)
    }

    /// Service name: `[project].name`, falling back to the Cargo package name.
    pub fn service_name<'a>(&'a self, package_name: &'a str) -> &'a str {
        self.project.name.as_deref().unwrap_or(package_name)
    }

    /// Resolve and validate the image reference.
    ///
    /// `tag_override` (from `--tag`) replaces `[image].tag` when given.
    pub fn image_ref(
        &self,
        package_name: &str,
        tag_override: Option<&str>,
    ) -> crate::Result<ImageRef> {
        let name = self
            .image
            .name
            .as_deref()
            .unwrap_or_else(|| self.service_name(package_name));
        let tag = tag_override.unwrap_or(&self.image.tag);
        ImageRef::new(name, tag)
    }

    /// Absolute archive path for the given image.
    pub fn archive_path(&self, project_dir: &Path, image: &ImageRef) -> PathBuf {
        match &self.image.archive {
            Some(archive) => project_dir.join(archive),
            None => project_dir
                .join(STATE_DIR)
                .join(format!("{}.tar", image.file_stem())),
        }
    }

    /// Absolute path of the environment file shipped with the image.
    pub fn env_file_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.image.env_file)
    }

    /// Build the validated transfer destination from `[remote]`.
    pub fn remote_target(&self) -> crate::Result<RemoteTarget> {
        RemoteTarget::try_from(&self.remote)
    }
}

fn default_engine() -> String {
    "docker".to_owned()
}

fn default_builder_image() -> String {
    "rust:1.84-bookworm".to_owned()
}

fn default_runtime_image() -> String {
    "debian:bookworm-slim".to_owned()
}

fn default_runtime_packages() -> Vec<String> {
    vec!["libssl3".to_owned(), "ca-certificates".to_owned()]
}

fn default_true() -> bool {
    true
}

fn default_tag() -> String {
    "latest".to_owned()
}

fn default_port() -> u16 {
    2345
}

fn default_env_file() -> String {
    ".env".to_owned()
}

fn default_remote_path() -> String {
    ".".to_owned()
}
