use std::path::{Path, PathBuf};

use tarship_core::{ImageRef, RemoteTarget};

use crate::doctor::{CheckResult, DoctorReport};
use crate::executor::{CommandExecutor, RealExecutor};
use crate::tool::ToolError;

const SSH: &str = "ssh";
const SCP: &str = "scp";

/// Seconds ssh waits for the TCP connection during reachability probes.
const CONNECT_TIMEOUT_SECS: u32 = 10;

/// Container engine, scp and ssh operations, parameterized over the executor
/// for testability.
pub struct ShipClient<E: CommandExecutor = RealExecutor> {
    executor: E,
    engine: String,
}

impl ShipClient<RealExecutor> {
    pub fn new(engine: &str) -> Self {
        Self::with_executor(RealExecutor, engine)
    }
}

impl<E: CommandExecutor> ShipClient<E> {
    pub fn with_executor(executor: E, engine: &str) -> Self {
        Self {
            executor,
            engine: engine.to_owned(),
        }
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    // ── Preflight ──

    /// Fail fast before the build when a required tool or the remote is unavailable.
    ///
    /// With `remote == None` (no transfer planned) only the engine is checked.
    pub async fn check_prerequisites(
        &self,
        remote: Option<&RemoteTarget>,
    ) -> Result<PreflightReport, PreflightError> {
        let mut report = PreflightReport::default();

        let version = self
            .engine_version()
            .await
            .map_err(|e| PreflightError::EngineUnavailable {
                engine: self.engine.clone(),
                source: e,
            })?;
        report.engine_version = Some(version);

        if let Some(target) = remote {
            self.executor
                .exec(SSH, &args(["-V"]))
                .await
                .map_err(|e| PreflightError::SshUnavailable { source: e })?;

            self.check_reachable(target)
                .await
                .map_err(|e| PreflightError::RemoteUnreachable {
                    destination: target.destination(),
                    source: e,
                })?;
            report.remote = Some(target.destination());
        }

        Ok(report)
    }

    // ── Doctor ──

    /// Run every tool check without early return.
    ///
    /// Project-level checks (config file, env file, Cargo package) are left
    /// for the caller to fill in.
    pub async fn doctor(&self, remote: Option<&RemoteTarget>) -> DoctorReport {
        let mut report = DoctorReport::default();

        report.engine = match self.engine_version().await {
            Ok(v) => CheckResult::ok(&format!("{} {v}", self.engine)),
            Err(e) => CheckResult::fail(&e.to_string()),
        };

        report.ssh = match self.executor.exec(SSH, &args(["-V"])).await {
            Ok(_) => CheckResult::ok("available"),
            Err(e) => CheckResult::fail(&e.to_string()),
        };

        report.remote = match remote {
            None => CheckResult::fail("[remote].host not set in tarship.toml"),
            Some(target) => match self.check_reachable(target).await {
                Ok(()) => CheckResult::ok(&target.destination()),
                Err(e) => CheckResult::fail(&e.to_string()),
            },
        };

        report
    }

    // ── Image build ──

    async fn engine_version(&self) -> Result<String, ToolError> {
        let out = self
            .executor
            .exec(&self.engine, &args(["version", "--format", "{{.Server.Version}}"]))
            .await?;
        Ok(out.trim().to_owned())
    }

    /// `<engine> build --tag <image> <context>`.
    ///
    /// `capture`: when `true`, build output is returned instead of streamed.
    pub async fn build_image(
        &self,
        context_dir: &Path,
        image: &ImageRef,
        capture: bool,
    ) -> Result<Option<String>, BuildError> {
        let context = context_dir
            .to_str()
            .ok_or_else(|| BuildError::InvalidPath(context_dir.to_path_buf()))?;
        let image = image.to_string();
        let cmd = args(["build", "--tag", &image, context]);

        if capture {
            let output = self
                .executor
                .exec(&self.engine, &cmd)
                .await
                .map_err(|e| BuildError::Build { source: e })?;
            Ok(Some(output))
        } else {
            self.executor
                .exec_streaming(&self.engine, &cmd)
                .await
                .map_err(|e| BuildError::Build { source: e })?;
            Ok(None)
        }
    }

    /// Id of the image in the local store; errors if it does not exist.
    pub async fn image_id(&self, image: &ImageRef) -> Result<String, BuildError> {
        let output = self
            .executor
            .exec(
                &self.engine,
                &args(["image", "inspect", "--format", "{{.Id}}", &image.to_string()]),
            )
            .await
            .map_err(|e| BuildError::ImageMissing {
                image: image.to_string(),
                source: e,
            })?;
        Ok(output.trim().to_owned())
    }

    pub async fn remove_image(&self, image: &ImageRef) -> Result<(), BuildError> {
        self.executor
            .exec(&self.engine, &args(["image", "rm", &image.to_string()]))
            .await
            .map_err(|e| BuildError::Remove { source: e })?;
        Ok(())
    }

    // ── Image save ──

    /// `<engine> save --output <archive> <image>`, returning the archive size.
    ///
    /// Any previous archive is removed first.
    pub async fn save_image(&self, image: &ImageRef, archive: &Path) -> Result<u64, SaveError> {
        let archive_str = archive
            .to_str()
            .ok_or_else(|| SaveError::InvalidPath(archive.to_path_buf()))?;

        if let Some(parent) = archive.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SaveError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        if archive.exists() {
            std::fs::remove_file(archive).map_err(|e| SaveError::Io {
                path: archive.to_path_buf(),
                source: e,
            })?;
        }

        self.executor
            .exec(
                &self.engine,
                &args(["save", "--output", archive_str, &image.to_string()]),
            )
            .await
            .map_err(|e| SaveError::Save { source: e })?;

        archive_size(archive).map_err(|e| match e {
            ArchiveProblem::Missing => SaveError::NotWritten(archive.to_path_buf()),
            ArchiveProblem::Empty => SaveError::Empty(archive.to_path_buf()),
            ArchiveProblem::Unreadable(source) => SaveError::Io {
                path: archive.to_path_buf(),
                source,
            },
        })
    }

    // ── Transfer ──

    /// Copy the archive into the target directory; returns the remote file path.
    pub async fn copy_archive(
        &self,
        archive: &Path,
        target: &RemoteTarget,
    ) -> Result<String, TransferError> {
        archive_size(archive).map_err(|e| match e {
            ArchiveProblem::Missing => TransferError::ArchiveMissing(archive.to_path_buf()),
            ArchiveProblem::Empty => TransferError::ArchiveEmpty(archive.to_path_buf()),
            ArchiveProblem::Unreadable(source) => TransferError::ReadArchive {
                path: archive.to_path_buf(),
                source,
            },
        })?;
        let archive_str = archive
            .to_str()
            .ok_or_else(|| TransferError::InvalidPath(archive.to_path_buf()))?;

        let remote_file = target.remote_file(archive);
        let mut cmd = vec!["-B".to_owned()];
        cmd.extend(connection_args(target, "-P"));
        cmd.push("--".to_owned());
        cmd.push(archive_str.to_owned());
        cmd.push(format!("{}:{remote_file}", target.destination()));

        self.executor
            .exec(SCP, &cmd)
            .await
            .map_err(|e| TransferError::Copy {
                destination: target.destination(),
                source: e,
            })?;

        Ok(remote_file)
    }

    /// Probe the target with `ssh ... true` in batch mode.
    pub async fn check_reachable(&self, target: &RemoteTarget) -> Result<(), TransferError> {
        self.ssh(target, "true")
            .await
            .map_err(|e| TransferError::Unreachable {
                destination: target.destination(),
                source: e,
            })?;
        Ok(())
    }

    /// Load a transferred archive into the remote host's engine.
    pub async fn load_remote(
        &self,
        target: &RemoteTarget,
        remote_file: &str,
    ) -> Result<String, TransferError> {
        let command = format!(
            "{} load --input {}",
            shell_quote(&self.engine),
            shell_quote(remote_file)
        );
        let output = self
            .ssh(target, &command)
            .await
            .map_err(|e| TransferError::RemoteLoad {
                destination: target.destination(),
                source: e,
            })?;
        Ok(output.trim().to_owned())
    }

    async fn ssh(&self, target: &RemoteTarget, remote_command: &str) -> Result<String, ToolError> {
        let mut cmd = args([
            "-o",
            "BatchMode=yes",
            "-o",
            &format!("ConnectTimeout={CONNECT_TIMEOUT_SECS}"),
        ]);
        cmd.extend(connection_args(target, "-p"));
        cmd.push("--".to_owned());
        cmd.push(target.destination());
        cmd.push(remote_command.to_owned());
        self.executor.exec(SSH, &cmd).await
    }
}

// ── Helpers ──

fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}

/// Port, identity and `-o` options shared by ssh (`-p`) and scp (`-P`).
fn connection_args(target: &RemoteTarget, port_flag: &str) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(port) = target.port {
        out.push(port_flag.to_owned());
        out.push(port.to_string());
    }
    if let Some(identity) = &target.identity_file {
        out.push("-i".to_owned());
        out.push(identity.clone());
    }
    for option in &target.ssh_options {
        out.push("-o".to_owned());
        out.push(option.clone());
    }
    out
}

/// Single-quote for the remote POSIX shell.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

enum ArchiveProblem {
    Missing,
    Empty,
    Unreadable(std::io::Error),
}

fn archive_size(archive: &Path) -> Result<u64, ArchiveProblem> {
    if !archive.is_file() {
        return Err(ArchiveProblem::Missing);
    }
    let len = std::fs::metadata(archive)
        .map_err(ArchiveProblem::Unreadable)?
        .len();
    if len == 0 {
        return Err(ArchiveProblem::Empty);
    }
    Ok(len)
}

// ── Report and error types ──

#[derive(Debug, Default)]
pub struct PreflightReport {
    pub engine_version: Option<String>,
    /// Destination that answered the reachability probe
    pub remote: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PreflightError {
    #[error("container engine `{engine}` is not usable — is it installed and is its daemon running?")]
    EngineUnavailable { engine: String, source: ToolError },

    #[error("ssh client not available — install OpenSSH to enable transfer")]
    SshUnavailable { source: ToolError },

    #[error("remote {destination} is not reachable over ssh — check [remote] in tarship.toml")]
    RemoteUnreachable {
        destination: String,
        source: TransferError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("build context path is not valid UTF-8: {0}")]
    InvalidPath(PathBuf),

    #[error("image build failed")]
    Build { source: ToolError },

    #[error("image {image} not found in the local image store")]
    ImageMissing { image: String, source: ToolError },

    #[error("failed to remove image")]
    Remove { source: ToolError },
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("archive path is not valid UTF-8: {0}")]
    InvalidPath(PathBuf),

    #[error("failed to access archive location {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("image save failed")]
    Save { source: ToolError },

    #[error("image save reported success but {0} was not written")]
    NotWritten(PathBuf),

    #[error("image save produced an empty archive at {0}")]
    Empty(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("archive {0} not found — run `tarship save` first")]
    ArchiveMissing(PathBuf),

    #[error("archive {0} is empty")]
    ArchiveEmpty(PathBuf),

    #[error("failed to read archive {path}")]
    ReadArchive {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("archive path is not valid UTF-8: {0}")]
    InvalidPath(PathBuf),

    #[error("archive transfer to {destination} failed")]
    Copy {
        destination: String,
        source: ToolError,
    },

    #[error("{destination} is not reachable")]
    Unreachable {
        destination: String,
        source: ToolError,
    },

    #[error("loading the image on {destination} failed")]
    RemoteLoad {
        destination: String,
        source: ToolError,
    },
}
