use std::path::{Path, PathBuf};

use tarship_build::dockerfile::DockerfileGenerator;
use tarship_build::{BundleInput, bundle, eject as eject_mod};
use tarship_core::{CargoProject, EnvFile, ImageRef, RemoteTarget, TarshipConfig};
use tarship_runner::{CommandExecutor, ShipClient};

/// Resolved project state shared by every pipeline stage.
pub(crate) struct Project {
    pub dir: PathBuf,
    pub config: TarshipConfig,
    pub cargo: CargoProject,
    pub image: ImageRef,
}

impl Project {
    /// Load `tarship.toml`, discover the Cargo binary and resolve the image reference.
    pub fn load(dir: &Path, tag: Option<&str>) -> anyhow::Result<Self> {
        let config = TarshipConfig::load(dir)?;
        let cargo = CargoProject::discover(dir)?;
        let image = config.image_ref(&cargo.name, tag)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            config,
            cargo,
            image,
        })
    }

    pub fn archive_path(&self) -> PathBuf {
        self.config.archive_path(&self.dir, &self.image)
    }

    pub fn env_file_path(&self) -> PathBuf {
        self.config.env_file_path(&self.dir)
    }

    /// Build context root: the Cargo workspace root, so workspace members
    /// get the root manifest and lockfile.
    pub fn context_dir(&self) -> &Path {
        &self.cargo.workspace_root
    }

    pub fn bundle_dir(&self) -> PathBuf {
        self.context_dir().join(bundle::BUNDLE_DIR)
    }

    /// Context-relative paths to keep out of the bundle and the dirty check.
    pub fn context_exclude(&self) -> Vec<PathBuf> {
        archive_exclude(&self.config)
            .into_iter()
            .map(|archive| self.cargo.member_dir.join(archive))
            .collect()
    }

    pub fn render_dockerfile(&self) -> String {
        DockerfileGenerator::new(
            &self.config.build,
            &self.config.image,
            &self.cargo.name,
            &self.cargo.binary,
        )
        .render()
    }
}

/// Last stage a pipeline run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Build,
    Save,
    Transfer,
}

pub(crate) struct PipelineOptions {
    pub allow_dirty: bool,
    /// When `true`, engine build output is captured instead of streamed.
    pub capture_build: bool,
    pub until: Stage,
}

/// Result of a successful pipeline run.
pub(crate) struct DeployOutcome {
    pub steps: Vec<String>,
    pub image_id: String,
    /// Captured build output (only when `capture_build` is `true`).
    pub build_output: Option<String>,
    pub archive: Option<SavedArchive>,
    /// `destination:remote_file` when the archive was transferred.
    pub remote: Option<String>,
}

pub(crate) struct SavedArchive {
    pub path: PathBuf,
    pub size: u64,
}

/// Run the pipeline: dirty check → preflight → bundle → build → save → transfer.
///
/// Every stage runs only after the previous one succeeded; the first failure
/// is returned and nothing after it is attempted.
pub(crate) async fn run<E: CommandExecutor>(
    client: &ShipClient<E>,
    project: &Project,
    options: &PipelineOptions,
) -> anyhow::Result<DeployOutcome> {
    let mut steps = Vec::new();

    // Dirty check
    let exclude = project.context_exclude();
    if !options.allow_dirty && bundle::is_dirty(project.context_dir(), &exclude)? {
        anyhow::bail!(
            "uncommitted changes detected.\n\
             Commit your changes, or use `--allow-dirty` to build anyway."
        );
    }

    // Resolve the transfer target before anything runs
    let target = match options.until {
        Stage::Transfer => Some(project.config.remote_target()?),
        Stage::Build | Stage::Save => None,
    };

    // Environment file
    let env_file = EnvFile::load(&project.env_file_path())?;
    env_file.require(&project.config.image.required_env)?;
    step(
        &mut steps,
        format!(
            "Environment file {} checked ({} keys)",
            project.config.image.env_file,
            env_file.keys().len()
        ),
    );

    // Pre-flight checks
    let report = client.check_prerequisites(target.as_ref()).await?;
    step(
        &mut steps,
        format!(
            "Pre-flight checks passed ({} {})",
            client.engine(),
            report.engine_version.as_deref().unwrap_or("unknown")
        ),
    );

    // Determine Dockerfile content
    let dockerfile = if eject_mod::is_ejected(&project.dir) {
        step(&mut steps, "Using ejected Dockerfile".to_owned());
        eject_mod::load_ejected_dockerfile(&project.dir)?
    } else {
        project.render_dockerfile()
    };

    // Bundle build context
    let env_path = project.env_file_path();
    let bundle_dir = bundle::create_bundle(
        project.context_dir(),
        &BundleInput {
            dockerfile: &dockerfile,
            env_file: &env_path,
            exclude: &exclude,
        },
    )?;
    step(&mut steps, "Build context bundled".to_owned());

    // Build and confirm the image exists
    let build_output = client
        .build_image(&bundle_dir, &project.image, options.capture_build)
        .await?;
    let image_id = client.image_id(&project.image).await?;
    step(
        &mut steps,
        format!("Image built: {} ({})", project.image, short_id(&image_id)),
    );

    let mut outcome = DeployOutcome {
        steps: Vec::new(),
        image_id,
        build_output,
        archive: None,
        remote: None,
    };
    if options.until == Stage::Build {
        outcome.steps = steps;
        return Ok(outcome);
    }

    let archive = save(client, project, &mut steps).await?;

    if let Some(target) = &target {
        let remote = transfer(client, project, target, &archive.path, &mut steps).await?;
        outcome.remote = Some(remote);
    }

    outcome.archive = Some(archive);
    outcome.steps = steps;
    Ok(outcome)
}

/// Save the image to its archive. The caller guarantees the image exists.
pub(crate) async fn save<E: CommandExecutor>(
    client: &ShipClient<E>,
    project: &Project,
    steps: &mut Vec<String>,
) -> anyhow::Result<SavedArchive> {
    let path = project.archive_path();
    let size = client.save_image(&project.image, &path).await?;
    step(
        steps,
        format!("Image saved to {} ({})", path.display(), human_size(size)),
    );
    Ok(SavedArchive { path, size })
}

/// Copy an existing archive to the target and, if configured, load it there.
pub(crate) async fn transfer<E: CommandExecutor>(
    client: &ShipClient<E>,
    project: &Project,
    target: &RemoteTarget,
    archive: &Path,
    steps: &mut Vec<String>,
) -> anyhow::Result<String> {
    let remote_file = client.copy_archive(archive, target).await?;
    let remote = format!("{}:{remote_file}", target.destination());
    step(steps, format!("Archive transferred to {remote}"));

    if project.config.remote.load {
        let output = client.load_remote(target, &remote_file).await?;
        step(
            steps,
            format!("Image loaded on {}: {output}", target.destination()),
        );
    }

    Ok(remote)
}

fn step(steps: &mut Vec<String>, message: String) {
    tracing::info!("{message}");
    steps.push(message);
}

/// A configured relative archive path, relative to the package directory.
fn archive_exclude(config: &TarshipConfig) -> Vec<PathBuf> {
    match &config.image.archive {
        Some(archive) if Path::new(archive).is_relative() => vec![PathBuf::from(archive)],
        _ => Vec::new(),
    }
}

/// `sha256:0123456789ab...` → `0123456789ab`
pub(crate) fn short_id(image_id: &str) -> &str {
    let id = image_id.strip_prefix("sha256:").unwrap_or(image_id);
    id.get(..12).unwrap_or(id)
}

pub(crate) fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
