mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tarship",
    about = "Build a Rust service into a container image, save it as a tar archive, and ship it over scp"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add tarship to an existing Rust project
    Init,
    /// Build, save, and transfer the image
    Deploy {
        /// Allow building with uncommitted changes
        #[arg(long)]
        allow_dirty: bool,
        /// Stop after the archive is saved
        #[arg(long)]
        no_transfer: bool,
        /// Capture engine build output instead of streaming it
        #[arg(long, short)]
        quiet: bool,
        /// Image tag (overrides [image].tag)
        #[arg(long)]
        tag: Option<String>,
    },
    /// Build the image only
    Build {
        /// Allow building with uncommitted changes
        #[arg(long)]
        allow_dirty: bool,
        /// Capture engine build output instead of streaming it
        #[arg(long, short)]
        quiet: bool,
        /// Image tag (overrides [image].tag)
        #[arg(long)]
        tag: Option<String>,
    },
    /// Save an already built image to the tar archive
    Save {
        /// Image tag (overrides [image].tag)
        #[arg(long)]
        tag: Option<String>,
    },
    /// Copy the saved archive to the remote host
    Transfer {
        /// Image tag (overrides [image].tag)
        #[arg(long)]
        tag: Option<String>,
    },
    /// Eject Dockerfile for manual customization
    Eject,
    /// Check tools, remote host, and project readiness
    Doctor,
    /// Print the resolved configuration as JSON
    Config,
    /// Remove the build context and archive
    Clean {
        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
        /// Also remove the image from the local engine
        #[arg(long)]
        image: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `tarship config` output stays parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => commands::init_project().await?,
        Commands::Deploy {
            allow_dirty,
            no_transfer,
            quiet,
            tag,
        } => commands::deploy(allow_dirty, no_transfer, quiet, tag.as_deref()).await?,
        Commands::Build {
            allow_dirty,
            quiet,
            tag,
        } => commands::build(allow_dirty, quiet, tag.as_deref()).await?,
        Commands::Save { tag } => commands::save(tag.as_deref()).await?,
        Commands::Transfer { tag } => commands::transfer(tag.as_deref()).await?,
        Commands::Eject => commands::eject().await?,
        Commands::Doctor => commands::doctor().await?,
        Commands::Config => commands::config().await?,
        Commands::Clean { yes, image } => commands::clean(yes, image).await?,
    }

    Ok(())
}
