use std::path::Path;

use tarship_runner::ShipClient;

use super::pipeline::{self, PipelineOptions, Project, Stage};

/// Execute the full pipeline: build → save → transfer.
pub async fn deploy(
    allow_dirty: bool,
    no_transfer: bool,
    quiet: bool,
    tag: Option<&str>,
) -> anyhow::Result<()> {
    let project = Project::load(Path::new("."), tag)?;
    let client = ShipClient::new(&project.config.build.engine);

    let until = if no_transfer {
        Stage::Save
    } else {
        Stage::Transfer
    };

    println!("Deploying {} ...", project.image);
    let outcome = pipeline::run(
        &client,
        &project,
        &PipelineOptions {
            allow_dirty,
            capture_build: quiet,
            until,
        },
    )
    .await?;

    super::print_outcome(&outcome);
    if no_transfer {
        println!();
        println!("Transfer skipped. Ship it later with: tarship transfer");
    }

    Ok(())
}
