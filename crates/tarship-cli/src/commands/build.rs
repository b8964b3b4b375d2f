use std::path::Path;

use tarship_runner::ShipClient;

use super::pipeline::{self, PipelineOptions, Project, Stage};

pub async fn build(allow_dirty: bool, quiet: bool, tag: Option<&str>) -> anyhow::Result<()> {
    let project = Project::load(Path::new("."), tag)?;
    let client = ShipClient::new(&project.config.build.engine);

    println!("Building {} ...", project.image);
    let outcome = pipeline::run(
        &client,
        &project,
        &PipelineOptions {
            allow_dirty,
            capture_build: quiet,
            until: Stage::Build,
        },
    )
    .await?;

    super::print_outcome(&outcome);
    Ok(())
}
