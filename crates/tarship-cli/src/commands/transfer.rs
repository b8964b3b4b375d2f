use std::path::Path;

use tarship_runner::ShipClient;

use super::pipeline::{self, Project};

/// Copy the archive written by `tarship save` (or `deploy --no-transfer`).
pub async fn transfer(tag: Option<&str>) -> anyhow::Result<()> {
    let project = Project::load(Path::new("."), tag)?;
    let target = project.config.remote_target()?;
    let client = ShipClient::new(&project.config.build.engine);

    let archive = project.archive_path();
    println!("Transferring {} to {} ...", archive.display(), target.destination());

    let mut steps = Vec::new();
    let remote = pipeline::transfer(&client, &project, &target, &archive, &mut steps).await?;

    for step in &steps {
        println!("  ✓ {step}");
    }
    println!();
    println!("Shipped: {remote}");
    Ok(())
}
