use std::path::Path;

use tarship_runner::ShipClient;

use super::pipeline::{self, Project};

/// Save an image built earlier by `tarship build`.
pub async fn save(tag: Option<&str>) -> anyhow::Result<()> {
    let project = Project::load(Path::new("."), tag)?;
    let client = ShipClient::new(&project.config.build.engine);

    // Refuse to save something the engine does not have
    let image_id = client.image_id(&project.image).await?;
    tracing::debug!(image = %project.image, id = %image_id, "image found");

    let mut steps = Vec::new();
    let archive = pipeline::save(&client, &project, &mut steps).await?;

    println!(
        "Saved {} to {} ({})",
        project.image,
        archive.path.display(),
        pipeline::human_size(archive.size)
    );
    Ok(())
}
