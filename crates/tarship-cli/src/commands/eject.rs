use std::path::Path;

use super::pipeline::Project;

pub async fn eject() -> anyhow::Result<()> {
    let project = Project::load(Path::new("."), None)?;
    let dockerfile = project.render_dockerfile();

    tarship_build::eject::eject(&project.dir, &dockerfile)?;

    println!("Ejected build config to .tarship/Dockerfile");
    println!("You can now edit it directly. tarship build and deploy will use this file.");
    Ok(())
}
