use std::path::Path;

use tarship_build::eject as eject_mod;

use super::pipeline::Project;

/// Print the resolved configuration and everything derived from it.
pub async fn config() -> anyhow::Result<()> {
    let project = Project::load(Path::new("."), None)?;

    let remote = match project.config.remote_target() {
        Ok(target) => serde_json::json!({
            "destination": target.destination(),
            "target": target,
        }),
        Err(e) => serde_json::json!({ "error": e.to_string() }),
    };

    let dockerfile = if eject_mod::is_ejected(&project.dir) {
        ".tarship/Dockerfile (ejected)"
    } else {
        "generated"
    };

    let resolved = serde_json::json!({
        "config": project.config,
        "package": project.cargo.name,
        "binary": project.cargo.binary,
        "build_context": project.context_dir(),
        "image": project.image.to_string(),
        "archive": project.archive_path(),
        "env_file": project.env_file_path(),
        "dockerfile": dockerfile,
        "remote": remote,
    });

    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}
