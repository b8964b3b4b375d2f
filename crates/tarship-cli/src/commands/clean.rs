use std::io::Write;
use std::path::Path;

use tarship_build::bundle;
use tarship_runner::ShipClient;

use super::pipeline::Project;

/// Remove the local bundle and archive, optionally the local image.
pub async fn clean(skip_confirm: bool, remove_image: bool) -> anyhow::Result<()> {
    let project = Project::load(Path::new("."), None)?;
    let archive = project.archive_path();

    if !skip_confirm {
        println!("This will delete:");
        println!("  - Local {}", project.bundle_dir().display());
        println!("  - Archive {}", archive.display());
        if remove_image {
            println!("  - Image {} from {}", project.image, project.config.build.engine);
        }

        println!();
        print!("Are you sure? [y/N] ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !matches!(input.trim(), "y" | "Y" | "yes" | "YES") {
            println!("Aborted.");
            return Ok(());
        }
    }

    // 1. Bundle
    if bundle::remove_bundle(project.context_dir())? {
        println!("Removed local {}", project.bundle_dir().display());
    }

    // 2. Archive
    if archive.exists() {
        std::fs::remove_file(&archive)?;
        println!("Removed {}", archive.display());
    }

    // 3. Image
    if remove_image {
        let client = ShipClient::new(&project.config.build.engine);
        println!("Removing image {}...", project.image);
        match client.remove_image(&project.image).await {
            Ok(()) => println!("  Removed."),
            Err(e) => println!("  Skipped ({e})"),
        }
    }

    println!();
    println!("Clean complete.");
    Ok(())
}
