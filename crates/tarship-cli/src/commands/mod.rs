mod build;
mod clean;
mod config;
mod deploy;
mod doctor;
mod eject;
mod init;
mod pipeline;
mod save;
mod transfer;

pub use build::build;
pub use clean::clean;
pub use config::config;
pub use deploy::deploy;
pub use doctor::doctor;
pub use eject::eject;
pub use init::init_project;
pub use save::save;
pub use transfer::transfer;

use pipeline::DeployOutcome;

/// Print the completed steps and what was produced.
fn print_outcome(outcome: &DeployOutcome) {
    if let Some(output) = &outcome.build_output {
        tracing::debug!(%output, "captured build output");
    }
    println!();
    for step in &outcome.steps {
        println!("  ✓ {step}");
    }
    println!();
    println!("Image id: {}", outcome.image_id);
    if let Some(archive) = &outcome.archive {
        println!("Archive:  {}", archive.path.display());
    }
    if let Some(remote) = &outcome.remote {
        println!("Shipped:  {remote}");
    }
}
