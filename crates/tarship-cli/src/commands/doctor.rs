use std::path::Path;

use tarship_core::{CONFIG_FILE, CargoProject, EnvFile, TarshipConfig};
use tarship_runner::{CheckResult, DoctorReport, ShipClient};

pub async fn doctor() -> anyhow::Result<()> {
    let project_dir = Path::new(".");

    let (config, config_file) = match TarshipConfig::load(project_dir) {
        Ok(config) if project_dir.join(CONFIG_FILE).exists() => {
            (config, CheckResult::ok("Found"))
        }
        Ok(config) => (config, CheckResult::fail("Not found — run `tarship init`")),
        // Keep going with defaults so the remaining checks still run
        Err(e) => (TarshipConfig::default(), CheckResult::fail(&e.to_string())),
    };

    let client = ShipClient::new(&config.build.engine);
    let report = match config.remote_target() {
        Ok(target) => client.doctor(Some(&target)).await,
        Err(e) => {
            let mut report = client.doctor(None).await;
            report.remote = CheckResult::fail(&e.to_string());
            report
        }
    };

    let report = DoctorReport {
        config_file,
        env_file: check_env_file(&config, project_dir),
        project: check_project(project_dir),
        ..report
    };

    println!();
    println!("{report}");

    if !report.all_passed() {
        anyhow::bail!("some checks failed — see above for details");
    }

    Ok(())
}

fn check_env_file(config: &TarshipConfig, project_dir: &Path) -> CheckResult {
    let env = match EnvFile::load(&config.env_file_path(project_dir)) {
        Ok(env) => env,
        Err(e) => return CheckResult::fail(&e.to_string()),
    };
    let missing = env.missing(&config.image.required_env);
    if missing.is_empty() {
        CheckResult::ok(&format!(
            "{} ({} keys)",
            config.image.env_file,
            env.keys().len()
        ))
    } else {
        CheckResult::fail(&format!("missing required keys: {}", missing.join(", ")))
    }
}

fn check_project(project_dir: &Path) -> CheckResult {
    match CargoProject::discover(project_dir) {
        Ok(p) => CheckResult::ok(&format!("{} {} (bin {})", p.name, p.version, p.binary)),
        Err(e) => CheckResult::fail(&e.to_string()),
    }
}
