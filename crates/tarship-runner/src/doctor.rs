use std::fmt;

// ── Doctor types ──

#[derive(Debug, Default)]
pub struct DoctorReport {
    pub engine: CheckResult,
    pub ssh: CheckResult,
    pub remote: CheckResult,
    pub config_file: CheckResult,
    pub env_file: CheckResult,
    pub project: CheckResult,
}

impl DoctorReport {
    pub fn all_passed(&self) -> bool {
        self.checks().iter().all(|(_, c)| c.passed)
    }

    fn checks(&self) -> [(&'static str, &CheckResult); 6] {
        [
            ("Container engine", &self.engine),
            ("ssh", &self.ssh),
            ("Remote host", &self.remote),
            ("tarship.toml", &self.config_file),
            ("Env file", &self.env_file),
            ("Cargo project", &self.project),
        ]
    }
}

impl fmt::Display for DoctorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "tarship doctor")?;
        writeln!(f, "{}", "-".repeat(40))?;
        for (label, check) in self.checks() {
            writeln!(f, "{label:<18}{:<4}{}", check.icon(), check.detail)?;
        }
        writeln!(f, "{}", "-".repeat(40))?;
        if self.all_passed() {
            write!(f, "All checks passed!")
        } else {
            write!(f, "Some checks failed.")
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn ok(detail: &str) -> Self {
        Self {
            passed: true,
            detail: detail.to_owned(),
        }
    }

    pub fn fail(detail: &str) -> Self {
        Self {
            passed: false,
            detail: detail.to_owned(),
        }
    }

    pub fn icon(&self) -> &'static str {
        if self.passed { "OK" } else { "NG" }
    }
}
