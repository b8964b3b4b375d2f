use tarship_core::{BuildConfig, ImageConfig};

/// File name the environment file gets inside the build context.
pub const CONTEXT_ENV_FILE: &str = ".tarship.env";

/// Where the environment file lives inside the runtime image.
pub const IMAGE_ENV_PATH: &str = "/app/.env";

/// Renders the two-stage Dockerfile: compile in a Rust image, run in a slim one.
///
/// The build context is the Cargo workspace root, so the builder selects the
/// package with `-p` as well as the binary.
pub struct DockerfileGenerator<'a> {
    build: &'a BuildConfig,
    image: &'a ImageConfig,
    package: &'a str,
    binary: &'a str,
}

impl<'a> DockerfileGenerator<'a> {
    pub fn new(
        build: &'a BuildConfig,
        image: &'a ImageConfig,
        package: &'a str,
        binary: &'a str,
    ) -> Self {
        Self {
            build,
            image,
            package,
            binary,
        }
    }

    pub fn render(&self) -> String {
        let build_packages = apt_install(&self.build.build_packages);
        let runtime_packages = apt_install(&self.build.runtime_packages);
        let offline = if self.build.sqlx_offline {
            "ENV SQLX_OFFLINE=true\n"
        } else {
            ""
        };
        let locked = if self.build.locked { " --locked" } else { "" };
        let env: String = self
            .build
            .env
            .iter()
            .map(|(key, value)| format!("ENV {key}={}\n", quote_env_value(value)))
            .collect();

        format!(
            r#"# === Stage 1: Builder ===
FROM {base} AS builder
{build_packages}WORKDIR /app
COPY . .
{offline}RUN cargo build --release{locked} -p {package} --bin {binary}

# === Stage 2: Runtime ===
FROM {runtime}
{runtime_packages}WORKDIR /app
COPY --from=builder /app/target/release/{binary} /app/{binary}
COPY {context_env} {image_env}
{env}EXPOSE {port}
ENTRYPOINT ["/app/{binary}"]
"#,
            base = self.build.base_image,
            runtime = self.build.runtime_image,
            package = self.package,
            binary = self.binary,
            context_env = CONTEXT_ENV_FILE,
            image_env = IMAGE_ENV_PATH,
            port = self.image.port,
        )
    }
}

fn apt_install(packages: &[String]) -> String {
    if packages.is_empty() {
        return String::new();
    }
    format!(
        "RUN apt-get update && apt-get install -y --no-install-recommends {} && rm -rf /var/lib/apt/lists/*\n",
        packages.join(" ")
    )
}

/// Values with whitespace, quotes or `$` are double-quoted so the ENV line
/// keeps a single key/value pair.
fn quote_env_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '\\' | '$'));
    if !needs_quotes {
        return value.to_owned();
    }
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$");
    format!("\"{escaped}\"")
}
