use mockall::mock;
use std::path::Path;
use tarship_core::{ImageRef, RemoteTarget};
use tarship_runner::client::{
    BuildError, PreflightError, SaveError, ShipClient, TransferError,
};
use tarship_runner::executor::CommandExecutor;
use tarship_runner::tool::ToolError;
use tempfile::TempDir;

mock! {
    Executor {}

    impl CommandExecutor for Executor {
        async fn exec(&self, program: &str, args: &[String]) -> Result<String, ToolError>;
        async fn exec_streaming(&self, program: &str, args: &[String]) -> Result<(), ToolError>;
    }
}

fn image() -> ImageRef {
    ImageRef::new("myapp", "v1").unwrap()
}

fn target() -> RemoteTarget {
    RemoteTarget {
        host: "deploy.example.com".to_owned(),
        user: Some("deploy".to_owned()),
        port: None,
        identity_file: None,
        path: "/srv/images".to_owned(),
        ssh_options: vec![],
    }
}

fn failed(program: &str) -> ToolError {
    ToolError::CommandFailed {
        program: program.to_owned(),
        args: vec![],
        stderr: "boom".to_owned(),
    }
}

fn not_found(program: &str) -> ToolError {
    ToolError::NotFound {
        program: program.to_owned(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
    }
}

fn write_archive(dir: &Path) -> std::path::PathBuf {
    let archive = dir.join("myapp_v1.tar");
    std::fs::write(&archive, b"tar bytes").unwrap();
    archive
}

// ── Preflight Tests ──

#[tokio::test]
async fn preflight_engine_only_without_remote() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|program, args| program == "docker" && args.contains(&"version".to_owned()))
        .returning(|_, _| Ok("27.1.1\n".to_owned()));
    mock.expect_exec()
        .withf(|program, _| program == "ssh")
        .times(0);

    let client = ShipClient::with_executor(mock, "docker");
    let report = client.check_prerequisites(None).await.unwrap();

    assert_eq!(report.engine_version.as_deref(), Some("27.1.1"));
    assert!(report.remote.is_none());
}

#[tokio::test]
async fn preflight_all_checks_pass_with_remote() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|program, _| program == "podman")
        .returning(|_, _| Ok("5.0.2\n".to_owned()));
    mock.expect_exec()
        .withf(|program, args| program == "ssh" && args == ["-V".to_owned()])
        .returning(|_, _| Ok(String::new()));
    mock.expect_exec()
        .withf(|program, args| {
            program == "ssh"
                && args.contains(&"BatchMode=yes".to_owned())
                && args.last() == Some(&"true".to_owned())
        })
        .times(1)
        .returning(|_, _| Ok(String::new()));

    let client = ShipClient::with_executor(mock, "podman");
    let report = client.check_prerequisites(Some(&target())).await.unwrap();

    assert_eq!(report.engine_version.as_deref(), Some("5.0.2"));
    assert_eq!(report.remote.as_deref(), Some("deploy@deploy.example.com"));
}

#[tokio::test]
async fn preflight_engine_missing() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|program, _| program == "docker")
        .returning(|_, _| Err(not_found("docker")));

    let client = ShipClient::with_executor(mock, "docker");
    let result = client.check_prerequisites(Some(&target())).await;

    assert!(matches!(
        result,
        Err(PreflightError::EngineUnavailable { ref engine, .. }) if engine == "docker"
    ));
}

#[tokio::test]
async fn preflight_remote_unreachable() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|program, _| program == "docker")
        .returning(|_, _| Ok("27.1.1\n".to_owned()));
    mock.expect_exec()
        .withf(|program, args| program == "ssh" && args == ["-V".to_owned()])
        .returning(|_, _| Ok(String::new()));
    mock.expect_exec()
        .withf(|program, args| program == "ssh" && args.contains(&"BatchMode=yes".to_owned()))
        .returning(|_, _| Err(failed("ssh")));

    let client = ShipClient::with_executor(mock, "docker");
    let result = client.check_prerequisites(Some(&target())).await;

    assert!(matches!(
        result,
        Err(PreflightError::RemoteUnreachable { ref destination, .. })
            if destination == "deploy@deploy.example.com"
    ));
}

// ── Build Tests ──

#[tokio::test]
async fn build_streams_with_tag_and_context() {
    let mut mock = MockExecutor::new();

    mock.expect_exec_streaming()
        .withf(|program, args| {
            program == "docker"
                && args
                    == [
                        "build".to_owned(),
                        "--tag".to_owned(),
                        "myapp:v1".to_owned(),
                        "/work/.tarship-bundle".to_owned(),
                    ]
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let client = ShipClient::with_executor(mock, "docker");
    let output = client
        .build_image(Path::new("/work/.tarship-bundle"), &image(), false)
        .await
        .unwrap();

    assert!(output.is_none());
}

#[tokio::test]
async fn build_capture_returns_output() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| args.first() == Some(&"build".to_owned()))
        .returning(|_, _| Ok("Successfully built abc123\n".to_owned()));

    let client = ShipClient::with_executor(mock, "docker");
    let output = client
        .build_image(Path::new("/work/.tarship-bundle"), &image(), true)
        .await
        .unwrap();

    assert_eq!(output.as_deref(), Some("Successfully built abc123\n"));
}

#[tokio::test]
async fn build_failure_is_reported() {
    let mut mock = MockExecutor::new();

    mock.expect_exec_streaming()
        .returning(|_, _| Err(failed("docker")));

    let client = ShipClient::with_executor(mock, "docker");
    let result = client
        .build_image(Path::new("/work/.tarship-bundle"), &image(), false)
        .await;

    assert!(matches!(result, Err(BuildError::Build { .. })));
}

#[tokio::test]
async fn image_id_is_trimmed() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| {
            args == [
                "image".to_owned(),
                "inspect".to_owned(),
                "--format".to_owned(),
                "{{.Id}}".to_owned(),
                "myapp:v1".to_owned(),
            ]
        })
        .returning(|_, _| Ok("sha256:0123abcd\n".to_owned()));

    let client = ShipClient::with_executor(mock, "docker");
    assert_eq!(client.image_id(&image()).await.unwrap(), "sha256:0123abcd");
}

#[tokio::test]
async fn image_id_missing_image() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .returning(|_, _| Err(failed("docker")));

    let client = ShipClient::with_executor(mock, "docker");
    let result = client.image_id(&image()).await;

    assert!(matches!(
        result,
        Err(BuildError::ImageMissing { ref image, .. }) if image == "myapp:v1"
    ));
}

// ── Save Tests ──

#[tokio::test]
async fn save_writes_archive_and_reports_size() {
    let tmp = TempDir::new().unwrap();
    let archive = tmp.path().join(".tarship").join("myapp_v1.tar");
    let expected_path = archive.to_str().unwrap().to_owned();

    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(move |program, args| {
            program == "docker"
                && args
                    == [
                        "save".to_owned(),
                        "--output".to_owned(),
                        expected_path.clone(),
                        "myapp:v1".to_owned(),
                    ]
        })
        .times(1)
        .returning(|_, args| {
            std::fs::write(&args[2], b"0123456789").unwrap();
            Ok(String::new())
        });

    let client = ShipClient::with_executor(mock, "docker");
    let size = client.save_image(&image(), &archive).await.unwrap();

    assert_eq!(size, 10);
    assert!(archive.is_file());
}

#[tokio::test]
async fn save_removes_stale_archive_before_saving() {
    let tmp = TempDir::new().unwrap();
    let archive = write_archive(tmp.path());

    let mut mock = MockExecutor::new();
    // Engine "succeeds" without writing anything
    mock.expect_exec().returning(|_, _| Ok(String::new()));

    let client = ShipClient::with_executor(mock, "docker");
    let result = client.save_image(&image(), &archive).await;

    assert!(matches!(result, Err(SaveError::NotWritten(_))));
    assert!(!archive.exists());
}

#[tokio::test]
async fn save_rejects_empty_archive() {
    let tmp = TempDir::new().unwrap();
    let archive = tmp.path().join("myapp_v1.tar");

    let mut mock = MockExecutor::new();
    mock.expect_exec().returning(|_, args| {
        std::fs::write(&args[2], b"").unwrap();
        Ok(String::new())
    });

    let client = ShipClient::with_executor(mock, "docker");
    let result = client.save_image(&image(), &archive).await;

    assert!(matches!(result, Err(SaveError::Empty(_))));
}

#[tokio::test]
async fn save_failure_is_reported() {
    let tmp = TempDir::new().unwrap();
    let archive = tmp.path().join("myapp_v1.tar");

    let mut mock = MockExecutor::new();
    mock.expect_exec().returning(|_, _| Err(failed("docker")));

    let client = ShipClient::with_executor(mock, "docker");
    let result = client.save_image(&image(), &archive).await;

    assert!(matches!(result, Err(SaveError::Save { .. })));
}

// ── Transfer Tests ──

#[tokio::test]
async fn copy_archive_runs_scp_in_batch_mode() {
    let tmp = TempDir::new().unwrap();
    let archive = write_archive(tmp.path());
    let local = archive.to_str().unwrap().to_owned();

    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(move |program, args| {
            program == "scp"
                && args
                    == [
                        "-B".to_owned(),
                        "-P".to_owned(),
                        "2222".to_owned(),
                        "-i".to_owned(),
                        "/home/me/.ssh/deploy".to_owned(),
                        "--".to_owned(),
                        local.clone(),
                        "deploy@deploy.example.com:/srv/images/myapp_v1.tar".to_owned(),
                    ]
        })
        .times(1)
        .returning(|_, _| Ok(String::new()));

    let remote = RemoteTarget {
        port: Some(2222),
        identity_file: Some("/home/me/.ssh/deploy".to_owned()),
        ..target()
    };
    let client = ShipClient::with_executor(mock, "docker");
    let remote_file = client.copy_archive(&archive, &remote).await.unwrap();

    assert_eq!(remote_file, "/srv/images/myapp_v1.tar");
}

#[tokio::test]
async fn copy_archive_requires_existing_archive() {
    let tmp = TempDir::new().unwrap();
    let archive = tmp.path().join("missing.tar");

    let mut mock = MockExecutor::new();
    mock.expect_exec().times(0);

    let client = ShipClient::with_executor(mock, "docker");
    let result = client.copy_archive(&archive, &target()).await;

    assert!(matches!(result, Err(TransferError::ArchiveMissing(_))));
}

#[tokio::test]
async fn copy_archive_failure_names_destination() {
    let tmp = TempDir::new().unwrap();
    let archive = write_archive(tmp.path());

    let mut mock = MockExecutor::new();
    mock.expect_exec().returning(|_, _| Err(failed("scp")));

    let client = ShipClient::with_executor(mock, "docker");
    let result = client.copy_archive(&archive, &target()).await;

    assert!(matches!(
        result,
        Err(TransferError::Copy { ref destination, .. }) if destination == "deploy@deploy.example.com"
    ));
}

#[tokio::test]
async fn load_remote_quotes_path() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|program, args| {
            program == "ssh"
                && args.last() == Some(&"'docker' load --input '/srv/my images/myapp_v1.tar'".to_owned())
                && args[args.len() - 2] == "deploy@deploy.example.com"
        })
        .times(1)
        .returning(|_, _| Ok("Loaded image: myapp:v1\n".to_owned()));

    let client = ShipClient::with_executor(mock, "docker");
    let output = client
        .load_remote(&target(), "/srv/my images/myapp_v1.tar")
        .await
        .unwrap();

    assert_eq!(output, "Loaded image: myapp:v1");
}

// ── Doctor Tests ──

#[tokio::test]
async fn doctor_reports_every_tool_without_short_circuit() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|program, _| program == "docker")
        .returning(|_, _| Err(not_found("docker")));
    mock.expect_exec()
        .withf(|program, args| program == "ssh" && args == ["-V".to_owned()])
        .returning(|_, _| Ok(String::new()));
    mock.expect_exec()
        .withf(|program, args| program == "ssh" && args.last() == Some(&"true".to_owned()))
        .returning(|_, _| Ok(String::new()));

    let client = ShipClient::with_executor(mock, "docker");
    let report = client.doctor(Some(&target())).await;

    assert!(!report.engine.passed);
    assert!(report.ssh.passed);
    assert!(report.remote.passed);
    assert_eq!(report.remote.detail, "deploy@deploy.example.com");
}

#[tokio::test]
async fn doctor_without_remote_fails_remote_check() {
    let mut mock = MockExecutor::new();
    mock.expect_exec().returning(|_, _| Ok("27.1.1\n".to_owned()));

    let client = ShipClient::with_executor(mock, "docker");
    let report = client.doctor(None).await;

    assert!(report.engine.passed);
    assert_eq!(report.engine.detail, "docker 27.1.1");
    assert!(!report.remote.passed);
}
