use std::path::{Path, PathBuf};

use tarship_core::{CargoProject, Error};
use tempfile::TempDir;

/// Write a manifest plus one `fn main` per listed source file.
fn write_package(dir: &Path, manifest: &str, sources: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join("Cargo.toml"), manifest).unwrap();
    for src in sources {
        let path = dir.join(src);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "fn main() {}\n").unwrap();
    }
}

fn simple_manifest(name: &str) -> String {
    format!("[package]\nname = \"{name}\"\nversion = \"1.2.3\"\nedition = \"2021\"\n")
}

#[test]
fn discover_single_package() {
    let tmp = TempDir::new().unwrap();
    write_package(tmp.path(), &simple_manifest("myapp"), &["src/main.rs"]);

    let project = CargoProject::discover(tmp.path()).unwrap();

    assert_eq!(project.name, "myapp");
    assert_eq!(project.version, "1.2.3");
    assert_eq!(project.binary, "myapp");
    assert_eq!(project.binaries.len(), 1);
    assert_eq!(
        project.workspace_root.canonicalize().unwrap(),
        tmp.path().canonicalize().unwrap()
    );
    assert_eq!(project.member_dir, PathBuf::new());
}

#[test]
fn discover_explicit_bin_section() {
    let tmp = TempDir::new().unwrap();
    write_package(
        tmp.path(),
        r#"[package]
name = "budget"
version = "0.1.0"
edition = "2021"

[[bin]]
name = "budget-server"
path = "src/main.rs"
"#,
        &["src/main.rs"],
    );

    let project = CargoProject::discover(tmp.path()).unwrap();
    assert_eq!(project.name, "budget");
    assert_eq!(project.binary, "budget-server");
}

#[test]
fn discover_default_run_among_several() {
    let tmp = TempDir::new().unwrap();
    write_package(
        tmp.path(),
        r#"[package]
name = "multi"
version = "0.1.0"
edition = "2021"
default-run = "server"
"#,
        &["src/bin/server.rs", "src/bin/seed.rs"],
    );

    let project = CargoProject::discover(tmp.path()).unwrap();
    assert_eq!(project.binary, "server");
    assert_eq!(project.binaries.len(), 2);
}

#[test]
fn discover_ambiguous_binaries_errors() {
    let tmp = TempDir::new().unwrap();
    write_package(
        tmp.path(),
        &simple_manifest("ambig"),
        &["src/bin/server.rs", "src/bin/seed.rs"],
    );

    let err = CargoProject::discover(tmp.path()).unwrap_err();
    assert!(matches!(err, Error::MultipleBinaries { .. }));
    assert!(err.to_string().contains("default-run"), "got: {err}");
}

#[test]
fn discover_workspace_member_with_inherited_version() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("Cargo.toml"),
        r#"[workspace]
members = ["api"]

[workspace.package]
version = "2.0.0"
edition = "2021"
"#,
    )
    .unwrap();
    write_package(
        &tmp.path().join("api"),
        "[package]\nname = \"api\"\nversion.workspace = true\nedition.workspace = true\n",
        &["src/main.rs"],
    );

    let project = CargoProject::discover(&tmp.path().join("api")).unwrap();

    assert_eq!(project.version, "2.0.0");
    assert_eq!(
        project.workspace_root.canonicalize().unwrap(),
        tmp.path().canonicalize().unwrap()
    );
    // the build context is the root, so the member is addressed by its path
    assert_eq!(project.member_dir, PathBuf::from("api"));
}

#[test]
fn discover_nested_workspace_member() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("Cargo.toml"),
        "[workspace]\nmembers = [\"services/*\"]\nresolver = \"2\"\n",
    )
    .unwrap();
    write_package(
        &tmp.path().join("services/billing"),
        &simple_manifest("billing"),
        &["src/main.rs"],
    );

    let project = CargoProject::discover(&tmp.path().join("services/billing")).unwrap();

    assert_eq!(project.name, "billing");
    assert_eq!(project.member_dir, PathBuf::from("services/billing"));
}

#[test]
fn discover_virtual_workspace_root_errors() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("Cargo.toml"),
        "[workspace]\nmembers = [\"api\"]\n",
    )
    .unwrap();
    write_package(
        &tmp.path().join("api"),
        &simple_manifest("api"),
        &["src/main.rs"],
    );

    let err = CargoProject::discover(tmp.path()).unwrap_err().to_string();
    assert!(err.contains("no package found"), "got: {err}");
    assert!(err.contains("api"), "should list members, got: {err}");
}

#[test]
fn discover_without_manifest_errors() {
    let tmp = TempDir::new().unwrap();
    let err = CargoProject::discover(tmp.path()).unwrap_err().to_string();
    assert!(err.contains("cargo metadata"), "got: {err}");
}

#[test]
fn discover_lib_only_errors() {
    let tmp = TempDir::new().unwrap();
    write_package(tmp.path(), &simple_manifest("lib-only"), &[]);
    std::fs::create_dir_all(tmp.path().join("src")).unwrap();
    std::fs::write(tmp.path().join("src/lib.rs"), "pub fn hello() {}\n").unwrap();

    let err = CargoProject::discover(tmp.path()).unwrap_err();
    assert!(matches!(err, Error::NoBinaryTarget { .. }));
}
