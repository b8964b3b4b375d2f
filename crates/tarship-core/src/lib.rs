//! Core types and configuration for tarship.
//!
//! This crate defines the `tarship.toml` schema ([`TarshipConfig`]), Cargo
//! project discovery ([`CargoProject`]), validated image references
//! ([`ImageRef`]) and transfer destinations ([`RemoteTarget`]), the
//! environment file check ([`EnvFile`]), and shared error types.

pub mod cargo;
pub mod config;
pub mod env_file;
pub mod error;
pub mod image;
pub mod remote;

pub use cargo::{CargoBinary, CargoProject};
pub use config::{
    BuildConfig, CONFIG_FILE, ImageConfig, ProjectConfig, RemoteConfig, STATE_DIR, TarshipConfig,
};
pub use env_file::EnvFile;
pub use error::{Error, Result};
pub use image::ImageRef;
pub use remote::RemoteTarget;
