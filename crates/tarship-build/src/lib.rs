//! Dockerfile generation, build-context bundling, and eject for tarship.
//!
//! # Image layout
//!
//! ```text
//! Stage 1 (builder)  FROM rust  → SQLX_OFFLINE=true cargo build --release --locked -p <pkg> --bin <bin>
//! Stage 2 (runtime)  FROM slim  → apt libssl3/ca-certificates
//!                                 /app/<bin>   (binary only)
//!                                 /app/.env    (environment file)
//!                                 EXPOSE <port>, ENTRYPOINT ["/app/<bin>"]
//! ```
//!
//! # Build context
//!
//! `.tarship-bundle/` sits in the Cargo workspace root and mirrors its git
//! view (`git ls-files`), minus any `.tarship/`, `.tarship-bundle/` and
//! `.git/`, plus the environment file (as `.tarship.env`) and the
//! Dockerfile. An ejected `.tarship/Dockerfile` in the package directory
//! replaces the rendered one.

pub mod bundle;
pub mod dockerfile;
pub mod eject;

pub use bundle::{BundleError, BundleInput};
pub use dockerfile::DockerfileGenerator;
pub use eject::EjectError;
