//! External tool plumbing for tarship: the container engine (`docker` or a
//! compatible CLI), `scp` and `ssh`.
//!
//! Every process goes through [`CommandExecutor`] so the pipeline can be
//! exercised with mocks.

pub mod client;
pub mod doctor;
pub mod executor;
pub mod tool;

pub use client::{
    BuildError, PreflightError, PreflightReport, SaveError, ShipClient, TransferError,
};
pub use doctor::{CheckResult, DoctorReport};
pub use executor::{CommandExecutor, RealExecutor};
pub use tool::ToolError;
