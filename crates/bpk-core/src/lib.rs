pub mod builder;
pub mod error;
pub mod flags;
pub mod io;
pub mod metadata;
pub mod naming;
pub mod paths;
pub mod pipeline;
pub mod runner;
pub mod shim;
pub mod staging;

pub use builder::{BuildOutcome, BuildRequest, Builder};
pub use error::{BuildError, BuildStage};
pub use paths::*;
pub use runner::{CommandRunner, Invocation, ProcessRunner, RunStatus};

/// User Agent string for core operations
pub const USER_AGENT: &str = concat!("bpk-core/", env!("CARGO_PKG_VERSION"));
