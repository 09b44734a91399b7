//! gcpcheck - Google Cloud credential smoke test
//!
//! Resolves a token source from the environment, builds authenticated
//! Billing and Resource Manager clients, and probes both APIs.

pub mod config;
pub mod gcp;
pub mod probe;

/// Version injected at compile time via GCPCHECK_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("GCPCHECK_VERSION") {
    Some(v) => v,
    None => "dev",
};
