//! Build information baked in at compile time.
//!
//! The version comes from `Cargo.toml` and the compiler version from the
//! build script. Revision, branch and build date are read from
//! `VAULT_EXPORTER_REVISION`, `VAULT_EXPORTER_BRANCH` and
//! `VAULT_EXPORTER_BUILD_DATE` when the crate is compiled. Anything missing
//! falls back to `"unknown"`.

const UNKNOWN: &str = "unknown";

/// Static build metadata for the running binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub revision: &'static str,
    pub branch: &'static str,
    pub build_date: &'static str,
    pub rustc: &'static str,
}

impl BuildInfo {
    /// Build info for this compilation.
    pub const fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            revision: or_unknown(option_env!("VAULT_EXPORTER_REVISION")),
            branch: or_unknown(option_env!("VAULT_EXPORTER_BRANCH")),
            build_date: or_unknown(option_env!("VAULT_EXPORTER_BUILD_DATE")),
            rustc: or_unknown(option_env!("VAULT_EXPORTER_RUSTC_VERSION")),
        }
    }

    /// Short one-line summary, e.g. `(version=0.1.0, branch=main, revision=abc123)`.
    pub fn info(&self) -> String {
        format!(
            "(version={}, branch={}, revision={})",
            self.version, self.branch, self.revision
        )
    }

    /// Build context, e.g. `(rustc=1.85.0, date=2024-01-01, platform=linux/x86_64)`.
    pub fn context(&self) -> String {
        format!(
            "(rustc={}, date={}, platform={})",
            self.rustc,
            self.build_date,
            platform()
        )
    }

    /// Multi-line report printed by the `version` command.
    pub fn report(&self, program: &str) -> String {
        format!(
            "{program}, version {} (branch: {}, revision: {})\n  build date: {}\n  rustc:      {}\n  platform:   {}",
            self.version,
            self.branch,
            self.revision,
            self.build_date,
            self.rustc,
            platform()
        )
    }
}

const fn or_unknown(value: Option<&'static str>) -> &'static str {
    match value {
        Some(v) => v,
        None => UNKNOWN,
    }
}

fn platform() -> String {
    format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH)
}
