use std::env;
use std::error::Error;
use std::process::Command;

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=VAULT_EXPORTER_RUSTC_VERSION");

    if env::var_os("VAULT_EXPORTER_RUSTC_VERSION").is_some() {
        return Ok(());
    }

    // `rustc 1.85.0 (4d91de4e4 2025-02-17)` -> `1.85.0`
    let rustc = env::var_os("RUSTC").unwrap_or_else(|| "rustc".into());
    let output = Command::new(rustc).arg("--version").output()?;
    let stdout = String::from_utf8(output.stdout)?;
    if let Some(version) = stdout.split_whitespace().nth(1) {
        println!("cargo:rustc-env=VAULT_EXPORTER_RUSTC_VERSION={version}");
    }
    Ok(())
}
