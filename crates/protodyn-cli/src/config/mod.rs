//! Config loader (strict parsing).

pub mod schema;

use std::fs;
use std::path::Path;

use protodyn_core::error::{ProtodynError, Result};

pub use schema::{LogFormat, LogSection, NamingSection, OutputSection, ProtodynConfig};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_PATH: &str = "protodyn.yaml";

pub fn load_from_file(path: &Path) -> Result<ProtodynConfig> {
    let s = fs::read_to_string(path).map_err(|e| {
        ProtodynError::Config(format!("read config {} failed: {e}", path.display()))
    })?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ProtodynConfig> {
    let cfg: ProtodynConfig = serde_yaml::from_str(s)
        .map_err(|e| ProtodynError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Explicit path, else `protodyn.yaml` if present, else defaults.
pub fn resolve(explicit: Option<&Path>) -> Result<ProtodynConfig> {
    match explicit {
        Some(path) => load_from_file(path),
        None if Path::new(DEFAULT_PATH).is_file() => load_from_file(Path::new(DEFAULT_PATH)),
        None => Ok(ProtodynConfig::default()),
    }
}
