use serde::Deserialize;

use protodyn_core::error::{ProtodynError, Result};
use protodyn_core::schema::catalog::SAMPLE_PACKAGE;
use protodyn_core::schema::Naming;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProtodynConfig {
    pub version: u32,

    #[serde(default)]
    pub naming: NamingSection,

    #[serde(default)]
    pub output: OutputSection,

    #[serde(default)]
    pub log: LogSection,
}

impl Default for ProtodynConfig {
    fn default() -> Self {
        Self {
            version: 1,
            naming: NamingSection::default(),
            output: OutputSection::default(),
            log: LogSection::default(),
        }
    }
}

impl ProtodynConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ProtodynError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.naming.validate()?;

        Ok(())
    }

    pub fn naming(&self) -> Naming {
        Naming::new(self.naming.namespace.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamingSection {
    /// Expanded as `<namespace>.<SimpleName>`.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for NamingSection {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
        }
    }
}

impl NamingSection {
    pub fn validate(&self) -> Result<()> {
        let valid = !self.namespace.is_empty()
            && self.namespace.split('.').all(|part| {
                part.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                    && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            });
        if !valid {
            return Err(ProtodynError::Config(format!(
                "naming.namespace '{}' must be dot-separated identifiers",
                self.namespace
            )));
        }
        Ok(())
    }
}

fn default_namespace() -> String {
    SAMPLE_PACKAGE.into()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    /// Pretty-print parse output.
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
