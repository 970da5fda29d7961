//! Emit, parse and schema-export pipelines.
//!
//! Each pipeline is a fixed sequence of fallible steps. A failure aborts
//! the run and reports the [`Stage`] it happened in; the underlying
//! [`ProtodynError`] is kept unchanged as the source.

pub mod emit;
pub mod export;
pub mod parse;

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use protodyn_core::error::ProtodynError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RawInput,
    EnvelopeUnwrapped,
    SchemaResolved,
    Decoded,
    Projected,
    Encode,
    Wrap,
    Output,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::RawInput => "raw_input",
            Stage::EnvelopeUnwrapped => "envelope_unwrapped",
            Stage::SchemaResolved => "schema_resolved",
            Stage::Decoded => "decoded",
            Stage::Projected => "projected",
            Stage::Encode => "encode",
            Stage::Wrap => "wrap",
            Stage::Output => "output",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("{stage} stage failed")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: ProtodynError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: ProtodynError) -> Self {
        Self { stage, source }
    }
}

/// Attach a stage to a core result.
pub(crate) trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, PipelineError>;
}

impl<T, E: Into<ProtodynError>> AtStage<T> for Result<T, E> {
    fn at(self, stage: Stage) -> Result<T, PipelineError> {
        self.map_err(|e| PipelineError::new(stage, e.into()))
    }
}

pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    fs::write(path, bytes).at(Stage::Output)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote output");
    Ok(())
}

/// Target file when given, stdout otherwise.
pub(crate) fn write_target(target: Option<&Path>, bytes: &[u8]) -> Result<(), PipelineError> {
    match target {
        Some(path) => write_file(path, bytes),
        None => {
            let mut out = std::io::stdout().lock();
            out.write_all(bytes).at(Stage::Output)?;
            out.write_all(b"\n").at(Stage::Output)?;
            out.flush().at(Stage::Output)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn stage_is_reported_and_source_kept() {
        let err: Result<(), _> = Err(ProtodynError::TypeNotFound("x.Y".into()));
        let err = err.at(Stage::SchemaResolved).unwrap_err();
        assert_eq!(err.to_string(), "schema_resolved stage failed");
        assert_eq!(err.source.code().as_str(), "TYPE_NOT_FOUND");
        assert!(err.source().is_some());
    }
}
