use std::path::Path;

use protodyn_core::protocol::envelope;
use protodyn_core::schema::StaticCatalog;

use crate::fixtures::Shape;
use crate::pipeline::{write_file, AtStage, PipelineError, Stage};

#[derive(Debug, Clone)]
pub struct EmitRequest<'a> {
    pub shape: Shape,
    pub path: &'a Path,
    /// Descriptor-set URI for `dataschema`; `None` only for raw output.
    pub schema_uri: Option<&'a str>,
    pub raw: bool,
}

/// Encode the fixture for `req.shape` and write raw bytes or an envelope.
pub fn run(req: &EmitRequest<'_>) -> Result<(), PipelineError> {
    let catalog = StaticCatalog::new();
    let payload = req.shape.encode(&catalog).at(Stage::Encode)?;
    tracing::info!(shape = req.shape.name(), bytes = payload.len(), "encoded fixture");

    if req.raw {
        return write_file(req.path, &payload);
    }

    let schema_uri = req.schema_uri.ok_or_else(|| {
        PipelineError::new(
            Stage::Wrap,
            protodyn_core::ProtodynError::EnvelopeFormat(
                "a schema uri is required for wrapped output".into(),
            ),
        )
    })?;
    let envelope = envelope::wrap(&payload, req.shape.name(), schema_uri);
    tracing::debug!(id = %envelope.id, dataschema = ?envelope.dataschema, "wrapped payload");
    let bytes = envelope.to_vec().at(Stage::Wrap)?;
    write_file(req.path, &bytes)
}
