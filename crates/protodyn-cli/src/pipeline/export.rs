use std::path::Path;

use protodyn_core::schema::StaticCatalog;

use crate::pipeline::{write_file, AtStage, PipelineError, Stage};

/// Write the compiled-in sample schemas as a `FileDescriptorSet`.
pub fn run(path: &Path) -> Result<(), PipelineError> {
    let catalog = StaticCatalog::new();
    let bytes = catalog.file_descriptor_set().at(Stage::Encode)?;
    tracing::debug!(files = catalog.files().len(), "exporting sample schemas");
    write_file(path, &bytes)
}
