use std::fs;
use std::path::Path;

use bytes::Bytes;

use protodyn_core::codec::decode;
use protodyn_core::error::ProtodynError;
use protodyn_core::json::to_json;
use protodyn_core::protocol::envelope::Envelope;
use protodyn_core::schema::{Naming, Registry, Resolver, SchemaRef, StaticCatalog};

use crate::pipeline::{write_target, AtStage, PipelineError, Stage};

#[derive(Debug, Clone)]
pub struct ParseRequest<'a> {
    pub source_path: &'a Path,
    /// Required for raw input; for envelopes only used when `dataschema` is absent.
    pub schema_uri: Option<&'a str>,
    pub raw: bool,
    pub use_static: bool,
    /// Overrides the reference fragment.
    pub type_name: Option<&'a str>,
    pub target_path: Option<&'a Path>,
    pub naming: &'a Naming,
    pub pretty: bool,
}

pub fn run(req: &ParseRequest<'_>) -> Result<(), PipelineError> {
    let out = project(req)?;
    write_target(req.target_path, &out)
}

/// Run the parse state machine and return the serialized output: the
/// envelope with its payload projected, or the bare projection for raw input.
pub fn project(req: &ParseRequest<'_>) -> Result<Vec<u8>, PipelineError> {
    let input = fs::read(req.source_path).at(Stage::RawInput)?;
    tracing::info!(path = %req.source_path.display(), bytes = input.len(), raw = req.raw, "read input");

    let (payload, envelope, reference) = if req.raw {
        let reference = req.schema_uri.map(str::to_string).ok_or_else(|| {
            PipelineError::new(
                Stage::SchemaResolved,
                ProtodynError::SchemaLoad("raw input needs a schema uri".into()),
            )
        })?;
        (Bytes::from(input), None, reference)
    } else {
        let (payload, envelope, reference) = unwrap_envelope(&input, req.schema_uri)?;
        (payload, Some(envelope), reference)
    };

    let schema = schema_ref(&reference, req.type_name).at(Stage::SchemaResolved)?;
    let resolver = if req.use_static {
        Resolver::Static(StaticCatalog::new())
    } else {
        let bytes = fs::read(&schema.location).at(Stage::SchemaResolved)?;
        Resolver::Dynamic(Registry::load(&bytes).at(Stage::SchemaResolved)?)
    };
    let ty = resolver
        .resolve_simple(&schema.type_name, req.naming)
        .at(Stage::SchemaResolved)?;
    tracing::info!(%schema, strategy = resolver.strategy(), message = ty.full_name(), "schema resolved");

    let value = decode(&payload, ty).at(Stage::Decoded)?;
    tracing::info!(message = ty.full_name(), "payload decoded");

    let json = to_json(&value, ty).at(Stage::Projected)?;
    let out = match envelope {
        Some(envelope) => {
            let projected = envelope.into_projected(json);
            if req.pretty {
                projected.to_vec_pretty()
            } else {
                projected.to_vec()
            }
        }
        None => serialize_projection(&json, req.pretty),
    }
    .at(Stage::Projected)?;
    tracing::info!(bytes = out.len(), "payload projected");
    Ok(out)
}

fn serialize_projection(json: &serde_json::Value, pretty: bool) -> protodyn_core::Result<Vec<u8>> {
    let out = if pretty {
        serde_json::to_vec_pretty(json)
    } else {
        serde_json::to_vec(json)
    };
    out.map_err(|e| ProtodynError::Projection(format!("cannot serialize projection: {e}")))
}

fn unwrap_envelope(
    input: &[u8],
    fallback_uri: Option<&str>,
) -> Result<(Bytes, Envelope, String), PipelineError> {
    let envelope = Envelope::from_slice(input).at(Stage::EnvelopeUnwrapped)?;
    let payload = envelope.payload().at(Stage::EnvelopeUnwrapped)?;
    let reference = match (&envelope.dataschema, fallback_uri) {
        (Some(dataschema), _) => dataschema.clone(),
        (None, Some(uri)) => {
            tracing::debug!(uri, "envelope has no dataschema, using --schema-uri");
            uri.to_string()
        }
        (None, None) => envelope.schema_ref().at(Stage::EnvelopeUnwrapped)?.to_string(),
    };
    tracing::debug!(id = %envelope.id, payload = payload.len(), %reference, "envelope unwrapped");
    Ok((payload, envelope, reference))
}

/// Parse `reference`, letting `type_override` replace (or supply) the fragment.
fn schema_ref(reference: &str, type_override: Option<&str>) -> protodyn_core::Result<SchemaRef> {
    match type_override {
        Some(name) => {
            let base = reference.split_once('#').map_or(reference, |(base, _)| base);
            SchemaRef::parse(&SchemaRef::join(base, name))
        }
        None => SchemaRef::parse(reference),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_override_replaces_or_supplies_fragment() {
        let r = schema_ref("file:///s.pb#SimpleMessage", Some("ComplexMessage")).unwrap();
        assert_eq!(r.type_name, "ComplexMessage");
        let r = schema_ref("file:///s.pb", Some("ImportMessage")).unwrap();
        assert_eq!(r.type_name, "ImportMessage");
        assert_eq!(r.location, Path::new("/s.pb"));
    }

    #[test]
    fn missing_fragment_without_override_is_type_not_found() {
        let err = schema_ref("file:///s.pb", None).unwrap_err();
        assert_eq!(err.code().as_str(), "TYPE_NOT_FOUND");
    }
}
