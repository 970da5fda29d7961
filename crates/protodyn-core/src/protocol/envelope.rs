//! CloudEvents 1.0 structured-mode JSON envelope.
//!
//! Binary payloads travel base64-encoded in `data`; `data_base64` is read as
//! well. Attributes this crate does not know are kept in `extensions` and
//! written back unchanged.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use uuid::Uuid;

use crate::error::{ProtodynError, Result};
use crate::schema::SchemaRef;

pub const SPEC_VERSION: &str = "1.0";
pub const SOURCE: &str = "http://localhost/protodyn";
pub const SUBJECT: &str = "protodyn";
pub const CONTENT_TYPE_PROTOBUF: &str = "application/protobuf";
pub const CONTENT_TYPE_JSON: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub specversion: String,
    pub id: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Event type (field name is `type` in JSON).
    #[serde(rename = "type")]
    pub event_type: String,
    /// `<schema uri>#<TypeName>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataschema: Option<String>,
    /// RFC 3339 timestamp, kept as written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_base64: Option<String>,
    #[serde(flatten)]
    pub extensions: Map<String, Json>,
}

/// Build a fresh envelope around an encoded payload.
pub fn wrap(payload: &[u8], type_name: &str, schema_base_uri: &str) -> Envelope {
    Envelope {
        specversion: SPEC_VERSION.to_string(),
        id: Uuid::new_v4().to_string(),
        source: SOURCE.to_string(),
        subject: Some(SUBJECT.to_string()),
        event_type: type_name.to_string(),
        dataschema: Some(SchemaRef::join(schema_base_uri, type_name)),
        time: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        datacontenttype: Some(CONTENT_TYPE_PROTOBUF.to_string()),
        data: Some(Json::String(STANDARD.encode(payload))),
        data_base64: None,
        extensions: Map::new(),
    }
}

/// Open a serialized envelope: payload bytes and the `dataschema` reference.
pub fn unwrap(bytes: &[u8]) -> Result<(Bytes, String)> {
    let envelope = Envelope::from_slice(bytes)?;
    let payload = envelope.payload()?;
    let schema = envelope.schema_ref()?.to_string();
    Ok((payload, schema))
}

impl Envelope {
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| format_err(format!("cannot serialize envelope: {e}")))
    }

    pub fn to_vec_pretty(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| format_err(format!("cannot serialize envelope: {e}")))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let envelope: Self = serde_json::from_slice(bytes)
            .map_err(|e| format_err(format!("malformed envelope: {e}")))?;
        if envelope.specversion != SPEC_VERSION {
            return Err(format_err(format!(
                "unsupported specversion '{}'",
                envelope.specversion
            )));
        }
        envelope.timestamp()?;
        Ok(envelope)
    }

    /// Parsed `time` attribute, offset preserved.
    pub fn timestamp(&self) -> Result<Option<DateTime<FixedOffset>>> {
        self.time
            .as_deref()
            .map(|t| {
                DateTime::parse_from_rfc3339(t)
                    .map_err(|e| format_err(format!("envelope time '{t}' is not RFC 3339: {e}")))
            })
            .transpose()
    }

    /// Decoded binary payload, from `data` (base64 string) or `data_base64`.
    pub fn payload(&self) -> Result<Bytes> {
        let encoded = match (&self.data, &self.data_base64) {
            (Some(Json::String(s)), _) => s.as_str(),
            (None, Some(s)) => s.as_str(),
            (Some(_), _) => {
                return Err(format_err("envelope data is not a base64 string".into()));
            }
            (None, None) => return Err(format_err("envelope carries no data".into())),
        };
        STANDARD
            .decode(encoded)
            .map(Bytes::from)
            .map_err(|e| format_err(format!("envelope data is not valid base64: {e}")))
    }

    pub fn schema_ref(&self) -> Result<&str> {
        self.dataschema
            .as_deref()
            .ok_or_else(|| format_err("envelope has no dataschema".into()))
    }

    /// Replace the binary payload by its JSON projection.
    pub fn into_projected(mut self, json: Json) -> Self {
        self.data = Some(json);
        self.data_base64 = None;
        self.datacontenttype = Some(CONTENT_TYPE_JSON.to_string());
        self
    }
}

fn format_err(msg: String) -> ProtodynError {
    ProtodynError::EnvelopeFormat(msg)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn wrap_sets_attributes() {
        let env = wrap(&[0x0a, 0x01, 0x41], "SimpleMessage", "file:///schema.pb");
        assert_eq!(env.specversion, "1.0");
        assert_eq!(env.source, SOURCE);
        assert_eq!(env.subject.as_deref(), Some(SUBJECT));
        assert_eq!(env.dataschema.as_deref(), Some("file:///schema.pb#SimpleMessage"));
        assert_eq!(env.datacontenttype.as_deref(), Some(CONTENT_TYPE_PROTOBUF));
        assert!(Uuid::parse_str(&env.id).is_ok());
        assert_eq!(env.data, Some(json!("CgFB")));
        assert!(env.timestamp().unwrap().is_some());
    }

    #[test]
    fn wrap_then_unwrap() {
        let payload = [0x08, 0x96, 0x01];
        let bytes = wrap(&payload, "T", "file:///s.pb").to_vec().unwrap();
        let (out, schema) = unwrap(&bytes).unwrap();
        assert_eq!(&out[..], &payload);
        assert_eq!(schema, "file:///s.pb#T");
    }

    #[test]
    fn ids_are_fresh() {
        assert_ne!(wrap(&[], "T", "x").id, wrap(&[], "T", "x").id);
    }

    #[test]
    fn data_base64_is_accepted_and_extensions_survive() {
        let raw = json!({
            "specversion": "1.0",
            "id": "1",
            "source": "s",
            "type": "T",
            "dataschema": "file:///s.pb#T",
            "data_base64": "AAEC",
            "traceparent": "00-abc"
        });
        let env = Envelope::from_slice(raw.to_string().as_bytes()).unwrap();
        assert_eq!(&env.payload().unwrap()[..], &[0, 1, 2]);
        assert_eq!(env.extensions.get("traceparent"), Some(&json!("00-abc")));

        let projected = env.into_projected(json!({"a": 1}));
        let out: Json = serde_json::from_slice(&projected.to_vec().unwrap()).unwrap();
        assert_eq!(out["datacontenttype"], "application/json");
        assert_eq!(out["data"], json!({"a": 1}));
        assert_eq!(out["traceparent"], "00-abc");
        assert!(out.get("data_base64").is_none());
    }

    #[test]
    fn time_is_written_back_as_received() {
        let raw = json!({
            "specversion": "1.0",
            "id": "1",
            "source": "s",
            "type": "T",
            "time": "2026-10-19T10:30:00.5+02:00",
            "dataschema": "file:///s.pb#T",
            "data": "AAEC"
        });
        let env = Envelope::from_slice(raw.to_string().as_bytes()).unwrap();
        let offset = env.timestamp().unwrap().unwrap().offset().local_minus_utc();
        assert_eq!(offset, 2 * 3600);

        let out: Json =
            serde_json::from_slice(&env.into_projected(json!({})).to_vec().unwrap()).unwrap();
        assert_eq!(out["time"], "2026-10-19T10:30:00.5+02:00");
    }

    #[test]
    fn malformed_records_are_rejected() {
        for raw in [
            "not json".to_string(),
            json!({"id": "1", "source": "s", "type": "T"}).to_string(),
            json!({"specversion": "1.0", "id": "1", "source": "s", "type": "T", "data": "AA=="})
                .to_string(),
            json!({"specversion": "1.0", "id": "1", "source": "s", "type": "T",
                   "dataschema": "x#T", "data": "%%%"})
            .to_string(),
            json!({"specversion": "1.0", "id": "1", "source": "s", "type": "T",
                   "dataschema": "x#T", "data": "AA==", "time": "yesterday"})
            .to_string(),
        ] {
            let err = unwrap(raw.as_bytes()).unwrap_err();
            assert_eq!(err.code().as_str(), "ENVELOPE_FORMAT", "{raw}");
        }
    }
}
