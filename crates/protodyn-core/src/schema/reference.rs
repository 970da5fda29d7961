//! Schema references of the form `<scheme>://<path>#<TypeName>`.

use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{ProtodynError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRef {
    /// Local path of the descriptor-set file.
    pub location: PathBuf,
    /// Fragment: simple (or fully-qualified) message name.
    pub type_name: String,
}

impl SchemaRef {
    /// Parse a reference. `file://` URIs map to local paths: `file:///a/b.pb`
    /// is absolute, `file://dir/b.pb` is relative to the working directory.
    /// A bare `path#Type` is accepted as well.
    pub fn parse(uri: &str) -> Result<Self> {
        let (location, fragment) = match Url::parse(uri) {
            Ok(url) => {
                if url.scheme() != "file" {
                    return Err(ProtodynError::SchemaLoad(format!(
                        "unsupported schema reference scheme '{}' in {uri}",
                        url.scheme()
                    )));
                }
                let location = local_path(&url).ok_or_else(|| {
                    ProtodynError::SchemaLoad(format!("{uri} is not a local file reference"))
                })?;
                (location, url.fragment().map(str::to_string))
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => match uri.split_once('#') {
                Some((path, fragment)) => (PathBuf::from(path), Some(fragment.to_string())),
                None => (PathBuf::from(uri), None),
            },
            Err(e) => {
                return Err(ProtodynError::SchemaLoad(format!(
                    "invalid schema reference {uri}: {e}"
                )))
            }
        };

        let type_name = fragment.filter(|f| !f.is_empty()).ok_or_else(|| {
            ProtodynError::TypeNotFound(format!("schema reference {uri} names no message type"))
        })?;

        Ok(Self {
            location,
            type_name,
        })
    }

    /// The `dataschema` form: `<base>#<type>`.
    pub fn join(base: &str, type_name: &str) -> String {
        format!("{base}#{type_name}")
    }
}

/// Percent-decoded local path. A host is read as the first directory of a
/// relative path, decoded the same way as the absolute form.
fn local_path(url: &Url) -> Option<PathBuf> {
    match url.host_str().filter(|h| !h.is_empty()) {
        None => url.to_file_path().ok(),
        Some(host) => {
            let rooted = Url::parse(&format!("file:///{host}{}", url.path())).ok()?;
            let rooted = rooted.to_file_path().ok()?;
            rooted.strip_prefix("/").ok().map(Path::to_path_buf)
        }
    }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.location.display(), self.type_name)
    }
}
