//! resources read from the info file and the bindings exposed to templates
//!
//! The info file is a JSON object mapping a resource identifier to its attributes:
//!
//! ```json
//! {
//!   "0b1c…": { "type": "instance", "name": "web1", "accessIPv4": "10.0.0.5" }
//! }
//! ```
//!
//! [Resources] keeps the order of the file, which in turn decides the order in which
//! resources are processed.
use indexmap::IndexMap;
use std::path::Path;

#[derive(Default, Debug)]
pub struct Resources {
    resources: IndexMap<String, serde_json::Value>,
}

impl Resources {
    pub fn load_file(file_path: &Path) -> Result<Self, LoadError> {
        tracing::debug!(path=%file_path.display(), "parsing resources");
        let file = std::fs::File::open(file_path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn from_reader(reader: impl std::io::Read) -> Result<Self, LoadError> {
        let resources = serde_json::from_reader(reader)?;
        Ok(Self { resources })
    }

    pub fn iter(&self) -> impl Iterator<Item = Binding<'_>> {
        self.resources
            .iter()
            .map(|(uuid, resource)| Binding::new(uuid, resource))
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl std::str::FromStr for Resources {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            resources: serde_json::from_str(s)?,
        })
    }
}

impl<K: Into<String>> FromIterator<(K, serde_json::Value)> for Resources {
    fn from_iter<I: IntoIterator<Item = (K, serde_json::Value)>>(iter: I) -> Self {
        Self {
            resources: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("IO error")]
    Io(#[from] std::io::Error),
    #[error("Unable to parse resources as a JSON object")]
    Json(#[from] serde_json::Error),
}

/// Variables available to templates while rendering a single resource
///
/// - `uuid`: the resource identifier
/// - `resource`: the attributes, exactly as found in the info file
#[derive(derive_new::new, serde::Serialize, Debug, Clone, Copy)]
pub struct Binding<'r> {
    pub uuid: &'r str,
    pub resource: &'r serde_json::Value,
}
