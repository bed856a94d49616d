//! Content types, content records, and the cache keys derived from them.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    foundation::{
        error::{OgError, OgResult},
        math::Fnv1a64,
    },
    render::encode::OutputFormat,
};

/// Closed set of content types that have a preview template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// News article preview.
    News,
}

impl ContentType {
    /// All supported types.
    pub const ALL: [ContentType; 1] = [ContentType::News];

    /// Stable lowercase tag, used as the cache-key prefix.
    pub fn tag(self) -> &'static str {
        match self {
            Self::News => "news",
        }
    }

    /// Field of the record that identifies one renderable item.
    pub fn identity_field(self) -> &'static str {
        match self {
            Self::News => "slug",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ContentType {
    type Err = OgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "news" => Ok(Self::News),
            other => Err(OgError::unsupported_type(other.to_string())),
        }
    }
}

/// Free-form content record as handed over by the content store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentData(Map<String, Value>);

impl ContentData {
    /// Wrap a JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Parse a JSON object from text.
    pub fn from_json_str(raw: &str) -> OgResult<Self> {
        serde_json::from_str(raw).map_err(|e| OgError::serde(format!("content record: {e}")))
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Non-empty string field, if present.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// `true` when `key` exists, whatever its value.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Underlying JSON object.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Canonical text form: compact JSON with keys in sorted order.
    pub fn canonical_json(&self) -> String {
        sorted(&Value::Object(self.0.clone())).to_string()
    }
}

impl From<Map<String, Value>> for ContentData {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// Typed view of a news record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewsRecord {
    /// Headline; `None` when missing or empty.
    pub title: Option<String>,
    /// Background photo URL.
    pub image_url: Option<String>,
    /// Brand label; drawn only when present.
    pub brand: Option<String>,
    /// Identity field.
    pub slug: Option<String>,
}

impl NewsRecord {
    /// Read the known news fields out of `data`.
    pub fn from_data(data: &ContentData) -> Self {
        let owned = |key: &str| data.get_str(key).map(str::to_string);
        Self {
            title: owned("title"),
            image_url: owned("imageUrl"),
            brand: owned("brand"),
            slug: owned("slug"),
        }
    }
}

/// Deterministic identity of one renderable artifact.
///
/// `{tag}_{identity}` when the identity field is present, otherwise `{tag}-h{hash}` where the hash
/// is FNV-1a over the canonical JSON of the record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for `data` of type `ty`.
    ///
    /// Identity values that could escape the output directory are rejected.
    pub fn derive(ty: ContentType, data: &ContentData) -> OgResult<Self> {
        match data.get_str(ty.identity_field()) {
            Some(id) => {
                validate_identity(ty, id)?;
                Ok(Self(format!("{}_{id}", ty.tag())))
            }
            None => {
                let mut h = Fnv1a64::new_default();
                h.write_bytes(data.canonical_json().as_bytes());
                Ok(Self(format!("{}-h{:016x}", ty.tag(), h.finish())))
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Artifact file (or object) name: `{key}.{ext}`.
    pub fn file_name(&self, format: OutputFormat) -> String {
        format!("{}.{}", self.0, format.extension())
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            Value::Object(keys.into_iter().map(|k| (k.clone(), sorted(&map[k]))).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

fn validate_identity(ty: ContentType, id: &str) -> OgResult<()> {
    let bad = id == "."
        || id == ".."
        || id.contains(['/', '\\', '\0'])
        || id.chars().any(char::is_control);
    if bad {
        return Err(OgError::validation(format!(
            "{} {} '{id}' is not usable as a file name",
            ty.tag(),
            ty.identity_field()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/content.rs"]
mod tests;
