use std::collections::BTreeMap;

use crate::foundation::error::{OgError, OgResult};

/// Template image paths by asset identity, relative to the asset root.
///
/// Plain assets are keyed by id (`news`); variants by `{id}_{variant}` (`idea_3`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplateRegistry {
    paths: BTreeMap<String, String>,
}

impl TemplateRegistry {
    /// Build from an `asset key -> relative path` map, normalizing every path.
    pub fn from_map(map: &BTreeMap<String, String>) -> OgResult<Self> {
        let mut out = Self::default();
        for (key, path) in map {
            out.paths.insert(key.clone(), normalize_rel_path(path)?);
        }
        Ok(out)
    }

    /// Register `path` for `asset_id` and optional `variant`.
    pub fn register(&mut self, asset_id: &str, variant: Option<u32>, path: &str) -> OgResult<()> {
        self.paths
            .insert(template_key(asset_id, variant), normalize_rel_path(path)?);
        Ok(())
    }

    /// Relative path for an asset, or [`OgError::NotFound`] when none is registered.
    pub fn resolve(&self, asset_id: &str, variant: Option<u32>) -> OgResult<&str> {
        let key = template_key(asset_id, variant);
        self.paths
            .get(&key)
            .map(String::as_str)
            .ok_or_else(|| OgError::not_found(format!("no template path defined for '{key}'")))
    }
}

/// Cache key of a template image.
pub fn template_key(asset_id: &str, variant: Option<u32>) -> String {
    match variant {
        Some(v) => format!("{asset_id}_{v}"),
        None => asset_id.to_string(),
    }
}

/// Normalize and validate asset-root-relative paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> OgResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(OgError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(OgError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(OgError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(OgError::validation("asset path must contain a file name"));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/registry.rs"]
mod tests;
