//! Pack descriptor handling.
//!
//! The descriptor (`pack.mcmeta`) is authored by the project and rewritten
//! by the build with the merged overlay entries. Projects put arbitrary
//! extra fields in it (`pack.description`, feature flags, filter sections),
//! so it is kept as a raw JSON object and only the `overlays.entries` list
//! is touched; everything else passes through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::core::DpmError;
use crate::version::FormatRange;

/// The redundant inclusive-bounds record carried by every overlay entry,
/// required by newer game versions alongside `min_format`/`max_format`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatBounds {
    pub min_inclusive: i64,
    pub max_inclusive: i64,
}

/// One entry of the descriptor's `overlays.entries` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayEntry {
    /// Overlay directory name at the pack root.
    pub directory: String,
    pub min_format: i64,
    pub max_format: i64,
    pub formats: FormatBounds,
}

impl OverlayEntry {
    /// Build an entry for a directory from a resolved range.
    pub fn new(directory: impl Into<String>, range: FormatRange) -> Self {
        Self {
            directory: directory.into(),
            min_format: range.min,
            max_format: range.max,
            formats: FormatBounds {
                min_inclusive: range.min,
                max_inclusive: range.max,
            },
        }
    }
}

/// A parsed pack descriptor with all unknown fields preserved.
#[derive(Debug, Clone)]
pub struct PackDescriptor {
    origin: String,
    value: Value,
}

impl PackDescriptor {
    /// Parse descriptor bytes. `origin` is the path used in error messages.
    ///
    /// # Errors
    ///
    /// [`DpmError::PackDescriptorInvalid`] when the contents are not a JSON
    /// object.
    pub fn parse(bytes: &[u8], origin: &str) -> Result<Self, DpmError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| DpmError::PackDescriptorInvalid {
                path: origin.to_string(),
                reason: e.to_string(),
            })?;
        if !value.is_object() {
            return Err(DpmError::PackDescriptorInvalid {
                path: origin.to_string(),
                reason: "expected a JSON object".to_string(),
            });
        }
        Ok(Self {
            origin: origin.to_string(),
            value,
        })
    }

    /// Rewrite `overlays.entries` as: the project base entry, then whatever
    /// entries the descriptor already declared, then the dependency entries
    /// in declaration order. Later entries win in the game when several
    /// match the same format, which makes this ordering the priority order.
    pub fn merge_overlay_entries(
        &mut self,
        base: OverlayEntry,
        dependency_entries: Vec<OverlayEntry>,
    ) -> Result<(), DpmError> {
        let overlays = self
            .value
            .as_object_mut()
            .expect("descriptor is validated as an object")
            .entry("overlays")
            .or_insert_with(|| json!({}));
        if !overlays.is_object() {
            return Err(DpmError::PackDescriptorInvalid {
                path: self.origin.clone(),
                reason: "'overlays' is not an object".to_string(),
            });
        }

        let existing = match overlays.get("entries") {
            Some(Value::Array(entries)) => entries.clone(),
            Some(_) => {
                return Err(DpmError::PackDescriptorInvalid {
                    path: self.origin.clone(),
                    reason: "'overlays.entries' is not an array".to_string(),
                });
            }
            None => Vec::new(),
        };

        let mut merged = Vec::with_capacity(existing.len() + dependency_entries.len() + 1);
        merged.push(serde_json::to_value(base)?);
        merged.extend(existing);
        for entry in dependency_entries {
            merged.push(serde_json::to_value(entry)?);
        }

        overlays
            .as_object_mut()
            .expect("checked above")
            .insert("entries".to_string(), Value::Array(merged));
        Ok(())
    }

    /// The descriptor as a raw JSON value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Serialize for writing back to the tree.
    pub fn to_pretty_bytes(&self) -> Result<Vec<u8>, DpmError> {
        let mut bytes = serde_json::to_vec_pretty(&self.value)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(json: &str) -> PackDescriptor {
        PackDescriptor::parse(json.as_bytes(), "pack.mcmeta").unwrap()
    }

    fn entry(directory: &str, expr: &str) -> OverlayEntry {
        OverlayEntry::new(directory, FormatRange::resolve(expr).unwrap())
    }

    #[test]
    fn rejects_non_object_descriptors() {
        for bad in ["[]", "42", "not json"] {
            assert!(matches!(
                PackDescriptor::parse(bad.as_bytes(), "pack.mcmeta"),
                Err(DpmError::PackDescriptorInvalid { .. })
            ));
        }
    }

    #[test]
    fn merge_orders_base_then_existing_then_dependencies() {
        let mut desc = descriptor(
            r#"{"pack": {"pack_format": 48, "description": "demo"},
                "overlays": {"entries": [{"directory": "handwritten", "min_format": 1, "max_format": 2, "formats": {"min_inclusive": 1, "max_inclusive": 2}}]}}"#,
        );
        desc.merge_overlay_entries(entry("base", "*"), vec![entry("dep_a", "10-20")])
            .unwrap();

        let entries = desc.value()["overlays"]["entries"].as_array().unwrap();
        let dirs: Vec<&str> = entries
            .iter()
            .map(|e| e["directory"].as_str().unwrap())
            .collect();
        assert_eq!(dirs, vec!["base", "handwritten", "dep_a"]);

        // Untouched sections survive the rewrite.
        assert_eq!(desc.value()["pack"]["description"], "demo");
    }

    #[test]
    fn merge_creates_overlays_section_when_absent() {
        let mut desc = descriptor(r#"{"pack": {"pack_format": 48}}"#);
        desc.merge_overlay_entries(entry("base", "*"), vec![]).unwrap();

        let entries = desc.value()["overlays"]["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["directory"], "base");
        assert_eq!(entries[0]["formats"]["min_inclusive"], 0);
    }

    #[test]
    fn entry_carries_redundant_bounds() {
        let e = entry("x", "10-20");
        assert_eq!(e.min_format, 10);
        assert_eq!(e.max_format, 20);
        assert_eq!(e.formats.min_inclusive, 10);
        assert_eq!(e.formats.max_inclusive, 20);
    }
}
