//! Message Model
//!
//! Messages are shared mutable records: status and content are written
//! by different concurrent actors (e.g., a streaming generator and a
//! delivery tracker), so updates are expressed as partial merges.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    /// Free-form key/value map, merged key-by-key on update
    pub metadata: Map<String, Value>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Single-key metadata patch
///
/// Merge semantics are a shallow union: the patched key is overwritten
/// with the new value, every other key is left untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataPatch {
    pub key: String,
    pub value: Value,
}

impl MetadataPatch {
    /// Apply this patch to an existing metadata map
    pub fn apply(&self, metadata: &mut Map<String, Value>) {
        metadata.insert(self.key.clone(), self.value.clone());
    }
}

/// Partial update for a message
///
/// Any subset of fields may be supplied; absent fields are not touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataPatch>,
}

impl MergePatch {
    /// True when the patch carries no update at all
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.metadata.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_patch_overwrites_only_its_key() {
        let mut metadata = Map::new();
        metadata.insert("status".to_string(), json!("pending"));
        metadata.insert("tokens".to_string(), json!(17));

        let patch = MetadataPatch {
            key: "status".to_string(),
            value: json!("streaming"),
        };
        patch.apply(&mut metadata);

        assert_eq!(metadata.get("status"), Some(&json!("streaming")));
        assert_eq!(metadata.get("tokens"), Some(&json!(17)));
        assert_eq!(metadata.len(), 2);
    }

    #[test]
    fn test_metadata_patch_inserts_missing_key() {
        let mut metadata = Map::new();
        let patch = MetadataPatch {
            key: "status".to_string(),
            value: json!("complete"),
        };
        patch.apply(&mut metadata);
        assert_eq!(metadata.get("status"), Some(&json!("complete")));
    }

    #[test]
    fn test_merge_patch_is_empty() {
        assert!(MergePatch::default().is_empty());
        assert!(
            !MergePatch {
                content: Some("hello".to_string()),
                metadata: None,
            }
            .is_empty()
        );
        assert!(
            !MergePatch {
                content: None,
                metadata: Some(MetadataPatch {
                    key: "status".to_string(),
                    value: json!("done"),
                }),
            }
            .is_empty()
        );
    }

    #[test]
    fn test_merge_patch_deserialize_partial() {
        let patch: MergePatch = serde_json::from_str(r#"{"content":"hi"}"#).unwrap();
        assert_eq!(patch.content.as_deref(), Some("hi"));
        assert!(patch.metadata.is_none());

        let patch: MergePatch =
            serde_json::from_str(r#"{"metadata":{"key":"status","value":"sent"}}"#).unwrap();
        assert!(patch.content.is_none());
        assert_eq!(patch.metadata.unwrap().key, "status");

        let patch: MergePatch = serde_json::from_str("{}").unwrap();
        assert!(patch.is_empty());
    }
}
