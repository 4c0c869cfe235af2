//! Write-record extraction from tool output.
//!
//! Document-producing tools report the generated artifact in their output
//! JSON. Newer servers emit a structured record with a `write_id` field;
//! older ones embed the identifier in a nested object or a raw string, so
//! extraction falls back to inspecting the output for an embedded id. Shared
//! by the live interpreter and the history replay path.

use carrel_types::WriteArtifact;
use serde_json::Value;

/// Try to extract a generated-document record from tool output.
///
/// Returns `None` when the output carries no resolvable write identifier,
/// which is how non-document tools are recognized.
pub fn extract_write(output: &Value) -> Option<WriteArtifact> {
    let write_id = embedded_write_id(output)?;

    // Field lookups tolerate both the flat record and a nested `write` object.
    let record = output.get("write").unwrap_or(output);
    Some(WriteArtifact {
        write_id,
        title: record
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        kind: record
            .get("type")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        size: record.get("size").and_then(|v| v.as_u64()),
    })
}

/// Locate a write identifier anywhere the known output shapes put one.
pub fn embedded_write_id(output: &Value) -> Option<String> {
    if let Some(id) = output.get("write_id").and_then(|v| v.as_str()) {
        return Some(id.to_string());
    }
    if let Some(id) = output
        .get("write")
        .and_then(|w| w.get("write_id"))
        .and_then(|v| v.as_str())
    {
        return Some(id.to_string());
    }
    // Backward compat: older servers return a raw string like
    // "Saved document write:<id>".
    if let Some(text) = output.as_str() {
        if let Some(pos) = text.find("write:") {
            let id: String = text[pos + "write:".len()..]
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                .collect();
            if !id.is_empty() {
                return Some(id);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_flat_record() {
        let output = json!({"write_id": "w1", "title": "Plan", "type": "note", "size": 240});
        let write = extract_write(&output).unwrap();

        assert_eq!(write.write_id, "w1");
        assert_eq!(write.title, "Plan");
        assert_eq!(write.kind.as_deref(), Some("note"));
        assert_eq!(write.size, Some(240));
    }

    #[test]
    fn test_extract_nested_record() {
        let output = json!({"status": "ok", "write": {"write_id": "w2", "title": "Report"}});
        let write = extract_write(&output).unwrap();

        assert_eq!(write.write_id, "w2");
        assert_eq!(write.title, "Report");
        assert!(write.size.is_none());
    }

    #[test]
    fn test_extract_embedded_id_from_raw_string() {
        let output = json!("Saved document write:abc-123 to notebook");
        let write = extract_write(&output).unwrap();

        assert_eq!(write.write_id, "abc-123");
        assert!(write.title.is_empty());
    }

    #[test]
    fn test_non_document_output_is_none() {
        assert!(extract_write(&json!({"hits": 3})).is_none());
        assert!(extract_write(&json!("plain text output")).is_none());
        assert!(extract_write(&Value::Null).is_none());
    }

    #[test]
    fn test_embedded_id_stops_at_delimiter() {
        assert_eq!(
            embedded_write_id(&json!("ok write:w_9.tail")),
            Some("w_9".to_string())
        );
    }
}
