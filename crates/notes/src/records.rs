//! Persisted note records.
//!
//! A block persists its notes as an ordered list of [`NoteData`]. Order is
//! significant (document order) and ids are the join key on reload.

use std::collections::HashSet;

use marginalia_primitives::NoteId;
use serde::{Deserialize, Serialize};

use crate::error::RecordsError;

/// One persisted note.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NoteData {
	pub id: NoteId,
	#[serde(default)]
	pub content: String,
	/// Display ordinal at save time.
	#[serde(default)]
	pub superscript: usize,
}

/// A block's persisted notes, in document order.
pub type FootnotesData = Vec<NoteData>;

/// Decodes a record list, rejecting duplicate ids.
pub fn from_json(input: &str) -> Result<FootnotesData, RecordsError> {
	let records: FootnotesData = serde_json::from_str(input)?;
	let mut seen = HashSet::with_capacity(records.len());
	for record in &records {
		if !record.id.is_empty() && !seen.insert(record.id.as_str()) {
			return Err(RecordsError::DuplicateId(record.id.to_string()));
		}
	}
	Ok(records)
}

pub fn to_json(records: &[NoteData]) -> Result<String, RecordsError> {
	Ok(serde_json::to_string(records)?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_decode_fills_defaults() {
		let records = from_json(r#"[{"id":"a"},{"id":"b","content":"x","superscript":2}]"#).unwrap();
		assert_eq!(records[0].content, "");
		assert_eq!(records[0].superscript, 0);
		assert_eq!(records[1].superscript, 2);
	}

	#[test]
	fn test_duplicate_ids_rejected() {
		let err = from_json(r#"[{"id":"a"},{"id":"a"}]"#).unwrap_err();
		assert!(matches!(err, RecordsError::DuplicateId(id) if id == "a"));
	}

	#[test]
	fn test_encode_shape() {
		let json = to_json(&[NoteData {
			id: NoteId::new("a"),
			content: "c".into(),
			superscript: 1,
		}])
		.unwrap();
		assert_eq!(json, r#"[{"id":"a","content":"c","superscript":1}]"#);
	}

	#[test]
	fn test_malformed_json() {
		assert!(matches!(from_json("{"), Err(RecordsError::Json(_))));
	}
}
