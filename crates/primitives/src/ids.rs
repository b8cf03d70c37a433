use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Length of generated note ids, in hex characters.
const NOTE_ID_LEN: usize = 10;

/// Identifier of a document instance (the element carrying the holder attribute).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HolderId(pub String);

impl fmt::Display for HolderId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Identifier of a block inside a holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u64);

/// Node identity of a marker element.
///
/// Two elements with identical attributes (for example a re-rendered copy) have
/// different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// Reference to the floating panel a marker opens when clicked.
///
/// Panels are owned by blocks, so a marker that moves to another block must be
/// re-pointed at that block's panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelRef(pub BlockId);

/// Stable, opaque identity of a note.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
	/// Wraps an existing id, e.g. one read from a `data-id` attribute.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Generates a new random id.
	pub fn generate() -> Self {
		let mut id = uuid::Uuid::new_v4().simple().to_string();
		id.truncate(NOTE_ID_LEN);
		Self(id)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Display for NoteId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl Borrow<str> for NoteId {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl From<&str> for NoteId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}
