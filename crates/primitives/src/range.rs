/// A position in the flattened document text, measured in characters (not bytes).
///
/// Blocks are joined by a single virtual separator, so the end of one block and
/// the start of the next are distinct offsets.
pub type CharIdx = usize;

/// A text range defined by anchor and head positions, as produced by a selection.
///
/// The anchor is the fixed end, and the head moves while the selection is extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
	/// The fixed end of the range.
	pub anchor: CharIdx,
	/// The moving end of the range (cursor position).
	pub head: CharIdx,
}

impl Range {
	/// Creates a new range from anchor to head.
	pub fn new(anchor: CharIdx, head: CharIdx) -> Self {
		Self { anchor, head }
	}

	/// Creates a zero-width range (caret) at the given position.
	pub fn point(pos: CharIdx) -> Self {
		Self::new(pos, pos)
	}

	/// Returns the start of the range regardless of direction.
	#[inline]
	pub fn from(&self) -> CharIdx {
		std::cmp::min(self.anchor, self.head)
	}

	/// Returns the end of the range regardless of direction.
	#[inline]
	pub fn to(&self) -> CharIdx {
		std::cmp::max(self.anchor, self.head)
	}

	/// Collapses the range to one of its boundary points.
	///
	/// Collapsing to the end is how a note marker is placed after the selected text.
	pub fn collapse(self, to_start: bool) -> Self {
		if to_start {
			Self::point(self.from())
		} else {
			Self::point(self.to())
		}
	}
}

impl Default for Range {
	fn default() -> Self {
		Self::point(0)
	}
}
