//! Host document boundary.
//!
//! The note engine never owns the document tree. It reads and writes marker
//! elements through [`MarkerDom`] and talks to the surrounding editor through
//! [`EditorApi`]. Both are implemented by the host (and by the in-memory
//! document used in tests).

use crate::ids::{BlockId, ElementId, HolderId, NoteId, PanelRef};
use crate::range::CharIdx;

/// Attribute identifying which tune owns a marker element.
pub const ATTR_TUNE: &str = "data-tune";
/// Attribute carrying the note id on a marker element.
pub const ATTR_ID: &str = "data-id";
/// `data-tune` value of footnote markers.
pub const FOOTNOTES_TUNE: &str = "footnotes";

/// Subtree to query for marker elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
	/// Every block in the holder.
	Holder,
	/// A single block's content.
	Block(BlockId),
}

/// Read/write access to marker elements inside a holder.
pub trait MarkerDom {
	/// Returns connected `sup` elements whose `data-tune` equals `tune`, in document order.
	fn query_markers(&self, scope: Scope, tune: &str) -> Vec<ElementId>;

	/// Creates an empty `sup` element at `at` and returns it.
	///
	/// Returns `None` if the position is outside every block.
	fn insert_marker(&mut self, at: CharIdx) -> Option<ElementId>;

	fn attribute(&self, element: ElementId, name: &str) -> Option<String>;

	fn set_attribute(&mut self, element: ElementId, name: &str, value: &str);

	/// Returns the element's text content.
	fn text(&self, element: ElementId) -> Option<String>;

	fn set_text(&mut self, element: ElementId, text: &str);

	/// Returns the element's start offset, or `None` if it is not connected.
	fn offset(&self, element: ElementId) -> Option<CharIdx>;

	/// Returns the block containing the element.
	fn block_of(&self, element: ElementId) -> Option<BlockId>;

	/// Returns the block containing a text position.
	fn block_at(&self, at: CharIdx) -> Option<BlockId>;

	fn is_connected(&self, element: ElementId) -> bool {
		self.offset(element).is_some()
	}

	/// Detaches the element from the document.
	fn remove_element(&mut self, element: ElementId);

	/// Attaches a click listener that opens `panel`.
	///
	/// Like the DOM, adding the same listener twice yields two registrations, so
	/// callers remove before adding.
	fn add_click_listener(&mut self, element: ElementId, panel: PanelRef);

	/// Removes one click listener for `panel`; no-op if none is attached.
	fn remove_click_listener(&mut self, element: ElementId, panel: PanelRef);
}

/// The slice of the host editor API the note engine depends on.
pub trait EditorApi {
	/// Resolves the holder this document is attached to.
	///
	/// `None` while the content is not yet mounted inside a holder.
	fn holder_id(&self) -> Option<HolderId>;

	/// Current number of blocks in the editor.
	fn blocks_count(&self) -> usize;

	/// Closes the block settings menu (invoked after a note is inserted).
	fn close_block_settings(&mut self);

	/// Asks the panel to open for a note.
	fn open_panel(&mut self, panel: PanelRef, note: &NoteId);
}
