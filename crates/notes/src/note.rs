//! A single footnote: stable identity bound to one marker element.

use marginalia_primitives::dom::{ATTR_ID, ATTR_TUNE, FOOTNOTES_TUNE};
use marginalia_primitives::{CharIdx, ElementId, MarkerDom, NoteId, PanelRef, Range};

use crate::records::NoteData;

/// Class applied to every marker element.
pub const MARKER_CLASS: &str = "ej-fn-sup";

/// Marker text shown before the first index render.
const UNINDEXED_TEXT: &str = "*";

/// A footnote.
///
/// `index` is a derived display value; identity is `id`. The index is a plain
/// field, and [`Note::render_index`] is the separate step that writes it to
/// the marker element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
	id: NoteId,
	content: String,
	index: usize,
	anchor: CharIdx,
	element: ElementId,
	panel: PanelRef,
}

impl Note {
	/// Creates a note by inserting a new marker at the end of `range`.
	///
	/// Returns `None` if the host cannot place a marker there.
	pub fn insert(
		dom: &mut impl MarkerDom,
		range: Range,
		panel: PanelRef,
		id: Option<NoteId>,
	) -> Option<Self> {
		let anchor = range.collapse(false).to();
		let element = dom.insert_marker(anchor)?;
		Some(Self::bind(dom, element, anchor, panel, id))
	}

	/// Creates a note for a marker element that is already in the document.
	pub fn hydrate(
		dom: &mut impl MarkerDom,
		element: ElementId,
		panel: PanelRef,
		id: Option<NoteId>,
	) -> Self {
		let anchor = dom.offset(element).unwrap_or_default();
		Self::bind(dom, element, anchor, panel, id)
	}

	fn bind(
		dom: &mut impl MarkerDom,
		element: ElementId,
		anchor: CharIdx,
		panel: PanelRef,
		id: Option<NoteId>,
	) -> Self {
		let note = Self {
			id: id.unwrap_or_else(NoteId::generate),
			content: String::new(),
			index: 0,
			anchor,
			element,
			panel,
		};
		note.stamp(dom);
		dom.set_text(element, UNINDEXED_TEXT);
		note.listen_to_clicks(dom);
		note
	}

	fn stamp(&self, dom: &mut impl MarkerDom) {
		dom.set_attribute(self.element, ATTR_TUNE, FOOTNOTES_TUNE);
		dom.set_attribute(self.element, ATTR_ID, self.id.as_str());
		dom.set_attribute(self.element, "contenteditable", "false");
		dom.set_attribute(self.element, "class", MARKER_CLASS);
	}

	pub fn id(&self) -> &NoteId {
		&self.id
	}

	pub fn content(&self) -> &str {
		&self.content
	}

	pub fn set_content(&mut self, content: impl Into<String>) {
		self.content = content.into();
	}

	pub fn index(&self) -> usize {
		self.index
	}

	/// Stores a new ordinal. Returns true if it changed.
	pub fn set_index(&mut self, index: usize) -> bool {
		let changed = self.index != index;
		self.index = index;
		changed
	}

	/// Text the marker should show for the current index.
	pub fn ordinal_text(&self) -> String {
		if self.index == 0 {
			UNINDEXED_TEXT.to_string()
		} else {
			self.index.to_string()
		}
	}

	/// Writes the stored index to the marker element.
	pub fn render_index(&self, dom: &mut impl MarkerDom) {
		dom.set_text(self.element, &self.ordinal_text());
	}

	/// Position used at creation time to place the marker.
	pub fn anchor(&self) -> CharIdx {
		self.anchor
	}

	/// Live position of the marker, falling back to the anchor when detached.
	pub fn position(&self, dom: &impl MarkerDom) -> CharIdx {
		dom.offset(self.element).unwrap_or(self.anchor)
	}

	pub fn element(&self) -> ElementId {
		self.element
	}

	pub fn panel(&self) -> PanelRef {
		self.panel
	}

	/// (Re)binds the click listener, never leaving two behind.
	pub fn listen_to_clicks(&self, dom: &mut impl MarkerDom) {
		dom.remove_click_listener(self.element, self.panel);
		dom.add_click_listener(self.element, self.panel);
	}

	/// Points the note at another panel, detaching the old listener first.
	pub fn update_panel(&mut self, dom: &mut impl MarkerDom, panel: PanelRef) {
		if self.panel == panel {
			return;
		}
		dom.remove_click_listener(self.element, self.panel);
		self.panel = panel;
	}

	/// Binds the note to a replacement marker element carrying its id.
	pub fn rebind(&mut self, dom: &mut impl MarkerDom, element: ElementId) {
		if self.element == element {
			return;
		}
		dom.remove_click_listener(self.element, self.panel);
		self.element = element;
		self.anchor = dom.offset(element).unwrap_or(self.anchor);
		self.stamp(dom);
	}

	/// Removes the marker element from the document.
	pub fn remove(&self, dom: &mut impl MarkerDom) {
		dom.remove_element(self.element);
	}

	pub fn save(&self) -> NoteData {
		NoteData {
			id: self.id.clone(),
			content: self.content.clone(),
			superscript: self.index,
		}
	}
}
