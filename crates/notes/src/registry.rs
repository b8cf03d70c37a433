//! Per-holder ordered collection of notes.
//!
//! The registry keeps notes in document order. Insertion places a note by
//! comparing marker positions; [`NoteRegistry::reindex`] re-derives both the
//! order and every display index from a scan of the holder's markers.
//!
//! Entries whose marker has left the document are not removed here. They are
//! excluded from [`NoteRegistry::save`] by the presence filter and pruned with
//! [`NoteRegistry::prune_detached`].

#[cfg(test)]
mod tests;

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use marginalia_primitives::dom::{ATTR_ID, FOOTNOTES_TUNE};
use marginalia_primitives::{ElementId, HolderId, MarkerDom, NoteId, Scope};

use crate::note::Note;
use crate::records::NoteData;

/// Outcome of a reindex scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReindexReport {
	/// Markers scanned.
	pub markers: usize,
	/// Notes whose index changed.
	pub changed: usize,
	/// Markers with no note bound to them.
	pub orphans: usize,
}

/// Notes of one holder, in document order.
#[derive(Debug)]
pub struct NoteRegistry {
	holder: HolderId,
	notes: IndexMap<NoteId, Note>,
}

impl NoteRegistry {
	pub fn new(holder: HolderId) -> Self {
		Self {
			holder,
			notes: IndexMap::new(),
		}
	}

	pub fn holder(&self) -> &HolderId {
		&self.holder
	}

	pub fn len(&self) -> usize {
		self.notes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.notes.is_empty()
	}

	pub fn contains(&self, id: &str) -> bool {
		self.notes.contains_key(id)
	}

	pub fn get(&self, id: &str) -> Option<&Note> {
		self.notes.get(id)
	}

	pub fn get_mut(&mut self, id: &str) -> Option<&mut Note> {
		self.notes.get_mut(id)
	}

	/// Notes in registry order.
	pub fn iter(&self) -> impl Iterator<Item = &Note> {
		self.notes.values()
	}

	pub fn find_by_element(&self, element: ElementId) -> Option<&Note> {
		self.notes.values().find(|note| note.element() == element)
	}

	/// Generates an id no note in this registry uses.
	pub fn fresh_id(&self) -> NoteId {
		loop {
			let id = NoteId::generate();
			if !self.notes.contains_key(&id) {
				return id;
			}
		}
	}

	/// Inserts a note in document order and returns its position.
	///
	/// The note goes before the first note that starts strictly after it, so
	/// among equal positions the newest sorts last. An existing entry with the
	/// same id, or bound to the same element, is replaced.
	pub fn insert(&mut self, dom: &impl MarkerDom, note: Note) -> usize {
		self.notes.shift_remove(note.id());
		let element = note.element();
		self.notes.retain(|_, existing| existing.element() != element);

		let start = note.position(dom);
		let at = self
			.notes
			.values()
			.position(|existing| existing.position(dom) > start)
			.unwrap_or(self.notes.len());
		tracing::trace!(holder = %self.holder, id = %note.id(), at, start, "notes.insert");
		self.notes.shift_insert(at, note.id().clone(), note);
		at
	}

	/// Drops a note. Unknown ids are ignored.
	pub fn remove(&mut self, id: &str) -> Option<Note> {
		self.notes.shift_remove(id)
	}

	/// Recomputes indices from the current document order of the holder's markers.
	///
	/// Every scanned marker shows its ordinal; notes bound to a scanned marker
	/// get that ordinal as their index. Markers without a bound note are
	/// counted as orphans and skipped. Afterwards the registry is sorted into
	/// scan order, with notes whose marker was not found kept last.
	pub fn reindex(&mut self, dom: &mut impl MarkerDom) -> ReindexReport {
		let markers = dom.query_markers(Scope::Holder, FOOTNOTES_TUNE);
		let mut report = ReindexReport {
			markers: markers.len(),
			..Default::default()
		};
		let mut rank: HashMap<NoteId, usize> = HashMap::with_capacity(markers.len());

		for (i, &element) in markers.iter().enumerate() {
			let ordinal = i + 1;
			let bound = dom
				.attribute(element, ATTR_ID)
				.and_then(|id| self.notes.get_mut(id.as_str()))
				.filter(|note| note.element() == element);
			match bound {
				Some(note) => {
					if note.set_index(ordinal) {
						report.changed += 1;
					}
					note.render_index(dom);
					rank.insert(note.id().clone(), i);
				}
				None => {
					report.orphans += 1;
					dom.set_text(element, &ordinal.to_string());
				}
			}
		}

		self.notes.sort_by(|a, _, b, _| {
			let a = rank.get(a).copied().unwrap_or(usize::MAX);
			let b = rank.get(b).copied().unwrap_or(usize::MAX);
			a.cmp(&b)
		});

		tracing::debug!(
			holder = %self.holder,
			markers = report.markers,
			changed = report.changed,
			orphans = report.orphans,
			"notes.reindex"
		);
		report
	}

	/// Notes whose element is among `candidates`, in candidate order.
	pub fn filter_present(&self, candidates: &[ElementId]) -> Vec<&Note> {
		let by_element: HashMap<ElementId, &Note> =
			self.notes.values().map(|note| (note.element(), note)).collect();
		let mut seen = HashSet::with_capacity(candidates.len());
		candidates
			.iter()
			.filter(|element| seen.insert(**element))
			.filter_map(|element| by_element.get(element).copied())
			.collect()
	}

	/// Records for the notes whose markers are present in `scope`, in document order.
	pub fn save(&self, dom: &impl MarkerDom, scope: Scope) -> Vec<NoteData> {
		let candidates = dom.query_markers(scope, FOOTNOTES_TUNE);
		self.filter_present(&candidates)
			.into_iter()
			.map(Note::save)
			.collect()
	}

	/// Drops notes whose marker element is no longer connected.
	pub fn prune_detached(&mut self, dom: &impl MarkerDom) -> usize {
		let before = self.notes.len();
		self.notes.retain(|_, note| dom.is_connected(note.element()));
		let pruned = before - self.notes.len();
		if pruned > 0 {
			tracing::debug!(holder = %self.holder, pruned, "notes.prune");
		}
		pruned
	}
}
