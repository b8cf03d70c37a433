//! Full rebuild of note identities from the holder's current markers.

use std::collections::HashSet;

use marginalia_primitives::dom::{ATTR_ID, FOOTNOTES_TUNE};
use marginalia_primitives::{ElementId, MarkerDom, NoteId, PanelRef, Scope};

use crate::note::Note;
use crate::registry::{NoteRegistry, ReindexReport};

/// Outcome of a rehydrate pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RehydrateReport {
	/// Markers already bound to their note.
	pub kept: usize,
	/// Notes moved onto a replacement marker element.
	pub rebound: usize,
	/// Notes created for markers with an unknown or already claimed id.
	pub synthesized: usize,
	pub reindex: ReindexReport,
}

/// Re-pairs every marker in the holder with a note, then reindexes.
///
/// A marker keeps its note when the note is already bound to it. Otherwise
/// the first marker carrying a known, unclaimed id takes that note over
/// (content is kept). Markers left over get a fresh note with an empty body.
pub(crate) fn rehydrate(registry: &mut NoteRegistry, dom: &mut impl MarkerDom) -> RehydrateReport {
	let markers = dom.query_markers(Scope::Holder, FOOTNOTES_TUNE);
	let mut report = RehydrateReport::default();
	let mut claimed: HashSet<NoteId> = HashSet::with_capacity(markers.len());
	let mut unpaired: Vec<ElementId> = Vec::new();

	for &element in &markers {
		let bound = dom
			.attribute(element, ATTR_ID)
			.and_then(|id| registry.get(&id))
			.filter(|note| note.element() == element)
			.map(|note| note.id().clone());
		match bound {
			Some(id) => {
				claimed.insert(id);
				report.kept += 1;
			}
			None => unpaired.push(element),
		}
	}

	for element in unpaired {
		let Some(block) = dom.block_of(element) else {
			continue;
		};
		let known = dom
			.attribute(element, ATTR_ID)
			.filter(|id| !id.is_empty() && !claimed.contains(id.as_str()) && registry.contains(id));
		if let Some(id) = known
			&& let Some(note) = registry.get_mut(&id)
		{
			note.rebind(dom, element);
			claimed.insert(note.id().clone());
			report.rebound += 1;
			continue;
		}
		let id = registry.fresh_id();
		tracing::trace!(?element, id = %id, "notes.rehydrate.synthesize");
		let note = Note::hydrate(dom, element, PanelRef(block), Some(id.clone()));
		registry.insert(&*dom, note);
		claimed.insert(id);
		report.synthesized += 1;
	}

	for &element in &markers {
		let (Some(block), Some(id)) = (dom.block_of(element), dom.attribute(element, ATTR_ID)) else {
			continue;
		};
		if let Some(note) = registry.get_mut(&id)
			&& note.element() == element
		{
			note.update_panel(dom, PanelRef(block));
			note.listen_to_clicks(dom);
		}
	}

	report.reindex = registry.reindex(dom);
	tracing::debug!(
		holder = %registry.holder(),
		kept = report.kept,
		rebound = report.rebound,
		synthesized = report.synthesized,
		"notes.rehydrate"
	);
	report
}
