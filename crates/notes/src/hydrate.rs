//! Builds notes for a block from its persisted records and current markers.

use std::collections::HashSet;

use marginalia_primitives::dom::{ATTR_ID, FOOTNOTES_TUNE};
use marginalia_primitives::{BlockId, ElementId, MarkerDom, NoteId, PanelRef, Scope};

use crate::note::Note;
use crate::records::NoteData;
use crate::registry::{NoteRegistry, ReindexReport};

/// Where a hydrated note's id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSource {
	/// A record whose id matches the marker's `data-id`.
	RecordById,
	/// The record at the marker's position in the block.
	RecordByPosition,
	/// A note already in the registry under the marker's id.
	Registry,
	/// The marker's own `data-id`.
	Marker,
	Fresh,
}

/// Outcome of hydrating one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HydrateReport {
	/// Id source per marker, in block order.
	pub sources: Vec<IdSource>,
	pub reindex: ReindexReport,
}

impl HydrateReport {
	pub fn count(&self, source: IdSource) -> usize {
		self.sources.iter().filter(|s| **s == source).count()
	}
}

/// Pairs every marker in `block` with a note and registers it.
///
/// Content and index are seeded from a note already registered under the
/// resolved id, so live edits survive a re-render; records only fill in for
/// ids the registry has never seen.
pub fn hydrate_block(
	registry: &mut NoteRegistry,
	dom: &mut impl MarkerDom,
	block: BlockId,
	records: &[NoteData],
) -> HydrateReport {
	let markers = dom.query_markers(Scope::Block(block), FOOTNOTES_TUNE);
	let marker_ids: Vec<Option<String>> = markers
		.iter()
		.map(|&element| dom.attribute(element, ATTR_ID).filter(|id| !id.is_empty()))
		.collect();
	let mut used: HashSet<NoteId> = HashSet::with_capacity(markers.len());
	let mut report = HydrateReport::default();

	for (i, &element) in markers.iter().enumerate() {
		let own = marker_ids[i].as_deref();
		let available =
			|id: &str| !id.is_empty() && !used.contains(id) && !live_elsewhere(registry, &*dom, id, element);

		let by_id = own
			.and_then(|id| records.iter().find(|record| record.id.as_str() == id))
			.filter(|record| available(record.id.as_str()))
			.map(|record| (record, IdSource::RecordById));
		let by_position = || {
			records
				.get(i)
				.filter(|record| {
					let id = record.id.as_str();
					available(id)
						&& !marker_ids
							.iter()
							.enumerate()
							.any(|(j, other)| j != i && other.as_deref() == Some(id))
				})
				.map(|record| (record, IdSource::RecordByPosition))
		};
		let record = by_id.or_else(by_position);

		let (id, source) = match (record, own) {
			(Some((record, source)), _) => (record.id.clone(), source),
			(None, Some(id)) if available(id) && registry.contains(id) => (NoteId::new(id), IdSource::Registry),
			(None, Some(id)) if available(id) => (NoteId::new(id), IdSource::Marker),
			(None, _) => (registry.fresh_id(), IdSource::Fresh),
		};

		let (content, index) = match (registry.get(id.as_str()), record) {
			(Some(prior), _) => (prior.content().to_string(), prior.index()),
			(None, Some((record, _))) => (record.content.clone(), record.superscript),
			(None, None) => (String::new(), 0),
		};

		let mut note = Note::hydrate(dom, element, PanelRef(block), Some(id.clone()));
		note.set_content(content);
		note.set_index(index);
		registry.insert(&*dom, note);
		tracing::trace!(?block, ?element, id = %id, ?source, "notes.hydrate.marker");
		used.insert(id);
		report.sources.push(source);
	}

	report.reindex = registry.reindex(dom);
	tracing::debug!(
		holder = %registry.holder(),
		?block,
		markers = markers.len(),
		records = records.len(),
		fresh = report.count(IdSource::Fresh),
		"notes.hydrate"
	);
	report
}

/// True if a registered note with `id` is bound to another connected marker.
fn live_elsewhere(registry: &NoteRegistry, dom: &impl MarkerDom, id: &str, element: ElementId) -> bool {
	registry
		.get(id)
		.is_some_and(|note| note.element() != element && dom.is_connected(note.element()))
}

#[cfg(test)]
mod tests {
	use marginalia_document::Document;
	use marginalia_primitives::HolderId;
	use pretty_assertions::assert_eq;

	use super::*;

	fn record(id: &str, content: &str, superscript: usize) -> NoteData {
		NoteData {
			id: NoteId::new(id),
			content: content.to_string(),
			superscript,
		}
	}

	fn registry() -> NoteRegistry {
		NoteRegistry::new(HolderId("editor".into()))
	}

	fn contents(reg: &NoteRegistry) -> Vec<(String, String, usize)> {
		reg.iter()
			.map(|note| (note.id().to_string(), note.content().to_string(), note.index()))
			.collect()
	}

	#[test]
	fn test_records_pair_by_id_then_position() {
		let mut doc = Document::attached("editor");
		let block = doc.push_block("a[^y]b[^]c");
		let mut reg = registry();
		let records = [record("x", "first", 1), record("y", "second", 2)];

		let report = hydrate_block(&mut reg, &mut doc, block, &records);
		assert_eq!(report.sources, vec![IdSource::RecordById, IdSource::Fresh]);
		assert_eq!(contents(&reg)[0], ("y".into(), "second".into(), 1));
		assert_eq!(contents(&reg)[1].1, "");
		assert_eq!(doc.render(), "a[1]b[2]c");
	}

	#[test]
	fn test_positional_record_fills_unmarked_markers() {
		let mut doc = Document::attached("editor");
		let block = doc.push_block("one[^]two[^]");
		let mut reg = registry();
		let records = [record("p", "alpha", 1), record("q", "beta", 2)];

		let report = hydrate_block(&mut reg, &mut doc, block, &records);
		assert_eq!(report.count(IdSource::RecordByPosition), 2);
		assert_eq!(
			contents(&reg),
			vec![("p".into(), "alpha".into(), 1), ("q".into(), "beta".into(), 2)]
		);
		let markers = doc.query_markers(Scope::Block(block), FOOTNOTES_TUNE);
		assert_eq!(doc.attribute(markers[1], ATTR_ID).as_deref(), Some("q"));
	}

	#[test]
	fn test_positional_record_skips_id_claimed_by_other_marker() {
		let mut doc = Document::attached("editor");
		let block = doc.push_block("[^]x[^p]");
		let mut reg = registry();
		let records = [record("p", "alpha", 1)];

		let report = hydrate_block(&mut reg, &mut doc, block, &records);
		assert_eq!(report.sources, vec![IdSource::Fresh, IdSource::RecordById]);
		assert_eq!(reg.get("p").unwrap().content(), "alpha");
	}

	#[test]
	fn test_prior_note_content_wins_over_record() {
		let mut doc = Document::attached("editor");
		let block = doc.push_block("text[^n]");
		let mut reg = registry();
		hydrate_block(&mut reg, &mut doc, block, &[record("n", "saved", 1)]);
		reg.get_mut("n").unwrap().set_content("edited");

		hydrate_block(&mut reg, &mut doc, block, &[record("n", "saved", 1)]);
		assert_eq!(reg.len(), 1);
		assert_eq!(reg.get("n").unwrap().content(), "edited");
	}

	#[test]
	fn test_marker_id_kept_without_records() {
		let mut doc = Document::attached("editor");
		let block = doc.push_block("a[^keep]");
		let mut reg = registry();
		let report = hydrate_block(&mut reg, &mut doc, block, &[]);
		assert_eq!(report.sources, vec![IdSource::Marker]);
		assert!(reg.contains("keep"));
	}

	#[test]
	fn test_copied_marker_gets_fresh_id() {
		let mut doc = Document::attached("editor");
		let first = doc.push_block("a[^dup]");
		let second = doc.push_block("b[^dup]");
		let mut reg = registry();
		hydrate_block(&mut reg, &mut doc, first, &[record("dup", "body", 1)]);

		let report = hydrate_block(&mut reg, &mut doc, second, &[]);
		assert_eq!(report.sources, vec![IdSource::Fresh]);
		assert_eq!(reg.len(), 2);
		assert_eq!(reg.get("dup").unwrap().content(), "body");
		assert_eq!(doc.render(), "a[1]\nb[2]");
	}

	#[test]
	fn test_duplicate_ids_within_block() {
		let mut doc = Document::attached("editor");
		let block = doc.push_block("[^d]x[^d]");
		let mut reg = registry();
		let report = hydrate_block(&mut reg, &mut doc, block, &[]);
		assert_eq!(report.sources, vec![IdSource::Marker, IdSource::Fresh]);
		assert_eq!(reg.len(), 2);
	}
}
