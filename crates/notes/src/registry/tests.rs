use marginalia_document::Document;
use marginalia_primitives::{FOOTNOTES_TUNE, HolderId, MarkerDom, NoteId, PanelRef, Range, Scope};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

fn setup(markup: &str) -> (Document, PanelRef, NoteRegistry) {
	let mut doc = Document::attached("editor");
	let block = doc.push_block(markup);
	(doc, PanelRef(block), NoteRegistry::new(HolderId("editor".into())))
}

fn add(doc: &mut Document, reg: &mut NoteRegistry, panel: PanelRef, at: usize, id: &str) -> usize {
	let note = Note::insert(doc, Range::point(at), panel, Some(NoteId::new(id))).unwrap();
	reg.insert(doc, note)
}

fn order(reg: &NoteRegistry) -> Vec<&str> {
	reg.iter().map(|note| note.id().as_str()).collect()
}

#[test]
fn test_insert_orders_by_position_not_call_order() {
	let (mut doc, panel, mut reg) = setup(&"x".repeat(25));
	add(&mut doc, &mut reg, panel, 10, "A");
	add(&mut doc, &mut reg, panel, 5, "B");
	add(&mut doc, &mut reg, panel, 20, "C");
	assert_eq!(order(&reg), vec!["B", "A", "C"]);

	reg.reindex(&mut doc);
	assert_eq!(reg.get("B").unwrap().index(), 1);
	assert_eq!(reg.get("A").unwrap().index(), 2);
	assert_eq!(reg.get("C").unwrap().index(), 3);
}

#[test]
fn test_insert_before_all_goes_first() {
	let (mut doc, panel, mut reg) = setup(&"x".repeat(10));
	add(&mut doc, &mut reg, panel, 4, "a");
	add(&mut doc, &mut reg, panel, 8, "b");
	assert_eq!(add(&mut doc, &mut reg, panel, 0, "first"), 0);
	assert_eq!(order(&reg), vec!["first", "a", "b"]);
}

#[test]
fn test_ties_sort_newest_last() {
	let (mut doc, panel, mut reg) = setup("abcdef");
	add(&mut doc, &mut reg, panel, 3, "old");
	add(&mut doc, &mut reg, panel, 3, "new");
	assert_eq!(order(&reg), vec!["old", "new"]);
	assert_eq!(
		reg.iter().map(Note::element).collect::<Vec<_>>(),
		doc.query_markers(Scope::Holder, FOOTNOTES_TUNE)
	);
}

#[test]
fn test_insert_replaces_same_id() {
	let (mut doc, panel, mut reg) = setup("abcdef");
	add(&mut doc, &mut reg, panel, 1, "dup");
	add(&mut doc, &mut reg, panel, 4, "dup");
	assert_eq!(reg.len(), 1);
	assert_eq!(reg.get("dup").unwrap().anchor(), 4);
}

#[test]
fn test_remove_unknown_is_noop() {
	let (mut doc, panel, mut reg) = setup("abc");
	add(&mut doc, &mut reg, panel, 1, "a");
	assert!(reg.remove("missing").is_none());
	assert_eq!(reg.len(), 1);
	assert!(reg.remove("a").is_some());
	assert!(reg.is_empty());
}

#[test]
fn test_removing_marker_leaves_contiguous_indices() {
	let (mut doc, panel, mut reg) = setup(&"x".repeat(10));
	for (i, id) in ["a", "b", "c", "d"].iter().enumerate() {
		add(&mut doc, &mut reg, panel, i * 2, id);
	}
	reg.reindex(&mut doc);
	reg.get("b").unwrap().remove(&mut doc);

	let report = reg.reindex(&mut doc);
	assert_eq!(report.markers, 3);
	assert_eq!(reg.get("a").unwrap().index(), 1);
	assert_eq!(reg.get("c").unwrap().index(), 2);
	assert_eq!(reg.get("d").unwrap().index(), 3);
	// Stale entry is retained but sorted last and excluded from save.
	assert_eq!(order(&reg), vec!["a", "c", "d", "b"]);
	let saved: Vec<_> = reg.save(&doc, Scope::Holder).into_iter().map(|d| d.id).collect();
	assert_eq!(saved, vec![NoteId::new("a"), NoteId::new("c"), NoteId::new("d")]);

	assert_eq!(reg.prune_detached(&doc), 1);
	assert!(!reg.contains("b"));
}

#[test]
fn test_save_is_stable_without_mutation() {
	let (mut doc, panel, mut reg) = setup("hello world");
	add(&mut doc, &mut reg, panel, 5, "a");
	add(&mut doc, &mut reg, panel, 11, "b");
	reg.get_mut("a").unwrap().set_content("first");
	reg.reindex(&mut doc);
	let once = reg.save(&doc, Scope::Holder);
	let twice = reg.save(&doc, Scope::Holder);
	assert_eq!(once, twice);
	assert_eq!(once[0].content, "first");
	assert_eq!(once[1].superscript, 2);
}

#[test]
fn test_reindex_follows_document_moves() {
	let mut doc = Document::attached("editor");
	let first = doc.push_block("one");
	let second = doc.push_block("two");
	let mut reg = NoteRegistry::new(HolderId("editor".into()));
	let a = Note::insert(&mut doc, Range::point(3), PanelRef(first), Some("a".into())).unwrap();
	reg.insert(&doc, a);
	let b = Note::insert(&mut doc, Range::point(7), PanelRef(second), Some("b".into())).unwrap();
	reg.insert(&doc, b);
	reg.reindex(&mut doc);
	assert_eq!(doc.render(), "one[1]\ntwo[2]");

	doc.move_block(1, 0);
	let report = reg.reindex(&mut doc);
	assert_eq!(report.changed, 2);
	assert_eq!(order(&reg), vec!["b", "a"]);
	assert_eq!(doc.render(), "two[1]\none[2]");
}

#[test]
fn test_reindex_counts_orphans_and_renders_them() {
	let (mut doc, panel, mut reg) = setup("a[^stray]b");
	add(&mut doc, &mut reg, panel, 2, "known");
	let report = reg.reindex(&mut doc);
	assert_eq!(report.orphans, 1);
	assert_eq!(reg.get("known").unwrap().index(), 2);
	assert_eq!(doc.render(), "a[1]b[2]");
}

#[test]
fn test_filter_present_follows_candidate_order() {
	let (mut doc, panel, mut reg) = setup("abcdef");
	add(&mut doc, &mut reg, panel, 1, "a");
	add(&mut doc, &mut reg, panel, 3, "b");
	let elements: Vec<_> = reg.iter().map(Note::element).collect();
	let present = reg.filter_present(&[elements[1], ElementId(999), elements[0], elements[1]]);
	let ids: Vec<_> = present.iter().map(|note| note.id().as_str()).collect();
	assert_eq!(ids, vec!["b", "a"]);
}

#[test]
fn test_fresh_id_is_unused() {
	let (mut doc, panel, mut reg) = setup("abc");
	let id = reg.fresh_id();
	add(&mut doc, &mut reg, panel, 1, id.as_str());
	assert_ne!(reg.fresh_id(), id);
}

proptest! {
	#[test]
	fn prop_reindex_assigns_one_to_n_in_document_order(
		positions in proptest::collection::vec(0usize..40, 1..12)
	) {
		let (mut doc, panel, mut reg) = setup(&"x".repeat(40));
		for pos in &positions {
			let note = Note::insert(&mut doc, Range::point(*pos), panel, Some(reg.fresh_id())).unwrap();
			reg.insert(&doc, note);
		}
		let scanned = doc.query_markers(Scope::Holder, FOOTNOTES_TUNE);
		prop_assert_eq!(reg.iter().map(Note::element).collect::<Vec<_>>(), scanned);

		reg.reindex(&mut doc);
		let indices: Vec<usize> = reg.iter().map(Note::index).collect();
		prop_assert_eq!(indices, (1..=positions.len()).collect::<Vec<_>>());
	}
}
