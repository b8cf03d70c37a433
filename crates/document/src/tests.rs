use marginalia_primitives::{EditorApi, FOOTNOTES_TUNE, MarkerDom, NodeName, PanelRef, Scope};
use pretty_assertions::assert_eq;

use crate::Document;

fn markers(doc: &Document) -> Vec<marginalia_primitives::ElementId> {
	doc.query_markers(Scope::Holder, FOOTNOTES_TUNE)
}

#[test]
fn test_offsets_skip_elements_and_separate_blocks() {
	let mut doc = Document::attached("editor");
	doc.push_block("ab[^x]cd");
	doc.push_block("[^y]ef");
	let m = markers(&doc);
	assert_eq!(m.len(), 2);
	assert_eq!(doc.offset(m[0]), Some(2));
	// "abcd" plus the block separator.
	assert_eq!(doc.offset(m[1]), Some(5));
	assert_eq!(doc.block_start(1), 5);
}

#[test]
fn test_insert_marker_splits_text() {
	let mut doc = Document::attached("editor");
	let block = doc.push_block("hello world");
	doc.take_records();

	let el = doc.insert_marker(5).unwrap();
	doc.set_text(el, "1");
	assert_eq!(doc.render_block(block).unwrap(), "hello[1] world");
	assert_eq!(doc.block_of(el), Some(block));

	let records = doc.take_records();
	assert_eq!(records.len(), 1);
	assert_eq!(records[0].added[0].name, NodeName::Sup);
}

#[test]
fn test_insert_marker_after_existing_marker_at_same_offset() {
	let mut doc = Document::attached("editor");
	doc.push_block("ab[^first]cd");
	let second = doc.insert_marker(2).unwrap();
	doc.set_attribute(second, "data-tune", FOOTNOTES_TUNE);
	let m = markers(&doc);
	assert_eq!(m.len(), 2);
	assert_eq!(m[1], second);
}

#[test]
fn test_insert_marker_out_of_range() {
	let mut doc = Document::attached("editor");
	doc.push_block("abc");
	assert_eq!(doc.insert_marker(10), None);
}

#[test]
fn test_delete_range_detaches_markers() {
	let mut doc = Document::attached("editor");
	let block = doc.push_block("one[^a] two[^b] three");
	doc.take_records();
	let m = markers(&doc);

	assert!(doc.delete_range(3, 7));
	assert!(!doc.is_connected(m[0]));
	assert!(doc.is_connected(m[1]));
	assert_eq!(doc.render_block(block).unwrap(), "one[*] three");

	let records = doc.take_records();
	let removed: Vec<_> = records[0].removed.iter().filter(|n| n.is_marker(FOOTNOTES_TUNE)).collect();
	assert_eq!(removed.len(), 1);
	assert_eq!(removed[0].id.as_deref(), Some("a"));
}

#[test]
fn test_merge_blocks_copies_markers() {
	let mut doc = Document::attached("editor");
	doc.push_block("first[^a]");
	doc.push_block("second[^b]");
	let before = markers(&doc);
	doc.take_records();

	assert!(doc.merge_blocks(0));
	assert_eq!(doc.blocks_count(), 1);
	let after = markers(&doc);
	assert_eq!(after.len(), 2);
	assert_eq!(after[0], before[0]);
	assert_ne!(after[1], before[1]);
	assert!(!doc.is_connected(before[1]));
	assert_eq!(doc.attribute(after[1], "data-id").as_deref(), Some("b"));
	assert_eq!(doc.render(), "first[*]second[*]");
}

#[test]
fn test_move_block_keeps_elements() {
	let mut doc = Document::attached("editor");
	doc.push_block("a[^a]");
	doc.push_block("b[^b]");
	let before = markers(&doc);
	doc.move_block(1, 0);
	assert_eq!(markers(&doc), vec![before[1], before[0]]);
}

#[test]
fn test_click_listeners_accumulate_like_dom() {
	let mut doc = Document::attached("editor");
	let block = doc.push_block("x[^a]");
	let el = markers(&doc)[0];
	let panel = PanelRef(block);
	doc.add_click_listener(el, panel);
	doc.add_click_listener(el, panel);
	assert_eq!(doc.listener_count(el), 2);
	doc.remove_click_listener(el, panel);
	assert_eq!(doc.click(el), vec![panel]);
}

#[test]
fn test_block_scope_query() {
	let mut doc = Document::attached("editor");
	doc.push_block("a[^a]");
	let second = doc.push_block("b[^b][^c]");
	assert_eq!(doc.query_markers(Scope::Block(second), FOOTNOTES_TUNE).len(), 2);
	assert_eq!(doc.block_at(0), doc.block_ids().first().copied());
	assert_eq!(doc.block_at(2), Some(second));
}

#[test]
fn test_unattached_document_has_no_holder() {
	let mut doc = Document::new();
	assert_eq!(doc.holder_id(), None);
	doc.attach("editor");
	assert_eq!(doc.holder_id().map(|h| h.0), Some("editor".to_string()));
}
