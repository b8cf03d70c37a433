//! Document - an in-memory block tree with inline marker elements.
//!
//! A [`Document`] models the part of a rich-text editor the note engine cares
//! about: an ordered list of blocks, each holding text runs and inline
//! elements. Structural edits are journaled as [`MutationRecord`]s so a host
//! loop can forward them to the engine, the way a mutation observer would.
//!
//! # Offsets
//!
//! Offsets count text characters only; elements are zero-width. Blocks are
//! separated by one virtual character, so every block boundary has two
//! distinct offsets.

use std::collections::BTreeMap;

use marginalia_primitives::dom::{ATTR_ID, ATTR_TUNE, FOOTNOTES_TUNE};
use marginalia_primitives::{
	BlockId, CharIdx, EditorApi, ElementId, HolderId, MarkerDom, MutationRecord, NodeName,
	NodeSummary, NoteId, PanelRef, Scope,
};
use rustc_hash::FxHashMap;

use crate::markup::{Token, tokenize};

/// An inline node inside a block.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Inline {
	Text(String),
	Element(ElementId),
}

#[derive(Debug, Clone)]
struct Block {
	id: BlockId,
	nodes: Vec<Inline>,
}

impl Block {
	fn text_len(&self) -> usize {
		self.nodes
			.iter()
			.map(|node| match node {
				Inline::Text(text) => text.chars().count(),
				Inline::Element(_) => 0,
			})
			.sum()
	}

	/// Merges adjacent text runs and drops empty ones.
	fn normalize(&mut self) {
		let mut nodes: Vec<Inline> = Vec::with_capacity(self.nodes.len());
		for node in self.nodes.drain(..) {
			match node {
				Inline::Text(text) if text.is_empty() => {}
				Inline::Text(text) => {
					if let Some(Inline::Text(prev)) = nodes.last_mut() {
						prev.push_str(&text);
					} else {
						nodes.push(Inline::Text(text));
					}
				}
				node => nodes.push(node),
			}
		}
		self.nodes = nodes;
	}
}

/// Element state. Elements outlive their attachment so detached nodes can
/// still be inspected (and re-attached by a host, as a DOM would allow).
#[derive(Debug, Clone)]
struct Element {
	name: NodeName,
	attrs: BTreeMap<String, String>,
	text: String,
	listeners: Vec<PanelRef>,
	parent: Option<BlockId>,
}

impl Element {
	fn summary(&self, id: ElementId) -> NodeSummary {
		NodeSummary {
			name: self.name.clone(),
			element: Some(id),
			tune: self.attrs.get(ATTR_TUNE).cloned(),
			id: self.attrs.get(ATTR_ID).cloned(),
		}
	}
}

/// An in-memory editor document.
#[derive(Debug, Default)]
pub struct Document {
	holder: Option<HolderId>,
	blocks: Vec<Block>,
	elements: FxHashMap<ElementId, Element>,
	next_element: u64,
	next_block: u64,
	journal: Vec<MutationRecord>,
	settings_open: bool,
	opened_panels: Vec<(PanelRef, NoteId)>,
}

impl Document {
	/// Creates a document that is not yet mounted in a holder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a document mounted in the given holder.
	pub fn attached(holder: impl Into<String>) -> Self {
		let mut doc = Self::new();
		doc.attach(holder);
		doc
	}

	/// Mounts the document inside a holder.
	pub fn attach(&mut self, holder: impl Into<String>) {
		self.holder = Some(HolderId(holder.into()));
	}

	/// Appends a block built from markup and returns its id.
	pub fn push_block(&mut self, markup: &str) -> BlockId {
		self.insert_block(self.blocks.len(), markup)
	}

	/// Inserts a block built from markup at `index`.
	pub fn insert_block(&mut self, index: usize, markup: &str) -> BlockId {
		let id = BlockId(self.next_block);
		self.next_block += 1;
		let nodes = self.build_nodes(id, markup);
		let index = index.min(self.blocks.len());
		self.blocks.insert(index, Block { id, nodes });
		self.journal.push(MutationRecord {
			block: None,
			added: vec![block_summary()],
			removed: Vec::new(),
		});
		id
	}

	/// Removes the block at `index` together with its elements.
	pub fn remove_block(&mut self, index: usize) -> Option<BlockId> {
		if index >= self.blocks.len() {
			return None;
		}
		let block = self.blocks.remove(index);
		self.detach_all(&block.nodes);
		self.journal.push(MutationRecord {
			block: None,
			added: Vec::new(),
			removed: vec![block_summary()],
		});
		Some(block.id)
	}

	/// Moves a block to a new position; its elements keep their identity.
	pub fn move_block(&mut self, from: usize, to: usize) {
		if from >= self.blocks.len() || to >= self.blocks.len() || from == to {
			return;
		}
		let block = self.blocks.remove(from);
		self.blocks.insert(to, block);
		self.journal.push(MutationRecord {
			block: None,
			added: vec![block_summary()],
			removed: vec![block_summary()],
		});
	}

	/// Merges the block after `index` into the block at `index`.
	///
	/// The merged content is re-rendered from markup: marker elements are
	/// replaced by fresh copies carrying the same attributes, and the old
	/// elements are detached.
	pub fn merge_blocks(&mut self, index: usize) -> bool {
		if index + 1 >= self.blocks.len() {
			return false;
		}
		let second = self.blocks.remove(index + 1);
		let target = self.blocks[index].id;
		let mut record = MutationRecord {
			block: Some(target),
			added: Vec::new(),
			removed: vec![block_summary()],
		};
		let mut nodes = Vec::with_capacity(second.nodes.len());
		for node in &second.nodes {
			match node {
				Inline::Text(text) => {
					record.added.push(NodeSummary::text());
					nodes.push(Inline::Text(text.clone()));
				}
				Inline::Element(old) => {
					let Some(source) = self.elements.get(old).cloned() else {
						continue;
					};
					let copy = self.alloc_element(Element {
						listeners: Vec::new(),
						parent: Some(target),
						..source
					});
					if let Some(element) = self.elements.get(&copy) {
						record.added.push(element.summary(copy));
					}
					nodes.push(Inline::Element(copy));
				}
			}
		}
		self.detach_all(&second.nodes);
		let block = &mut self.blocks[index];
		block.nodes.extend(nodes);
		block.normalize();
		self.journal.push(record);
		true
	}

	/// Inserts plain text at an offset.
	pub fn insert_text(&mut self, at: CharIdx, text: &str) -> bool {
		self.insert_markup(at, text)
	}

	/// Inserts markup at an offset, as a paste would.
	///
	/// Markers in the markup become new elements; a marker copied from
	/// elsewhere keeps its `data-id`.
	pub fn insert_markup(&mut self, at: CharIdx, markup: &str) -> bool {
		let Some((index, local)) = self.locate(at) else {
			return false;
		};
		let block_id = self.blocks[index].id;
		let nodes = self.build_nodes(block_id, markup);
		let record = MutationRecord {
			block: Some(block_id),
			added: nodes.iter().map(|node| self.summarize(node)).collect(),
			removed: Vec::new(),
		};
		let block = &mut self.blocks[index];
		let mut insert_at = split_at(block, local);
		for node in nodes {
			block.nodes.insert(insert_at, node);
			insert_at += 1;
		}
		block.normalize();
		if !record.is_empty() {
			self.journal.push(record);
		}
		true
	}

	/// Deletes `[from, to)` within a single block, including any element whose
	/// offset falls inside the range.
	pub fn delete_range(&mut self, from: CharIdx, to: CharIdx) -> bool {
		if from >= to {
			return false;
		}
		let Some((index, local_from)) = self.locate(from) else {
			return false;
		};
		let start = self.block_start(index);
		let block_len = self.blocks[index].text_len();
		if to > start + block_len {
			return false;
		}
		let local_to = to - start;

		let block_id = self.blocks[index].id;
		let mut record = MutationRecord {
			block: Some(block_id),
			..Default::default()
		};
		let mut kept = Vec::new();
		let mut detached = Vec::new();
		let mut pos = 0;
		for node in std::mem::take(&mut self.blocks[index].nodes) {
			match node {
				Inline::Text(text) => {
					let len = text.chars().count();
					let kept_text: String = text
						.chars()
						.enumerate()
						.filter(|(i, _)| pos + i < local_from || pos + i >= local_to)
						.map(|(_, c)| c)
						.collect();
					if kept_text.chars().count() != len {
						record.removed.push(NodeSummary::text());
					}
					kept.push(Inline::Text(kept_text));
					pos += len;
				}
				Inline::Element(id) if pos >= local_from && pos < local_to => detached.push(id),
				node => kept.push(node),
			}
		}
		for id in detached {
			if let Some(element) = self.elements.get_mut(&id) {
				element.parent = None;
				record.removed.push(element.summary(id));
			}
		}
		let block = &mut self.blocks[index];
		block.nodes = kept;
		block.normalize();
		self.journal.push(record);
		true
	}

	/// Drains the mutation journal.
	pub fn take_records(&mut self) -> Vec<MutationRecord> {
		std::mem::take(&mut self.journal)
	}

	pub fn block_ids(&self) -> Vec<BlockId> {
		self.blocks.iter().map(|block| block.id).collect()
	}

	/// Start offset of the block at `index`.
	pub fn block_start(&self, index: usize) -> CharIdx {
		self.blocks[..index.min(self.blocks.len())]
			.iter()
			.map(|block| block.text_len() + 1)
			.sum()
	}

	/// Renders a block as text with markers shown as `[text]`.
	pub fn render_block(&self, block: BlockId) -> Option<String> {
		let block = self.blocks.iter().find(|b| b.id == block)?;
		let mut out = String::new();
		for node in &block.nodes {
			match node {
				Inline::Text(text) => out.push_str(text),
				Inline::Element(id) => {
					let text = self.elements.get(id).map(|e| e.text.as_str()).unwrap_or_default();
					out.push('[');
					out.push_str(text);
					out.push(']');
				}
			}
		}
		Some(out)
	}

	/// Renders every block, one per line.
	pub fn render(&self) -> String {
		self.blocks
			.iter()
			.filter_map(|block| self.render_block(block.id))
			.collect::<Vec<_>>()
			.join("\n")
	}

	/// Simulates a click and returns the panels whose listeners fired.
	pub fn click(&self, element: ElementId) -> Vec<PanelRef> {
		self.elements
			.get(&element)
			.map(|e| e.listeners.clone())
			.unwrap_or_default()
	}

	pub fn listener_count(&self, element: ElementId) -> usize {
		self.elements.get(&element).map_or(0, |e| e.listeners.len())
	}

	/// Opens the block settings menu, as the host toolbar does before a tune runs.
	pub fn open_block_settings(&mut self) {
		self.settings_open = true;
	}

	pub fn settings_open(&self) -> bool {
		self.settings_open
	}

	/// Panel open requests received through [`EditorApi::open_panel`].
	pub fn opened_panels(&self) -> &[(PanelRef, NoteId)] {
		&self.opened_panels
	}

	fn alloc_element(&mut self, element: Element) -> ElementId {
		let id = ElementId(self.next_element);
		self.next_element += 1;
		self.elements.insert(id, element);
		id
	}

	fn build_nodes(&mut self, block: BlockId, markup: &str) -> Vec<Inline> {
		let mut nodes = Vec::new();
		for token in tokenize(markup) {
			match token {
				Token::Text(text) => nodes.push(Inline::Text(text.to_string())),
				Token::Marker(id) => {
					let mut attrs = BTreeMap::new();
					attrs.insert(ATTR_TUNE.to_string(), FOOTNOTES_TUNE.to_string());
					if !id.is_empty() {
						attrs.insert(ATTR_ID.to_string(), id.to_string());
					}
					let element = self.alloc_element(Element {
						name: NodeName::Sup,
						attrs,
						text: "*".to_string(),
						listeners: Vec::new(),
						parent: Some(block),
					});
					nodes.push(Inline::Element(element));
				}
			}
		}
		nodes
	}

	fn summarize(&self, node: &Inline) -> NodeSummary {
		match node {
			Inline::Text(_) => NodeSummary::text(),
			Inline::Element(id) => self
				.elements
				.get(id)
				.map_or_else(NodeSummary::text, |e| e.summary(*id)),
		}
	}

	fn detach_all(&mut self, nodes: &[Inline]) {
		for node in nodes {
			if let Inline::Element(id) = node
				&& let Some(element) = self.elements.get_mut(id)
			{
				element.parent = None;
			}
		}
	}

	/// Maps a global offset to `(block index, local offset)`.
	fn locate(&self, at: CharIdx) -> Option<(usize, CharIdx)> {
		let mut start = 0;
		for (index, block) in self.blocks.iter().enumerate() {
			let len = block.text_len();
			if at <= start + len {
				return Some((index, at - start));
			}
			start += len + 1;
		}
		None
	}

	fn block_index(&self, block: BlockId) -> Option<usize> {
		self.blocks.iter().position(|b| b.id == block)
	}
}

/// Splits the text run containing `local` and returns the node index where an
/// insertion at `local` goes. Elements already sitting at `local` stay first.
fn split_at(block: &mut Block, local: CharIdx) -> usize {
	let mut pos = 0;
	let mut i = 0;
	while i < block.nodes.len() {
		if let Inline::Text(text) = &block.nodes[i] {
			let len = text.chars().count();
			if pos + len > local {
				if local > pos {
					let split = text
						.char_indices()
						.nth(local - pos)
						.map_or(text.len(), |(byte, _)| byte);
					let tail = text[split..].to_string();
					let head = text[..split].to_string();
					block.nodes[i] = Inline::Text(head);
					block.nodes.insert(i + 1, Inline::Text(tail));
					i += 1;
				}
				return i;
			}
			pos += len;
		}
		i += 1;
	}
	i
}

fn block_summary() -> NodeSummary {
	NodeSummary {
		name: NodeName::Block,
		element: None,
		tune: None,
		id: None,
	}
}

impl MarkerDom for Document {
	fn query_markers(&self, scope: Scope, tune: &str) -> Vec<ElementId> {
		let blocks: &[Block] = match scope {
			Scope::Holder => &self.blocks,
			Scope::Block(id) => match self.block_index(id) {
				Some(index) => std::slice::from_ref(&self.blocks[index]),
				None => return Vec::new(),
			},
		};
		blocks
			.iter()
			.flat_map(|block| block.nodes.iter())
			.filter_map(|node| match node {
				Inline::Element(id) => Some(*id),
				Inline::Text(_) => None,
			})
			.filter(|id| {
				self.elements.get(id).is_some_and(|e| {
					e.name == NodeName::Sup && e.attrs.get(ATTR_TUNE).map(String::as_str) == Some(tune)
				})
			})
			.collect()
	}

	fn insert_marker(&mut self, at: CharIdx) -> Option<ElementId> {
		let (index, local) = self.locate(at)?;
		let block_id = self.blocks[index].id;
		let element = self.alloc_element(Element {
			name: NodeName::Sup,
			attrs: BTreeMap::new(),
			text: String::new(),
			listeners: Vec::new(),
			parent: Some(block_id),
		});
		let block = &mut self.blocks[index];
		let insert_at = split_at(block, local);
		block.nodes.insert(insert_at, Inline::Element(element));
		let summary = self.summarize(&Inline::Element(element));
		self.journal.push(MutationRecord {
			block: Some(block_id),
			added: vec![summary],
			removed: Vec::new(),
		});
		tracing::trace!(?element, at, "document.insert_marker");
		Some(element)
	}

	fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
		self.elements.get(&element)?.attrs.get(name).cloned()
	}

	fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
		if let Some(e) = self.elements.get_mut(&element) {
			e.attrs.insert(name.to_string(), value.to_string());
		}
	}

	fn text(&self, element: ElementId) -> Option<String> {
		self.elements.get(&element).map(|e| e.text.clone())
	}

	fn set_text(&mut self, element: ElementId, text: &str) {
		if let Some(e) = self.elements.get_mut(&element)
			&& e.text != text
		{
			e.text = text.to_string();
		}
	}

	fn offset(&self, element: ElementId) -> Option<CharIdx> {
		let block = self.elements.get(&element)?.parent?;
		let index = self.block_index(block)?;
		let mut pos = self.block_start(index);
		for node in &self.blocks[index].nodes {
			match node {
				Inline::Element(id) if *id == element => return Some(pos),
				Inline::Element(_) => {}
				Inline::Text(text) => pos += text.chars().count(),
			}
		}
		None
	}

	fn block_of(&self, element: ElementId) -> Option<BlockId> {
		self.elements.get(&element)?.parent
	}

	fn block_at(&self, at: CharIdx) -> Option<BlockId> {
		self.locate(at).map(|(index, _)| self.blocks[index].id)
	}

	fn remove_element(&mut self, element: ElementId) {
		let Some(block_id) = self.block_of(element) else {
			return;
		};
		let Some(index) = self.block_index(block_id) else {
			return;
		};
		let block = &mut self.blocks[index];
		block.nodes.retain(|node| *node != Inline::Element(element));
		block.normalize();
		let Some(e) = self.elements.get_mut(&element) else {
			return;
		};
		e.parent = None;
		let summary = e.summary(element);
		self.journal.push(MutationRecord {
			block: Some(block_id),
			added: Vec::new(),
			removed: vec![summary],
		});
	}

	fn add_click_listener(&mut self, element: ElementId, panel: PanelRef) {
		if let Some(e) = self.elements.get_mut(&element) {
			e.listeners.push(panel);
		}
	}

	fn remove_click_listener(&mut self, element: ElementId, panel: PanelRef) {
		if let Some(e) = self.elements.get_mut(&element)
			&& let Some(pos) = e.listeners.iter().position(|p| *p == panel)
		{
			e.listeners.remove(pos);
		}
	}
}

impl EditorApi for Document {
	fn holder_id(&self) -> Option<HolderId> {
		self.holder.clone()
	}

	fn blocks_count(&self) -> usize {
		self.blocks.len()
	}

	fn close_block_settings(&mut self) {
		self.settings_open = false;
	}

	fn open_panel(&mut self, panel: PanelRef, note: &NoteId) {
		self.opened_panels.push((panel, note.clone()));
	}
}
