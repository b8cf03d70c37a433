use crate::ids::{BlockId, ElementId};

/// Node type of an added or removed node, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeName {
	/// A text node.
	Text,
	/// A superscript element. Note markers are always `sup` elements.
	Sup,
	/// A whole block container.
	Block,
	/// Any other element.
	Other(String),
}

/// Snapshot of a node taken when the mutation was recorded.
///
/// Attributes are captured at record time because the node may already be
/// detached (or re-attributed) when the batch is classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSummary {
	pub name: NodeName,
	/// Element identity, `None` for text nodes.
	pub element: Option<ElementId>,
	/// Value of `data-tune` at record time.
	pub tune: Option<String>,
	/// Value of `data-id` at record time.
	pub id: Option<String>,
}

impl NodeSummary {
	pub fn text() -> Self {
		Self {
			name: NodeName::Text,
			element: None,
			tune: None,
			id: None,
		}
	}

	/// Returns true if this node is a marker carrying the given tune attribute.
	pub fn is_marker(&self, tune: &str) -> bool {
		self.name == NodeName::Sup && self.tune.as_deref() == Some(tune)
	}
}

/// One child-list change inside a holder, in the shape of a DOM mutation record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationRecord {
	/// Block whose subtree changed, if the change happened inside a block.
	pub block: Option<BlockId>,
	pub added: Vec<NodeSummary>,
	pub removed: Vec<NodeSummary>,
}

impl MutationRecord {
	pub fn is_empty(&self) -> bool {
		self.added.is_empty() && self.removed.is_empty()
	}
}
