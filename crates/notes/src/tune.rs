//! Per-block tune controller.
//!
//! [`FootnotesTune`] is the thin object the host creates for every block. It
//! carries the block's persisted records and forwards lifecycle calls to the
//! document's shared [`Holder`].

use std::time::Instant;

use marginalia_primitives::{BlockId, MarkerDom, NoteId, Range};

use crate::config::FootnotesConfig;
use crate::holder::{Holder, Host};
use crate::records::FootnotesData;
use crate::sanitize::{self, SanitizeRules};

/// Footnotes tune for one block.
#[derive(Debug, Clone)]
pub struct FootnotesTune {
	block: BlockId,
	data: FootnotesData,
	config: FootnotesConfig,
}

impl FootnotesTune {
	pub fn new(block: BlockId, data: FootnotesData, config: &FootnotesConfig) -> Self {
		Self {
			block,
			data,
			config: config.clone(),
		}
	}

	pub fn block(&self) -> BlockId {
		self.block
	}

	/// Records the tune was constructed with.
	pub fn data(&self) -> &FootnotesData {
		&self.data
	}

	pub fn shortcut(&self) -> &str {
		&self.config.shortcut
	}

	pub fn placeholder(&self) -> Option<&str> {
		self.config.placeholder.as_deref()
	}

	pub fn sanitize() -> SanitizeRules {
		sanitize::rules()
	}

	/// Whether the tune button is enabled: the selection must start inside this block.
	pub fn is_available(&self, dom: &impl MarkerDom, range: Range) -> bool {
		dom.block_at(range.from()) == Some(self.block)
	}

	/// Called once the block content is wrapped; hydration runs after the delay.
	pub fn wrap(&self, holder: &mut Holder, now: Instant) {
		holder.schedule_hydration(self.block, self.data.clone(), now);
	}

	/// Inserts a note at the end of the selection (tune click or shortcut).
	pub fn insert_note(&self, holder: &mut Holder, host: &mut impl Host, range: Range) -> Option<NoteId> {
		holder.insert_note(host, range)
	}

	/// Notes present in this block, in document order.
	///
	/// Returns the construction data while the holder is unresolved.
	pub fn save(&self, holder: &mut Holder, host: &mut impl Host) -> FootnotesData {
		holder
			.save_block(host, self.block)
			.unwrap_or_else(|| self.data.clone())
	}

	pub fn destroy(&self, holder: &mut Holder) {
		if holder.cancel_hydration(self.block) {
			tracing::trace!(block = ?self.block, "notes.tune.destroy");
		}
	}
}
