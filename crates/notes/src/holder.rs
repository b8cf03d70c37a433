//! Per-document note state.
//!
//! A [`Holder`] is constructed once per editor instance and shared by every
//! block tune of that instance. Its registry is created lazily, the first
//! time the host can name the holder. Until then block hydrations queue up
//! and every other operation is a no-op.

use std::time::Instant;

use marginalia_primitives::{
	BlockId, EditorApi, ElementId, MarkerDom, MutationRecord, NoteId, PanelRef, Range, Scope,
};

use crate::config::FootnotesConfig;
use crate::engine::{EngineState, EngineStats, Pass, ReconcileEngine, RehydrateReport};
use crate::hydrate::{HydrateReport, hydrate_block};
use crate::note::Note;
use crate::records::{FootnotesData, NoteData};
use crate::registry::NoteRegistry;

/// Everything the note engine needs from the host.
pub trait Host: MarkerDom + EditorApi {}

impl<T: MarkerDom + EditorApi + ?Sized> Host for T {}

/// A block hydration waiting for the block content to settle.
#[derive(Debug)]
struct PendingHydration {
	block: BlockId,
	records: FootnotesData,
	due: Instant,
}

/// Note state of one document instance.
#[derive(Debug)]
pub struct Holder {
	config: FootnotesConfig,
	registry: Option<NoteRegistry>,
	engine: ReconcileEngine,
	hydrations: Vec<PendingHydration>,
}

impl Holder {
	pub fn new(config: FootnotesConfig) -> Self {
		let engine = ReconcileEngine::new(&config);
		Self {
			config,
			registry: None,
			engine,
			hydrations: Vec::new(),
		}
	}

	pub fn config(&self) -> &FootnotesConfig {
		&self.config
	}

	/// Returns true once the holder id has been resolved.
	pub fn is_resolved(&self) -> bool {
		self.registry.is_some()
	}

	pub fn registry(&self) -> Option<&NoteRegistry> {
		self.registry.as_ref()
	}

	pub fn note(&self, id: &str) -> Option<&Note> {
		self.registry.as_ref()?.get(id)
	}

	pub fn state(&self) -> EngineState {
		self.engine.state()
	}

	pub fn stats(&self) -> EngineStats {
		self.engine.stats()
	}

	pub fn hydrations_pending(&self) -> bool {
		!self.hydrations.is_empty()
	}

	/// Earliest time [`Holder::tick`] has work to do.
	pub fn next_deadline(&self) -> Option<Instant> {
		self.hydrations
			.iter()
			.map(|pending| pending.due)
			.chain(self.engine.next_deadline())
			.min()
	}

	/// Creates the registry on first successful holder lookup.
	fn resolve(&mut self, host: &impl Host) -> bool {
		if self.registry.is_some() {
			return true;
		}
		let Some(holder) = host.holder_id() else {
			return false;
		};
		tracing::debug!(holder = %holder, "notes.holder.resolve");
		self.engine.observe_blocks(host.blocks_count());
		self.registry = Some(NoteRegistry::new(holder));
		true
	}

	/// Drops debounced passes while the holder id is unresolved.
	///
	/// Queued hydrations are kept: blocks are wrapped before they are mounted,
	/// and their records load on the first tick after the holder resolves.
	fn drop_passes(&mut self) {
		if self.engine.state() == EngineState::Idle {
			return;
		}
		tracing::debug!(hydrations = self.hydrations.len(), "notes.holder.unresolved");
		self.engine.reset();
	}

	/// Queues a block hydration, replacing any pending one for the block.
	pub fn schedule_hydration(&mut self, block: BlockId, records: FootnotesData, now: Instant) {
		self.hydrations.retain(|pending| pending.block != block);
		self.hydrations.push(PendingHydration {
			block,
			records,
			due: now + self.config.hydration_delay(),
		});
	}

	/// Drops a block's pending hydration. Returns true if one was queued.
	pub fn cancel_hydration(&mut self, block: BlockId) -> bool {
		let before = self.hydrations.len();
		self.hydrations.retain(|pending| pending.block != block);
		before != self.hydrations.len()
	}

	/// Hydrates a block right away.
	pub fn hydrate(
		&mut self,
		host: &mut impl Host,
		block: BlockId,
		records: &[NoteData],
	) -> Option<HydrateReport> {
		if !self.resolve(&*host) {
			return None;
		}
		let registry = self.registry.as_mut()?;
		Some(hydrate_block(registry, host, block, records))
	}

	pub fn notify_mutations(&mut self, now: Instant, host: &impl Host, records: Vec<MutationRecord>) {
		if self.resolve(host) {
			self.engine.notify_mutations(now, records);
		}
	}

	pub fn notify_visibility(&mut self, now: Instant, host: &impl Host) {
		if self.resolve(host) {
			self.engine.notify_visibility(now);
		}
	}

	/// Runs due hydrations, then due reconciliation passes.
	pub fn tick(&mut self, now: Instant, host: &mut impl Host) -> Vec<Pass> {
		if !self.resolve(&*host) {
			self.drop_passes();
			return Vec::new();
		}
		let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.hydrations)
			.into_iter()
			.partition(|pending| pending.due <= now);
		self.hydrations = waiting;
		self.run_hydrations(due, host);

		let hydrations_pending = self.hydrations_pending();
		let Some(registry) = self.registry.as_mut() else {
			return Vec::new();
		};
		self.engine.tick(now, registry, host, hydrations_pending)
	}

	/// Runs all pending hydrations and passes immediately.
	pub fn flush(&mut self, host: &mut impl Host) -> Vec<Pass> {
		if !self.resolve(&*host) {
			self.drop_passes();
			return Vec::new();
		}
		let due = std::mem::take(&mut self.hydrations);
		self.run_hydrations(due, host);
		let Some(registry) = self.registry.as_mut() else {
			return Vec::new();
		};
		self.engine.flush(registry, host)
	}

	fn run_hydrations(&mut self, due: Vec<PendingHydration>, host: &mut impl Host) {
		let Some(registry) = self.registry.as_mut() else {
			return;
		};
		for pending in due {
			hydrate_block(registry, host, pending.block, &pending.records);
		}
	}

	/// Inserts a note at the end of `range` and asks the host to open its panel.
	///
	/// Ordinals are assigned by the next reconciliation pass, driven by the
	/// marker insertion the host reports.
	pub fn insert_note(&mut self, host: &mut impl Host, range: Range) -> Option<NoteId> {
		if !self.resolve(&*host) {
			return None;
		}
		let registry = self.registry.as_mut()?;
		let block = host.block_at(range.to())?;
		let panel = PanelRef(block);
		let note = Note::insert(host, range, panel, Some(registry.fresh_id()))?;
		let id = note.id().clone();
		let at = registry.insert(&*host, note);
		tracing::debug!(holder = %registry.holder(), id = %id, at, "notes.insert_note");
		host.open_panel(panel, &id);
		host.close_block_settings();
		Some(id)
	}

	/// Replaces a note's content. Returns false for unknown ids.
	pub fn set_content(&mut self, id: &str, content: impl Into<String>) -> bool {
		let Some(note) = self.registry.as_mut().and_then(|registry| registry.get_mut(id)) else {
			return false;
		};
		note.set_content(content);
		true
	}

	/// Opens the panel of the note bound to a clicked marker.
	pub fn marker_clicked(&self, host: &mut impl Host, element: ElementId) -> Option<NoteId> {
		let note = self.registry.as_ref()?.find_by_element(element)?;
		let id = note.id().clone();
		host.open_panel(note.panel(), &id);
		Some(id)
	}

	/// Serializes the notes present in `block`.
	///
	/// Pending work is flushed and the registry reindexed first, so saved
	/// ordinals always match the document. Markers left without a note are
	/// rehydrated before notes whose marker is gone are pruned, so content
	/// follows re-rendered markers.
	pub fn save_block(&mut self, host: &mut impl Host, block: BlockId) -> Option<FootnotesData> {
		if !self.resolve(&*host) {
			return None;
		}
		self.flush(host);
		let registry = self.registry.as_mut()?;
		if registry.reindex(host).orphans > 0 {
			self.engine.rehydrate(registry, host);
		}
		registry.prune_detached(&*host);
		Some(registry.save(&*host, Scope::Block(block)))
	}

	/// Forces a full rehydrate of the holder's markers.
	pub fn rehydrate(&mut self, host: &mut impl Host) -> Option<RehydrateReport> {
		if !self.resolve(&*host) {
			return None;
		}
		let registry = self.registry.as_mut()?;
		Some(self.engine.rehydrate(registry, host))
	}
}
