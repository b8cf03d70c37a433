//! Reconciliation engine.
//!
//! Keeps marker ordinals in step with the document. The host forwards
//! mutation batches and visibility changes; each source arms its own
//! trailing-edge [`Debounce`]. When a timer fires, [`ReconcileEngine::tick`]
//! classifies everything accumulated since the last pass and picks the
//! cheapest repair:
//!
//! 1. The block count dropped: blocks were merged or deleted and markers may
//!    have been re-rendered, so a rehydrate is scheduled after the hydration
//!    delay.
//! 2. A marker was added or removed: reindex.
//! 3. Some marker shows the wrong ordinal (a move): reindex.
//! 4. Otherwise nothing.
//!
//! Time is passed in by the caller; the engine never reads the clock except in
//! [`ReconcileEngine::flush`], which ignores deadlines anyway.

mod debounce;
mod rehydrate;

use std::time::Instant;

pub use debounce::Debounce;
use marginalia_primitives::dom::FOOTNOTES_TUNE;
use marginalia_primitives::{MarkerDom, MutationRecord, NodeName, Scope};
pub use rehydrate::RehydrateReport;

use crate::config::{FootnotesConfig, RemovalPolicy};
use crate::holder::Host;
use crate::registry::{NoteRegistry, ReindexReport};

/// Source of a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
	Mutation,
	Visibility,
}

/// Observable engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
	/// Nothing pending.
	Idle,
	/// A notification is waiting on its debounce timer.
	PendingChange,
	/// A rehydrate is scheduled.
	Rehydrating,
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
	/// Nothing affecting ordinals changed.
	Unchanged,
	Reindexed(ReindexReport),
	/// The block count dropped; a rehydrate is now pending.
	RehydrateScheduled,
	Rehydrated(RehydrateReport),
}

/// Counters for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
	/// Classification passes run.
	pub passes: u64,
	pub reindexes: u64,
	pub rehydrations: u64,
	/// Notifications absorbed into an already pending window.
	pub coalesced: u64,
	/// Notes dropped by eager removal.
	pub pruned: u64,
}

/// Debounced reconciliation for one holder.
#[derive(Debug)]
pub struct ReconcileEngine {
	mutation: Debounce,
	visibility: Debounce,
	rehydrate: Debounce,
	batch: Vec<MutationRecord>,
	blocks: Option<usize>,
	removal: RemovalPolicy,
	stats: EngineStats,
}

impl ReconcileEngine {
	pub fn new(config: &FootnotesConfig) -> Self {
		Self {
			mutation: Debounce::new(config.debounce()),
			visibility: Debounce::new(config.debounce()),
			rehydrate: Debounce::new(config.hydration_delay()),
			batch: Vec::new(),
			blocks: None,
			removal: config.removal,
			stats: EngineStats::default(),
		}
	}

	pub fn stats(&self) -> EngineStats {
		self.stats
	}

	pub fn state(&self) -> EngineState {
		if self.rehydrate.is_pending() {
			EngineState::Rehydrating
		} else if self.mutation.is_pending() || self.visibility.is_pending() {
			EngineState::PendingChange
		} else {
			EngineState::Idle
		}
	}

	/// Earliest pending deadline across all timers.
	pub fn next_deadline(&self) -> Option<Instant> {
		[&self.mutation, &self.visibility, &self.rehydrate]
			.into_iter()
			.filter_map(Debounce::deadline)
			.min()
	}

	/// Records the host block count without classifying anything.
	///
	/// Returns the previous observation.
	pub fn observe_blocks(&mut self, count: usize) -> Option<usize> {
		self.blocks.replace(count)
	}

	/// Queues a mutation batch and (re)arms the mutation timer.
	pub fn notify_mutations(&mut self, now: Instant, records: impl IntoIterator<Item = MutationRecord>) {
		self.batch.extend(records.into_iter().filter(|record| !record.is_empty()));
		self.arm(Trigger::Mutation, now);
	}

	/// (Re)arms the visibility timer.
	pub fn notify_visibility(&mut self, now: Instant) {
		self.arm(Trigger::Visibility, now);
	}

	fn arm(&mut self, trigger: Trigger, now: Instant) {
		let timer = match trigger {
			Trigger::Mutation => &mut self.mutation,
			Trigger::Visibility => &mut self.visibility,
		};
		if timer.arm(now) {
			self.stats.coalesced += 1;
		}
		tracing::trace!(?trigger, batch = self.batch.len(), "notes.notify");
	}

	/// Runs every pass whose deadline has passed.
	///
	/// A due rehydrate waits while block hydrations are still queued, so it
	/// never races the records those hydrations would load.
	pub fn tick(
		&mut self,
		now: Instant,
		registry: &mut NoteRegistry,
		host: &mut impl Host,
		hydrations_pending: bool,
	) -> Vec<Pass> {
		let mut passes = Vec::new();
		let mutation_due = self.mutation.take_due(now);
		let visibility_due = self.visibility.take_due(now);
		if mutation_due || visibility_due {
			let batch = if mutation_due {
				std::mem::take(&mut self.batch)
			} else {
				Vec::new()
			};
			passes.push(self.reconcile(now, batch, registry, host, hydrations_pending));
		}
		if !hydrations_pending && self.rehydrate.take_due(now) {
			passes.push(Pass::Rehydrated(self.run_rehydrate(registry, host)));
		}
		passes
	}

	/// Runs all pending work now, regardless of deadlines.
	pub fn flush(&mut self, registry: &mut NoteRegistry, host: &mut impl Host) -> Vec<Pass> {
		let now = Instant::now();
		let mut passes = Vec::new();
		let mutation = self.mutation.cancel();
		let visibility = self.visibility.cancel();
		if mutation || visibility {
			let batch = std::mem::take(&mut self.batch);
			passes.push(self.reconcile(now, batch, registry, host, false));
		}
		if self.rehydrate.cancel() {
			passes.push(Pass::Rehydrated(self.run_rehydrate(registry, host)));
		}
		passes
	}

	/// Drops all pending work.
	pub fn reset(&mut self) {
		self.mutation.cancel();
		self.visibility.cancel();
		self.rehydrate.cancel();
		self.batch.clear();
	}

	/// Rebuilds note identities from the holder's markers immediately.
	pub fn rehydrate(&mut self, registry: &mut NoteRegistry, host: &mut impl Host) -> RehydrateReport {
		self.rehydrate.cancel();
		self.run_rehydrate(registry, host)
	}

	fn run_rehydrate(&mut self, registry: &mut NoteRegistry, host: &mut impl Host) -> RehydrateReport {
		self.stats.rehydrations += 1;
		self.stats.reindexes += 1;
		rehydrate::rehydrate(registry, host)
	}

	fn reconcile(
		&mut self,
		now: Instant,
		batch: Vec<MutationRecord>,
		registry: &mut NoteRegistry,
		host: &mut impl Host,
		hydrations_pending: bool,
	) -> Pass {
		self.stats.passes += 1;
		let count = host.blocks_count();
		let previous = self.blocks.replace(count);
		if previous.is_some_and(|previous| count < previous) {
			self.rehydrate.arm(now);
			tracing::debug!(holder = %registry.holder(), ?previous, count, "notes.rehydrate.schedule");
			return Pass::RehydrateScheduled;
		}

		let structural = batch.iter().any(|record| {
			record.added.iter().any(|node| node.name == NodeName::Sup)
				|| record.removed.iter().any(|node| node.is_marker(FOOTNOTES_TUNE))
		});
		if self.removal == RemovalPolicy::Eager {
			self.prune_removed(&batch, registry, &*host);
		}
		if !structural && !misnumbered(&*host) {
			tracing::trace!(holder = %registry.holder(), records = batch.len(), "notes.reconcile.skip");
			return Pass::Unchanged;
		}

		self.stats.reindexes += 1;
		let report = registry.reindex(host);
		if report.orphans > 0 && !hydrations_pending && !self.rehydrate.is_pending() {
			return Pass::Rehydrated(self.run_rehydrate(registry, host));
		}
		Pass::Reindexed(report)
	}

	fn prune_removed(&mut self, batch: &[MutationRecord], registry: &mut NoteRegistry, host: &impl Host) {
		let removed = batch
			.iter()
			.flat_map(|record| record.removed.iter())
			.filter(|node| node.is_marker(FOOTNOTES_TUNE))
			.filter_map(|node| node.element)
			.filter(|&element| !host.is_connected(element));
		for element in removed {
			let Some(id) = registry.find_by_element(element).map(|note| note.id().clone()) else {
				continue;
			};
			registry.remove(id.as_str());
			self.stats.pruned += 1;
			tracing::trace!(holder = %registry.holder(), id = %id, "notes.prune.eager");
		}
	}
}

/// Returns true if any marker's text differs from its document ordinal.
fn misnumbered(dom: &impl MarkerDom) -> bool {
	dom.query_markers(Scope::Holder, FOOTNOTES_TUNE)
		.into_iter()
		.enumerate()
		.any(|(i, element)| dom.text(element).is_none_or(|text| text != (i + 1).to_string()))
}
