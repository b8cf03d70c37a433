//! Footnote notes for block editors.
//!
//! Each footnote marker in a document is backed by a [`Note`] with a stable
//! id. A [`NoteRegistry`] per document keeps notes in document order, and the
//! [`ReconcileEngine`] keeps every marker's ordinal in step with edits. The
//! host drives everything through a [`Holder`] per document and a
//! [`FootnotesTune`] per block.

pub mod config;
pub mod engine;
pub mod error;
pub mod holder;
pub mod hydrate;
pub mod note;
pub mod records;
pub mod registry;
pub mod sanitize;
pub mod tune;

pub use config::{FootnotesConfig, RemovalPolicy};
pub use engine::{EngineState, EngineStats, Pass, ReconcileEngine, RehydrateReport, Trigger};
pub use error::{ConfigError, RecordsError};
pub use holder::{Holder, Host};
pub use hydrate::{HydrateReport, IdSource, hydrate_block};
pub use note::Note;
pub use records::{FootnotesData, NoteData};
pub use registry::{NoteRegistry, ReindexReport};
pub use tune::FootnotesTune;
