//! Core types shared between the note engine and its host document.

/// Host document and editor traits.
pub mod dom;
/// Identifier types for holders, blocks, elements, and notes.
pub mod ids;
/// Mutation notifications delivered by the host document.
pub mod mutation;
/// Text range types measured in characters.
pub mod range;

pub use dom::{ATTR_ID, ATTR_TUNE, EditorApi, FOOTNOTES_TUNE, MarkerDom, Scope};
pub use ids::{BlockId, ElementId, HolderId, NoteId, PanelRef};
pub use mutation::{MutationRecord, NodeName, NodeSummary};
pub use range::{CharIdx, Range};
