//! In-memory block document for hosting footnote markers.
//!
//! [`Document`] implements [`MarkerDom`] and [`EditorApi`] so the note engine can
//! run without a browser. Edits are journaled as mutation records that a host
//! loop drains with [`Document::take_records`].
//!
//! [`MarkerDom`]: marginalia_primitives::MarkerDom
//! [`EditorApi`]: marginalia_primitives::EditorApi

mod document;
mod markup;

#[cfg(test)]
mod tests;

pub use document::Document;
