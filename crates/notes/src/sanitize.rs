//! Attribute allow-list the host applies to saved block markup.

use std::collections::BTreeMap;

use marginalia_primitives::dom::{ATTR_ID, ATTR_TUNE, FOOTNOTES_TUNE};
use serde::Serialize;

/// Marker element tag.
pub const MARKER_TAG: &str = "sup";

/// What an attribute may contain to survive sanitizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttributeRule {
	/// `true` keeps any value, `false` strips the attribute.
	Allowed(bool),
	/// Only this exact value is kept.
	Exact(&'static str),
}

/// Tag name to attribute rules, serialized as the host expects.
pub type SanitizeRules = BTreeMap<&'static str, BTreeMap<&'static str, AttributeRule>>;

/// Rules that keep note markers intact.
pub fn rules() -> SanitizeRules {
	let sup = BTreeMap::from([
		(ATTR_TUNE, AttributeRule::Exact(FOOTNOTES_TUNE)),
		(ATTR_ID, AttributeRule::Allowed(true)),
	]);
	BTreeMap::from([(MARKER_TAG, sup)])
}
