//! Compact block markup used to seed documents.
//!
//! Plain text is taken verbatim; `[^id]` stands for a footnote marker element
//! with `data-id="id"`. `[^]` is a marker without an id.

use std::sync::LazyLock;

use regex::Regex;

static MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\^([^\]]*)\]").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'a> {
	Text(&'a str),
	Marker(&'a str),
}

pub(crate) fn tokenize(markup: &str) -> Vec<Token<'_>> {
	let mut tokens = Vec::new();
	let mut last = 0;
	for caps in MARKER.captures_iter(markup) {
		let (Some(whole), Some(id)) = (caps.get(0), caps.get(1)) else {
			continue;
		};
		if whole.start() > last {
			tokens.push(Token::Text(&markup[last..whole.start()]));
		}
		tokens.push(Token::Marker(id.as_str()));
		last = whole.end();
	}
	if last < markup.len() {
		tokens.push(Token::Text(&markup[last..]));
	}
	tokens
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_tokenize_mixed() {
		assert_eq!(
			tokenize("Hi[^a] there[^]"),
			vec![
				Token::Text("Hi"),
				Token::Marker("a"),
				Token::Text(" there"),
				Token::Marker(""),
			]
		);
	}

	#[test]
	fn test_tokenize_plain() {
		assert_eq!(tokenize("plain"), vec![Token::Text("plain")]);
		assert!(tokenize("").is_empty());
	}
}
