use std::collections::HashSet;
use std::sync::Arc;

use crate::SieveResult;
use crate::stream::CharStream;

/// Maps every occurrence of one character to another.
pub struct ReplaceCharacter<S> {
	upstream: S,
	from: char,
	to: char,
}

impl<S: CharStream> ReplaceCharacter<S> {
	pub fn new(upstream: S, from: char, to: char) -> Self {
		Self { upstream, from, to }
	}

	fn map(&self, ch: char) -> char {
		if ch == self.from { self.to } else { ch }
	}
}

impl<S: CharStream> CharStream for ReplaceCharacter<S> {
	fn next_char(&mut self) -> Option<char> {
		let ch = self.upstream.next_char()?;
		Some(self.map(ch))
	}

	fn peek_char(&mut self) -> SieveResult<Option<char>> {
		let peeked = self.upstream.peek_char()?;
		Ok(peeked.map(|ch| self.map(ch)))
	}

	fn name(&self) -> &'static str {
		"replaceCharacter"
	}
}

/// Drops every character contained in a fixed set.
///
/// Peeking is unsupported: answering it could require skipping an unbounded
/// run of stripped characters.
pub struct StripCharacters<S> {
	upstream: S,
	chars: Arc<HashSet<char>>,
}

impl<S: CharStream> StripCharacters<S> {
	pub fn new(upstream: S, chars: Arc<HashSet<char>>) -> Self {
		Self { upstream, chars }
	}
}

impl<S: CharStream> CharStream for StripCharacters<S> {
	fn next_char(&mut self) -> Option<char> {
		loop {
			let ch = self.upstream.next_char()?;
			if !self.chars.contains(&ch) {
				return Some(ch);
			}
		}
	}

	fn name(&self) -> &'static str {
		"stripCharacters"
	}
}

/// Expands each tab into a fixed number of spaces.
pub struct TabsToSpaces<S> {
	upstream: S,
	tab_length: usize,
	pending_spaces: usize,
}

impl<S: CharStream> TabsToSpaces<S> {
	pub fn new(upstream: S, tab_length: usize) -> Self {
		Self {
			upstream,
			tab_length,
			pending_spaces: 0,
		}
	}
}

impl<S: CharStream> CharStream for TabsToSpaces<S> {
	fn next_char(&mut self) -> Option<char> {
		if self.pending_spaces > 0 {
			self.pending_spaces -= 1;
			return Some(' ');
		}

		match self.upstream.next_char()? {
			'\t' => {
				self.pending_spaces = self.tab_length.saturating_sub(1);
				Some(' ')
			}
			ch => Some(ch),
		}
	}

	fn peek_char(&mut self) -> SieveResult<Option<char>> {
		if self.pending_spaces > 0 {
			return Ok(Some(' '));
		}

		let peeked = self.upstream.peek_char()?;
		Ok(peeked.map(|ch| if ch == '\t' { ' ' } else { ch }))
	}

	fn name(&self) -> &'static str {
		"tabsToSpaces"
	}
}
