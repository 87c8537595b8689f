use std::collections::VecDeque;
use std::sync::Arc;

use crate::staged::Drained;
use crate::staged::StagedOutput;
use crate::stream::CharStream;

/// Replaces every non-overlapping occurrence of a search string, scanning
/// left to right.
///
/// The filter keeps a window of exactly `from.len()` characters. When the
/// window matches, it is swapped for the replacement; otherwise its first
/// character is released downstream and the window slides by one.
pub struct ReplaceString<S> {
	upstream: S,
	needle: Arc<[char]>,
	replacement: Arc<str>,
	ignore_case: bool,
	window: VecDeque<char>,
	staged: StagedOutput,
	exhausted: bool,
}

impl<S: CharStream> ReplaceString<S> {
	pub fn new(upstream: S, needle: Arc<[char]>, replacement: Arc<str>, ignore_case: bool) -> Self {
		let window = VecDeque::with_capacity(needle.len());

		Self {
			upstream,
			needle,
			replacement,
			ignore_case,
			window,
			staged: StagedOutput::default(),
			exhausted: false,
		}
	}

	fn fill_window(&mut self) {
		while self.window.len() < self.needle.len() && !self.exhausted {
			match self.upstream.next_char() {
				Some(ch) => self.window.push_back(ch),
				None => self.exhausted = true,
			}
		}
	}

	fn window_matches(&self) -> bool {
		self.window.len() == self.needle.len()
			&& self
				.window
				.iter()
				.zip(self.needle.iter())
				.all(|(&left, &right)| chars_match(left, right, self.ignore_case))
	}
}

impl<S: CharStream> CharStream for ReplaceString<S> {
	fn next_char(&mut self) -> Option<char> {
		loop {
			if let Drained::Emit(ch) | Drained::Rescan(ch) = self.staged.pop() {
				return Some(ch);
			}

			self.fill_window();

			if !self.window.is_empty() && self.window_matches() {
				self.window.clear();
				self.staged.stage(self.replacement.chars(), false);
				continue;
			}

			return self.window.pop_front();
		}
	}

	fn name(&self) -> &'static str {
		"replaceString"
	}
}

fn chars_match(left: char, right: char, ignore_case: bool) -> bool {
	left == right || (ignore_case && left.to_lowercase().eq(right.to_lowercase()))
}
