use std::sync::Arc;

use crate::SieveError;
use crate::SieveResult;
use crate::staged::Drained;
use crate::staged::StagedOutput;
use crate::stream::CharStream;
use crate::token_table::TokenTable;

/// The pair of characters that open and close a token reference.
///
/// The two may be equal (the classic `@TOKEN@` form) or distinct (`<TOKEN>`).
/// The NUL character stands for an unset delimiter and is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
	begin: char,
	end: char,
}

impl Delimiters {
	pub fn new(begin: char, end: char) -> SieveResult<Self> {
		if begin == '\0' {
			return Err(SieveError::UnsetCharacter {
				field: "begin_token".to_string(),
			});
		}

		if end == '\0' {
			return Err(SieveError::UnsetCharacter {
				field: "end_token".to_string(),
			});
		}

		Ok(Self { begin, end })
	}

	pub fn begin(&self) -> char {
		self.begin
	}

	pub fn end(&self) -> char {
		self.end
	}
}

impl Default for Delimiters {
	fn default() -> Self {
		Self {
			begin: '@',
			end: '@',
		}
	}
}

/// Replaces delimited tokens with values from a [`TokenTable`] while the
/// text streams through.
///
/// Every `begin` delimiter starts a scan that pulls at most
/// `max_key_length + 1` further characters. The scan result is staged and
/// delivered one character per pull:
///
/// - `begin` `key` `end` with a known key yields the replacement value. The
///   value is never scanned again.
/// - two adjacent delimiters (an empty span) yield a single literal `end`.
/// - an unknown key yields the marker unchanged; its closing delimiter is
///   rescanned because it may open the next token.
/// - a second `begin` (with distinct delimiters) aborts the scan; the text
///   so far passes through and the new `begin` is rescanned.
/// - running out of attempts or input passes the text through literally.
///
/// Scanning never fails: any input has a well defined output.
pub struct ReplaceTokens<S> {
	upstream: S,
	table: Arc<TokenTable>,
	delimiters: Delimiters,
	span: String,
	staged: StagedOutput,
	exhausted: bool,
}

impl<S: CharStream> ReplaceTokens<S> {
	pub fn new(upstream: S, table: Arc<TokenTable>, delimiters: Delimiters) -> Self {
		let window = table.max_key_length() + 1;

		Self {
			upstream,
			table,
			delimiters,
			span: String::with_capacity(window),
			staged: StagedOutput::with_capacity(window + 2),
			exhausted: false,
		}
	}

	/// Number of characters staged by the last scan and not yet delivered.
	pub fn pending(&self) -> usize {
		self.staged.pending()
	}

	/// Consume characters following a `begin` delimiter and stage whatever
	/// should be emitted in its place.
	fn scan(&mut self) {
		let Delimiters { begin, end } = self.delimiters;
		self.span.clear();

		for _ in 0..=self.table.max_key_length() {
			let Some(ch) = self.upstream.next_char() else {
				self.exhausted = true;
				self.stage_literal(None, false);
				return;
			};

			if ch == end {
				if self.span.is_empty() {
					self.staged.stage([end], false);
					return;
				}

				if let Some(value) = self.table.lookup(&self.span) {
					tracing::trace!(token = %self.span, "replaced token");
					self.staged.stage(value.chars(), false);
					return;
				}

				tracing::trace!(token = %self.span, "unknown token passed through");
				self.stage_literal(Some(end), true);
				return;
			}

			if ch == begin {
				self.stage_literal(Some(begin), true);
				return;
			}

			self.span.push(ch);
		}

		self.stage_literal(None, false);
	}

	/// Stage the opening delimiter and the scanned span verbatim.
	fn stage_literal(&mut self, trailing: Option<char>, rescan_last: bool) {
		let literal = std::iter::once(self.delimiters.begin)
			.chain(self.span.chars())
			.chain(trailing);
		self.staged.stage(literal, rescan_last);
	}
}

impl<S: CharStream> CharStream for ReplaceTokens<S> {
	fn next_char(&mut self) -> Option<char> {
		loop {
			let ch = match self.staged.pop() {
				Drained::Emit(ch) => return Some(ch),
				Drained::Rescan(ch) => ch,
				Drained::Empty => {
					if self.exhausted {
						return None;
					}

					let Some(ch) = self.upstream.next_char() else {
						self.exhausted = true;
						return None;
					};
					ch
				}
			};

			if ch != self.delimiters.begin {
				return Some(ch);
			}

			self.scan();
		}
	}

	fn name(&self) -> &'static str {
		"replaceTokens"
	}
}
