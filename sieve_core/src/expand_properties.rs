use std::collections::BTreeMap;
use std::sync::Arc;

use crate::staged::Drained;
use crate::staged::StagedOutput;
use crate::stream::CharStream;

/// Named values available to `${name}` references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
	values: BTreeMap<String, String>,
	max_name_length: usize,
}

impl Properties {
	pub fn new<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		let values: BTreeMap<String, String> = values
			.into_iter()
			.map(|(name, value)| (name.into(), value.into()))
			.collect();
		let max_name_length = values
			.keys()
			.map(|name| name.chars().count())
			.max()
			.unwrap_or(0);

		Self {
			values,
			max_name_length,
		}
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.values.get(name).map(String::as_str)
	}

	pub fn max_name_length(&self) -> usize {
		self.max_name_length
	}
}

/// Expands `${name}` references from a [`Properties`] map.
///
/// References to undefined properties, unterminated references and names
/// longer than any defined property are passed through untouched. A `$`
/// that is not followed by `{` is literal, and the character after it is
/// rescanned so that `$${name}` still expands the second reference.
pub struct ExpandProperties<S> {
	upstream: S,
	properties: Arc<Properties>,
	name: String,
	staged: StagedOutput,
	exhausted: bool,
}

impl<S: CharStream> ExpandProperties<S> {
	pub fn new(upstream: S, properties: Arc<Properties>) -> Self {
		let window = properties.max_name_length() + 1;

		Self {
			upstream,
			properties,
			name: String::with_capacity(window),
			staged: StagedOutput::with_capacity(window + 3),
			exhausted: false,
		}
	}

	fn pull(&mut self) -> Option<char> {
		let ch = self.upstream.next_char();
		if ch.is_none() {
			self.exhausted = true;
		}
		ch
	}

	fn scan(&mut self) {
		let Some(next) = self.pull() else {
			self.staged.stage(['$'], false);
			return;
		};

		if next != '{' {
			self.staged.stage(['$', next], true);
			return;
		}

		self.name.clear();
		for _ in 0..=self.properties.max_name_length() {
			let Some(ch) = self.pull() else {
				self.stage_literal(None, false);
				return;
			};

			match ch {
				'}' => {
					if let Some(value) = self.properties.get(&self.name) {
						self.staged.stage(value.chars(), false);
					} else {
						tracing::debug!(property = %self.name, "undefined property left unexpanded");
						self.stage_literal(Some('}'), false);
					}
					return;
				}
				'$' => {
					self.stage_literal(Some('$'), true);
					return;
				}
				_ => self.name.push(ch),
			}
		}

		self.stage_literal(None, false);
	}

	fn stage_literal(&mut self, trailing: Option<char>, rescan_last: bool) {
		let literal = ['$', '{']
			.into_iter()
			.chain(self.name.chars())
			.chain(trailing);
		self.staged.stage(literal, rescan_last);
	}
}

impl<S: CharStream> CharStream for ExpandProperties<S> {
	fn next_char(&mut self) -> Option<char> {
		loop {
			let ch = match self.staged.pop() {
				Drained::Emit(ch) => return Some(ch),
				Drained::Rescan(ch) => ch,
				Drained::Empty => {
					if self.exhausted {
						return None;
					}
					self.pull()?
				}
			};

			if ch != '$' {
				return Some(ch);
			}

			self.scan();
		}
	}

	fn name(&self) -> &'static str {
		"expandProperties"
	}
}
