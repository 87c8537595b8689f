use std::cell::Cell;
use std::io;
use std::io::BufRead;
use std::io::Cursor;
use std::io::ErrorKind;
use std::io::Read;
use std::rc::Rc;
use std::sync::Arc;

use crate::*;

/// Wraps a source and counts every character pulled from it.
pub struct CountingSource<S> {
	inner: S,
	pulls: Rc<Cell<usize>>,
}

impl<S: CharStream> CountingSource<S> {
	pub fn new(inner: S) -> (Self, Rc<Cell<usize>>) {
		let pulls = Rc::new(Cell::new(0));
		let source = Self {
			inner,
			pulls: Rc::clone(&pulls),
		};
		(source, pulls)
	}
}

impl<S: CharStream> CharStream for CountingSource<S> {
	fn next_char(&mut self) -> Option<char> {
		self.pulls.set(self.pulls.get() + 1);
		self.inner.next_char()
	}

	fn peek_char(&mut self) -> SieveResult<Option<char>> {
		self.inner.peek_char()
	}

	fn name(&self) -> &'static str {
		"counting"
	}
}

/// A reader whose `fill_buf` fails with `Interrupted` on every other call.
pub struct InterruptingReader {
	inner: Cursor<Vec<u8>>,
	interrupted: bool,
}

impl InterruptingReader {
	pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
		Self {
			inner: Cursor::new(bytes.into()),
			interrupted: false,
		}
	}
}

impl Read for InterruptingReader {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		self.inner.read(buf)
	}
}

impl BufRead for InterruptingReader {
	fn fill_buf(&mut self) -> io::Result<&[u8]> {
		self.interrupted = !self.interrupted;
		if self.interrupted {
			return Err(ErrorKind::Interrupted.into());
		}
		self.inner.fill_buf()
	}

	fn consume(&mut self, amount: usize) {
		self.inner.consume(amount);
	}
}

/// Every string over `alphabet` with at most `max_len` characters.
pub fn strings_over(alphabet: &[char], max_len: usize) -> Vec<String> {
	let mut all = vec![String::new()];
	let mut previous = vec![String::new()];

	for _ in 0..max_len {
		previous = previous
			.iter()
			.flat_map(|prefix| {
				alphabet.iter().map(move |&ch| {
					let mut next = prefix.clone();
					next.push(ch);
					next
				})
			})
			.collect();
		all.extend(previous.iter().cloned());
	}

	all
}

pub fn token_entries(tokens: &[(&str, &str)]) -> Vec<TokenEntry> {
	tokens
		.iter()
		.map(|(key, value)| TokenEntry::new(*key, *value))
		.collect()
}

pub fn replace_tokens_spec(tokens: &[(&str, &str)]) -> FilterSpec {
	FilterSpec::ReplaceTokens(ReplaceTokensConfig {
		tokens: token_entries(tokens),
		..ReplaceTokensConfig::default()
	})
}

pub fn delimited_tokens_spec(begin: &str, end: &str, tokens: &[(&str, &str)]) -> FilterSpec {
	FilterSpec::ReplaceTokens(ReplaceTokensConfig {
		begin_token: begin.to_string(),
		end_token: end.to_string(),
		tokens: token_entries(tokens),
	})
}

pub fn expand_properties_spec(properties: &[(&str, &str)]) -> FilterSpec {
	FilterSpec::ExpandProperties(ExpandPropertiesConfig {
		properties: properties
			.iter()
			.map(|(name, value)| ((*name).to_string(), (*value).to_string()))
			.collect(),
	})
}

pub fn replace_character_spec(chr: &str, with: &str) -> FilterSpec {
	FilterSpec::ReplaceCharacter(ReplaceCharacterConfig {
		chr: chr.to_string(),
		with: with.to_string(),
	})
}

pub fn date_table() -> Arc<TokenTable> {
	Arc::new(TokenTable::new([("DATE", "2024-01-01")]).expect("valid token table"))
}

pub const SAMPLE_CONFIG: &str = r#"
[properties]
version = "1.2.3"

[copy]
exclude = ["skip/"]

[[filters]]
type = "replaceTokens"
tokens = [
  { key = "DATE", value = "2024-01-01" },
  { key = "DEBUG", value = "yes", if = false },
]

[[filters]]
type = "expandProperties"

[[filters]]
type = "tabsToSpaces"
tab_length = 2
"#;
