use std::io::BufRead;
use std::io::ErrorKind;
use std::iter::Fuse;
use std::iter::Peekable;

use crate::SieveError;
use crate::SieveResult;

/// The pull contract shared by every character source and filter stage.
///
/// A stream hands out one character per call and reports exhaustion with
/// `None`. Once exhausted, it keeps returning `None` without touching its
/// upstream again.
pub trait CharStream {
	/// Pull the next character.
	fn next_char(&mut self) -> Option<char>;

	/// Look at the next character without consuming it.
	///
	/// Streams that would have to consume input to answer return
	/// [`SieveError::UnsupportedOperation`] instead of an approximation.
	fn peek_char(&mut self) -> SieveResult<Option<char>> {
		Err(SieveError::UnsupportedOperation {
			operation: "peek",
			filter: self.name(),
		})
	}

	/// Short name used in diagnostics and logs.
	fn name(&self) -> &'static str;
}

impl<S: CharStream + ?Sized> CharStream for Box<S> {
	fn next_char(&mut self) -> Option<char> {
		(**self).next_char()
	}

	fn peek_char(&mut self) -> SieveResult<Option<char>> {
		(**self).peek_char()
	}

	fn name(&self) -> &'static str {
		(**self).name()
	}
}

impl<S: CharStream + ?Sized> CharStream for &mut S {
	fn next_char(&mut self) -> Option<char> {
		(**self).next_char()
	}

	fn peek_char(&mut self) -> SieveResult<Option<char>> {
		(**self).peek_char()
	}

	fn name(&self) -> &'static str {
		(**self).name()
	}
}

/// An in-memory source over any character iterator.
pub struct CharSource<I: Iterator<Item = char>> {
	chars: Peekable<Fuse<I>>,
}

impl<I: Iterator<Item = char>> CharSource<I> {
	pub fn new(chars: impl IntoIterator<Item = char, IntoIter = I>) -> Self {
		Self {
			chars: chars.into_iter().fuse().peekable(),
		}
	}
}

impl<'a> CharSource<std::str::Chars<'a>> {
	/// Create a source that yields the characters of `text`.
	pub fn from_text(text: &'a str) -> Self {
		Self::new(text.chars())
	}
}

impl<I: Iterator<Item = char>> CharStream for CharSource<I> {
	fn next_char(&mut self) -> Option<char> {
		self.chars.next()
	}

	fn peek_char(&mut self) -> SieveResult<Option<char>> {
		Ok(self.chars.peek().copied())
	}

	fn name(&self) -> &'static str {
		"source"
	}
}

/// A source that decodes UTF-8 from a buffered reader one character at a
/// time.
///
/// Read failures and malformed input end the stream early. The failure is
/// kept so the consumer can surface it with [`ReaderSource::take_error`]
/// once it has stopped pulling.
pub struct ReaderSource<R> {
	reader: R,
	offset: u64,
	peeked: Option<Option<char>>,
	error: Option<SieveError>,
	done: bool,
}

impl<R: BufRead> ReaderSource<R> {
	pub fn new(reader: R) -> Self {
		Self {
			reader,
			offset: 0,
			peeked: None,
			error: None,
			done: false,
		}
	}

	/// Number of bytes consumed from the reader so far.
	pub fn bytes_read(&self) -> u64 {
		self.offset
	}

	/// Take the error that ended the stream early, if any.
	pub fn take_error(&mut self) -> Option<SieveError> {
		self.error.take()
	}

	fn read_byte(&mut self) -> SieveResult<Option<u8>> {
		loop {
			let buffer = match self.reader.fill_buf() {
				Ok(buffer) => buffer,
				Err(e) if e.kind() == ErrorKind::Interrupted => continue,
				Err(e) => return Err(e.into()),
			};

			let Some(&byte) = buffer.first() else {
				return Ok(None);
			};

			self.reader.consume(1);
			self.offset += 1;
			return Ok(Some(byte));
		}
	}

	fn decode(&mut self) -> SieveResult<Option<char>> {
		let start = self.offset;
		let Some(first) = self.read_byte()? else {
			return Ok(None);
		};

		let width = utf8_width(first);
		if width == 0 {
			return Err(SieveError::InvalidUtf8 { offset: start });
		}

		let mut bytes = [first, 0, 0, 0];
		for slot in bytes.iter_mut().take(width).skip(1) {
			match self.read_byte()? {
				Some(byte) => *slot = byte,
				None => return Err(SieveError::InvalidUtf8 { offset: start }),
			}
		}

		std::str::from_utf8(&bytes[..width])
			.ok()
			.and_then(|decoded| decoded.chars().next())
			.map(Some)
			.ok_or(SieveError::InvalidUtf8 { offset: start })
	}

	fn advance(&mut self) -> Option<char> {
		if self.done {
			return None;
		}

		match self.decode() {
			Ok(Some(ch)) => Some(ch),
			Ok(None) => {
				self.done = true;
				None
			}
			Err(e) => {
				tracing::debug!(offset = self.offset, "source stopped early: {e}");
				self.error = Some(e);
				self.done = true;
				None
			}
		}
	}
}

impl<R: BufRead> CharStream for ReaderSource<R> {
	fn next_char(&mut self) -> Option<char> {
		match self.peeked.take() {
			Some(peeked) => peeked,
			None => self.advance(),
		}
	}

	fn peek_char(&mut self) -> SieveResult<Option<char>> {
		if self.peeked.is_none() {
			self.peeked = Some(self.advance());
		}

		Ok(self.peeked.flatten())
	}

	fn name(&self) -> &'static str {
		"source"
	}
}

/// Length of the UTF-8 sequence introduced by `byte`, or 0 when the byte
/// cannot start a sequence.
fn utf8_width(byte: u8) -> usize {
	match byte {
		0x00..=0x7F => 1,
		0xC2..=0xDF => 2,
		0xE0..=0xEF => 3,
		0xF0..=0xF4 => 4,
		_ => 0,
	}
}
