/// Output computed by a completed scan that has not yet been delivered
/// downstream.
///
/// The buffer is filled in one go by [`StagedOutput::stage`] and drained one
/// character per [`StagedOutput::pop`]. When `rescan_last` is set, the final
/// character is handed back as [`Drained::Rescan`] so the owning filter can
/// treat it as freshly pulled input.
#[derive(Debug, Default)]
pub(crate) struct StagedOutput {
	chars: Vec<char>,
	cursor: usize,
	rescan_last: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Drained {
	/// Deliver this character as-is.
	Emit(char),
	/// The last staged character, to be reprocessed as fresh input.
	Rescan(char),
	/// Nothing is staged.
	Empty,
}

impl StagedOutput {
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			chars: Vec::with_capacity(capacity),
			cursor: 0,
			rescan_last: false,
		}
	}

	/// Replace the staged content. Any undelivered characters are discarded.
	pub fn stage(&mut self, chars: impl IntoIterator<Item = char>, rescan_last: bool) {
		self.chars.clear();
		self.chars.extend(chars);
		self.cursor = 0;
		self.rescan_last = rescan_last && !self.chars.is_empty();
	}

	pub fn pop(&mut self) -> Drained {
		let Some(&ch) = self.chars.get(self.cursor) else {
			return Drained::Empty;
		};

		self.cursor += 1;
		if self.cursor < self.chars.len() {
			return Drained::Emit(ch);
		}

		let rescan = self.rescan_last;
		self.chars.clear();
		self.cursor = 0;
		self.rescan_last = false;

		if rescan {
			Drained::Rescan(ch)
		} else {
			Drained::Emit(ch)
		}
	}

	/// Number of characters still waiting to be delivered.
	pub fn pending(&self) -> usize {
		self.chars.len() - self.cursor
	}
}
