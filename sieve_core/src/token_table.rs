use std::collections::HashMap;
use std::collections::hash_map::Entry;

use derive_more::Deref;

use crate::SieveError;
use crate::SieveResult;

/// Immutable mapping from token keys to their replacement values.
///
/// Keys are case-sensitive and must be unique and non-empty. Values may be
/// empty. The table also records the length (in characters) of its longest
/// key, which bounds how far the token scanner reads ahead before giving up
/// on a marker.
///
/// Construction fails on an empty set of entries: a token filter without
/// tokens would be a no-op and almost always indicates a configuration
/// mistake (for example every entry being disabled by its condition).
#[derive(Debug, Clone, PartialEq, Eq, Deref)]
pub struct TokenTable {
	#[deref]
	entries: HashMap<String, String>,
	max_key_length: usize,
}

impl TokenTable {
	pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> SieveResult<Self>
	where
		K: Into<String>,
		V: Into<String>,
	{
		let mut map = HashMap::new();
		let mut max_key_length = 0;

		for (key, value) in entries {
			let key = key.into();
			if key.is_empty() {
				return Err(SieveError::EmptyTokenKey);
			}

			max_key_length = max_key_length.max(key.chars().count());

			match map.entry(key) {
				Entry::Occupied(occupied) => {
					return Err(SieveError::DuplicateTokenKey(occupied.key().clone()));
				}
				Entry::Vacant(vacant) => {
					vacant.insert(value.into());
				}
			}
		}

		if map.is_empty() {
			return Err(SieveError::EmptyTokenTable);
		}

		Ok(Self {
			entries: map,
			max_key_length,
		})
	}

	/// Length in characters of the longest key.
	pub fn max_key_length(&self) -> usize {
		self.max_key_length
	}

	/// Look up the replacement for `key`.
	pub fn lookup(&self, key: &str) -> Option<&str> {
		self.entries.get(key).map(String::as_str)
	}
}
