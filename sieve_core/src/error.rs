use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum SieveError {
	#[error(transparent)]
	#[diagnostic(code(sieve::io_error))]
	Io(#[from] std::io::Error),

	#[error("invalid UTF-8 in source at byte offset {offset}")]
	#[diagnostic(
		code(sieve::invalid_utf8),
		help("sieve filters text files; exclude binary files from the copy")
	)]
	InvalidUtf8 { offset: u64 },

	#[error("the `replaceTokens` filter has no active tokens")]
	#[diagnostic(
		code(sieve::empty_token_table),
		help("add at least one `{{ key = \"...\", value = \"...\" }}` entry whose conditions hold")
	)]
	EmptyTokenTable,

	#[error("token keys must not be empty")]
	#[diagnostic(code(sieve::empty_token_key))]
	EmptyTokenKey,

	#[error("duplicate token key: `{0}`")]
	#[diagnostic(
		code(sieve::duplicate_token_key),
		help("each token key may only be defined once per filter")
	)]
	DuplicateTokenKey(String),

	#[error("`{field}` is not set")]
	#[diagnostic(
		code(sieve::unset_character),
		help("`{field}` must be exactly one character")
	)]
	UnsetCharacter { field: String },

	#[error("`{field}` must be a single character, got `{value}`")]
	#[diagnostic(code(sieve::invalid_character))]
	InvalidCharacter { field: String, value: String },

	#[error("`tab_length` must be between 1 and 100, got {0}")]
	#[diagnostic(code(sieve::invalid_tab_length))]
	InvalidTabLength(u32),

	#[error("the `replaceString` filter needs a non-empty `from` value")]
	#[diagnostic(code(sieve::empty_search_string))]
	EmptySearchString,

	#[error("the `stripCharacters` filter needs at least one character in `chars`")]
	#[diagnostic(code(sieve::empty_character_set))]
	EmptyCharacterSet,

	#[error("unknown filter: `{0}`")]
	#[diagnostic(
		code(sieve::unknown_filter),
		help(
			"available filters: replaceTokens, expandProperties, replaceString, \
			 replaceCharacter, stripCharacters, tabsToSpaces"
		)
	)]
	UnknownFilter(String),

	#[error("filter entry is missing its `type` field")]
	#[diagnostic(
		code(sieve::missing_filter_type),
		help("every `[[filters]]` table needs `type = \"<filter name>\"`")
	)]
	MissingFilterType,

	#[error("invalid configuration for filter `{filter}`: {reason}")]
	#[diagnostic(code(sieve::invalid_filter_config))]
	InvalidFilterConfig { filter: String, reason: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(sieve::config_parse),
		help("check that sieve.toml is valid TOML with [properties], [copy] and [[filters]] sections")
	)]
	ConfigParse(String),

	#[error("no configuration file found in `{path}`")]
	#[diagnostic(
		code(sieve::config_not_found),
		help("create a sieve.toml (or .sieve.toml / .config/sieve.toml) in the project root")
	)]
	ConfigNotFound { path: String },

	#[error("`{operation}` is not supported by the `{filter}` filter")]
	#[diagnostic(
		code(sieve::unsupported_operation),
		help("filters that buffer pending output cannot look ahead without consuming input")
	)]
	UnsupportedOperation {
		operation: &'static str,
		filter: &'static str,
	},

	#[error("source and destination are the same file: `{path}`")]
	#[diagnostic(code(sieve::same_file))]
	SameFile { path: String },

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(sieve::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },
}

impl SieveError {
	/// Returns true for errors raised while validating filter configuration.
	/// These always surface before any character is pulled through a chain.
	pub fn is_configuration_error(&self) -> bool {
		matches!(
			self,
			Self::EmptyTokenTable
				| Self::EmptyTokenKey
				| Self::DuplicateTokenKey(_)
				| Self::UnsetCharacter { .. }
				| Self::InvalidCharacter { .. }
				| Self::InvalidTabLength(_)
				| Self::EmptySearchString
				| Self::EmptyCharacterSet
				| Self::UnknownFilter(_)
				| Self::MissingFilterType
				| Self::InvalidFilterConfig { .. }
				| Self::ConfigParse(_)
		)
	}
}

pub type SieveResult<T> = Result<T, SieveError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
