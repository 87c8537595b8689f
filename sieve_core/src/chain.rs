use std::collections::BTreeMap;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::SieveError;
use crate::SieveResult;
use crate::expand_properties::ExpandProperties;
use crate::expand_properties::Properties;
use crate::filters::ReplaceCharacter;
use crate::filters::StripCharacters;
use crate::filters::TabsToSpaces;
use crate::replace_string::ReplaceString;
use crate::replace_tokens::Delimiters;
use crate::replace_tokens::ReplaceTokens;
use crate::stream::CharStream;
use crate::token_table::TokenTable;

/// Default tab width for `tabsToSpaces`.
pub const DEFAULT_TAB_LENGTH: u32 = 8;

/// The closed set of filters a chain can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FilterKind {
	/// Substitute `@KEY@`-style delimited tokens.
	ReplaceTokens,
	/// Expand `${name}` property references.
	ExpandProperties,
	/// Replace every occurrence of a string.
	ReplaceString,
	/// Replace every occurrence of a single character.
	ReplaceCharacter,
	/// Drop a set of characters.
	StripCharacters,
	/// Expand tabs into spaces.
	TabsToSpaces,
}

impl FilterKind {
	pub const ALL: [FilterKind; 6] = [
		Self::ReplaceTokens,
		Self::ExpandProperties,
		Self::ReplaceString,
		Self::ReplaceCharacter,
		Self::StripCharacters,
		Self::TabsToSpaces,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::ReplaceTokens => "replaceTokens",
			Self::ExpandProperties => "expandProperties",
			Self::ReplaceString => "replaceString",
			Self::ReplaceCharacter => "replaceCharacter",
			Self::StripCharacters => "stripCharacters",
			Self::TabsToSpaces => "tabsToSpaces",
		}
	}

	/// Whether a stage of this kind can answer `peek` without consuming
	/// input. Stages that stage pending output cannot.
	pub fn supports_peek(self) -> bool {
		matches!(self, Self::ReplaceCharacter | Self::TabsToSpaces)
	}
}

impl std::fmt::Display for FilterKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl FromStr for FilterKind {
	type Err = SieveError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|kind| kind.as_str() == value)
			.ok_or_else(|| SieveError::UnknownFilter(value.to_string()))
	}
}

fn default_delimiter() -> String {
	"@".to_string()
}

fn default_true() -> bool {
	true
}

fn default_tab_length() -> u32 {
	DEFAULT_TAB_LENGTH
}

/// Configuration for the `replaceTokens` filter.
///
/// ```toml
/// [[filters]]
/// type = "replaceTokens"
/// begin_token = "@"
/// end_token = "@"
/// tokens = [
///   { key = "DATE", value = "2024-01-01" },
///   { key = "DEBUG", value = "true", if = false },
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceTokensConfig {
	/// Character that opens a token reference. Defaults to `@`.
	#[serde(default = "default_delimiter")]
	pub begin_token: String,
	/// Character that closes a token reference. Defaults to `@`.
	#[serde(default = "default_delimiter")]
	pub end_token: String,
	/// Token definitions. Only entries whose conditions hold are used.
	#[serde(default)]
	pub tokens: Vec<TokenEntry>,
}

impl Default for ReplaceTokensConfig {
	fn default() -> Self {
		Self {
			begin_token: default_delimiter(),
			end_token: default_delimiter(),
			tokens: Vec::new(),
		}
	}
}

/// A single token definition with optional `if` / `unless` conditions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenEntry {
	pub key: String,
	#[serde(default)]
	pub value: String,
	/// The entry is only used when this holds.
	#[serde(default = "default_true")]
	pub r#if: bool,
	/// The entry is skipped when this holds.
	#[serde(default)]
	pub unless: bool,
}

impl TokenEntry {
	pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			value: value.into(),
			r#if: true,
			unless: false,
		}
	}

	pub fn is_active(&self) -> bool {
		self.r#if && !self.unless
	}
}

/// Configuration for the `expandProperties` filter. Properties declared here
/// take precedence over the global `[properties]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpandPropertiesConfig {
	#[serde(default)]
	pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceStringConfig {
	pub from: String,
	#[serde(default)]
	pub to: String,
	#[serde(default)]
	pub ignore_case: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceCharacterConfig {
	pub chr: String,
	pub with: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StripCharactersConfig {
	pub chars: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TabsToSpacesConfig {
	#[serde(default = "default_tab_length")]
	pub tab_length: u32,
}

impl Default for TabsToSpacesConfig {
	fn default() -> Self {
		Self {
			tab_length: DEFAULT_TAB_LENGTH,
		}
	}
}

/// A typed filter specification: one variant per [`FilterKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FilterSpec {
	ReplaceTokens(ReplaceTokensConfig),
	ExpandProperties(ExpandPropertiesConfig),
	ReplaceString(ReplaceStringConfig),
	ReplaceCharacter(ReplaceCharacterConfig),
	StripCharacters(StripCharactersConfig),
	TabsToSpaces(TabsToSpacesConfig),
}

impl FilterSpec {
	/// Validate the configuration and turn it into a reusable plan step.
	fn prepare(&self) -> SieveResult<PlanStep> {
		let step = match self {
			Self::ReplaceTokens(config) => {
				let delimiters = Delimiters::new(
					single_char("begin_token", &config.begin_token)?,
					single_char("end_token", &config.end_token)?,
				)?;
				let table = TokenTable::new(
					config
						.tokens
						.iter()
						.filter(|entry| entry.is_active())
						.map(|entry| (entry.key.as_str(), entry.value.as_str())),
				)?;

				for key in table.keys() {
					if key.contains(delimiters.begin()) || key.contains(delimiters.end()) {
						tracing::warn!(
							token = %key,
							"token key contains a delimiter and can never be matched"
						);
					}
				}

				PlanStep::ReplaceTokens {
					table: Arc::new(table),
					delimiters,
				}
			}
			Self::ExpandProperties(config) => {
				PlanStep::ExpandProperties {
					properties: Arc::new(Properties::new(config.properties.clone())),
				}
			}
			Self::ReplaceString(config) => {
				if config.from.is_empty() {
					return Err(SieveError::EmptySearchString);
				}

				PlanStep::ReplaceString {
					needle: config.from.chars().collect(),
					replacement: Arc::from(config.to.as_str()),
					ignore_case: config.ignore_case,
				}
			}
			Self::ReplaceCharacter(config) => {
				PlanStep::ReplaceCharacter {
					from: single_char("chr", &config.chr)?,
					to: single_char("with", &config.with)?,
				}
			}
			Self::StripCharacters(config) => {
				if config.chars.is_empty() {
					return Err(SieveError::EmptyCharacterSet);
				}

				PlanStep::StripCharacters {
					chars: Arc::new(config.chars.chars().collect()),
				}
			}
			Self::TabsToSpaces(config) => {
				if !(1..=100).contains(&config.tab_length) {
					return Err(SieveError::InvalidTabLength(config.tab_length));
				}

				PlanStep::TabsToSpaces {
					tab_length: config.tab_length as usize,
				}
			}
		};

		Ok(step)
	}
}

/// Parse a configuration value that must hold exactly one character.
fn single_char(field: &str, value: &str) -> SieveResult<char> {
	let mut chars = value.chars();
	match (chars.next(), chars.next()) {
		(None | Some('\0'), _) => {
			Err(SieveError::UnsetCharacter {
				field: field.to_string(),
			})
		}
		(Some(ch), None) => Ok(ch),
		(Some(_), Some(_)) => {
			Err(SieveError::InvalidCharacter {
				field: field.to_string(),
				value: value.to_string(),
			})
		}
	}
}

/// A validated, prepared filter stage. Shared data lives behind `Arc` so a
/// plan can stamp out any number of independent chains.
#[derive(Debug, Clone)]
enum PlanStep {
	ReplaceTokens {
		table: Arc<TokenTable>,
		delimiters: Delimiters,
	},
	ExpandProperties {
		properties: Arc<Properties>,
	},
	ReplaceString {
		needle: Arc<[char]>,
		replacement: Arc<str>,
		ignore_case: bool,
	},
	ReplaceCharacter {
		from: char,
		to: char,
	},
	StripCharacters {
		chars: Arc<HashSet<char>>,
	},
	TabsToSpaces {
		tab_length: usize,
	},
}

impl PlanStep {
	fn kind(&self) -> FilterKind {
		match self {
			Self::ReplaceTokens { .. } => FilterKind::ReplaceTokens,
			Self::ExpandProperties { .. } => FilterKind::ExpandProperties,
			Self::ReplaceString { .. } => FilterKind::ReplaceString,
			Self::ReplaceCharacter { .. } => FilterKind::ReplaceCharacter,
			Self::StripCharacters { .. } => FilterKind::StripCharacters,
			Self::TabsToSpaces { .. } => FilterKind::TabsToSpaces,
		}
	}

	/// Wrap `upstream` in a fresh stage of this kind.
	fn wrap<'a>(&self, upstream: Stage<'a>) -> Stage<'a> {
		let upstream = Box::new(upstream);

		match self {
			Self::ReplaceTokens { table, delimiters } => {
				Stage::ReplaceTokens(ReplaceTokens::new(upstream, Arc::clone(table), *delimiters))
			}
			Self::ExpandProperties { properties } => {
				Stage::ExpandProperties(ExpandProperties::new(upstream, Arc::clone(properties)))
			}
			Self::ReplaceString {
				needle,
				replacement,
				ignore_case,
			} => {
				Stage::ReplaceString(ReplaceString::new(
					upstream,
					Arc::clone(needle),
					Arc::clone(replacement),
					*ignore_case,
				))
			}
			Self::ReplaceCharacter { from, to } => {
				Stage::ReplaceCharacter(ReplaceCharacter::new(upstream, *from, *to))
			}
			Self::StripCharacters { chars } => {
				Stage::StripCharacters(StripCharacters::new(upstream, Arc::clone(chars)))
			}
			Self::TabsToSpaces { tab_length } => {
				Stage::TabsToSpaces(TabsToSpaces::new(upstream, *tab_length))
			}
		}
	}
}

/// A validated, reusable recipe for building filter chains.
///
/// All configuration checks happen in [`FilterPlan::new`], so applying a
/// plan to a source can never fail. Token tables and property maps are
/// built once and shared read-only between the chains a plan produces.
#[derive(Debug, Clone, Default)]
pub struct FilterPlan {
	steps: Vec<PlanStep>,
}

impl FilterPlan {
	pub fn new(specs: &[FilterSpec]) -> SieveResult<Self> {
		let steps = specs
			.iter()
			.map(FilterSpec::prepare)
			.collect::<SieveResult<Vec<_>>>()?;

		tracing::debug!(
			stages = steps.len(),
			filters = ?steps.iter().map(PlanStep::kind).collect::<Vec<_>>(),
			"prepared filter plan"
		);

		Ok(Self { steps })
	}

	/// The filter kinds in the order characters flow through them.
	pub fn kinds(&self) -> Vec<FilterKind> {
		self.steps.iter().map(PlanStep::kind).collect()
	}

	pub fn len(&self) -> usize {
		self.steps.len()
	}

	pub fn is_empty(&self) -> bool {
		self.steps.is_empty()
	}

	/// Build an independent chain reading from `source`.
	pub fn apply<'a>(&self, source: impl CharStream + 'a) -> FilterChain<'a> {
		let mut head = Stage::Source(Box::new(source));
		for step in &self.steps {
			head = step.wrap(head);
		}

		FilterChain {
			head,
			kinds: self.kinds(),
		}
	}
}

type Upstream<'a> = Box<Stage<'a>>;

/// One link of a filter chain. Each filter stage owns the stage before it.
pub enum Stage<'a> {
	Source(Box<dyn CharStream + 'a>),
	ReplaceTokens(ReplaceTokens<Upstream<'a>>),
	ExpandProperties(ExpandProperties<Upstream<'a>>),
	ReplaceString(ReplaceString<Upstream<'a>>),
	ReplaceCharacter(ReplaceCharacter<Upstream<'a>>),
	StripCharacters(StripCharacters<Upstream<'a>>),
	TabsToSpaces(TabsToSpaces<Upstream<'a>>),
}

impl CharStream for Stage<'_> {
	fn next_char(&mut self) -> Option<char> {
		match self {
			Self::Source(stage) => stage.next_char(),
			Self::ReplaceTokens(stage) => stage.next_char(),
			Self::ExpandProperties(stage) => stage.next_char(),
			Self::ReplaceString(stage) => stage.next_char(),
			Self::ReplaceCharacter(stage) => stage.next_char(),
			Self::StripCharacters(stage) => stage.next_char(),
			Self::TabsToSpaces(stage) => stage.next_char(),
		}
	}

	fn peek_char(&mut self) -> SieveResult<Option<char>> {
		match self {
			Self::Source(stage) => stage.peek_char(),
			Self::ReplaceTokens(stage) => stage.peek_char(),
			Self::ExpandProperties(stage) => stage.peek_char(),
			Self::ReplaceString(stage) => stage.peek_char(),
			Self::ReplaceCharacter(stage) => stage.peek_char(),
			Self::StripCharacters(stage) => stage.peek_char(),
			Self::TabsToSpaces(stage) => stage.peek_char(),
		}
	}

	fn name(&self) -> &'static str {
		match self {
			Self::Source(stage) => stage.name(),
			Self::ReplaceTokens(stage) => stage.name(),
			Self::ExpandProperties(stage) => stage.name(),
			Self::ReplaceString(stage) => stage.name(),
			Self::ReplaceCharacter(stage) => stage.name(),
			Self::StripCharacters(stage) => stage.name(),
			Self::TabsToSpaces(stage) => stage.name(),
		}
	}
}

/// A composed sequence of filters exposing a single pull interface.
///
/// Characters flow from the source through each stage in order. The chain
/// is also an [`Iterator`] over its output.
pub struct FilterChain<'a> {
	head: Stage<'a>,
	kinds: Vec<FilterKind>,
}

impl<'a> FilterChain<'a> {
	/// Validate `specs` and build a chain reading from `source`.
	pub fn build(source: impl CharStream + 'a, specs: &[FilterSpec]) -> SieveResult<Self> {
		Ok(FilterPlan::new(specs)?.apply(source))
	}

	/// Look at the next output character without consuming it.
	///
	/// Fails with [`SieveError::UnsupportedOperation`] when any stage in the
	/// chain buffers pending output, even if that stage would happen to
	/// have an answer right now.
	pub fn peek(&mut self) -> SieveResult<Option<char>> {
		if let Some(kind) = self.kinds.iter().find(|kind| !kind.supports_peek()) {
			return Err(SieveError::UnsupportedOperation {
				operation: "peek",
				filter: kind.as_str(),
			});
		}

		self.head.peek_char()
	}

	/// Drain the chain into a string.
	pub fn collect_string(self) -> String {
		self.collect()
	}
}

impl CharStream for FilterChain<'_> {
	fn next_char(&mut self) -> Option<char> {
		self.head.next_char()
	}

	fn peek_char(&mut self) -> SieveResult<Option<char>> {
		self.peek()
	}

	fn name(&self) -> &'static str {
		"filterChain"
	}
}

impl Iterator for FilterChain<'_> {
	type Item = char;

	fn next(&mut self) -> Option<char> {
		self.head.next_char()
	}
}

/// Filter `input` through `specs` and collect the result.
pub fn filter_str(input: &str, specs: &[FilterSpec]) -> SieveResult<String> {
	let chain = FilterChain::build(crate::stream::CharSource::from_text(input), specs)?;
	Ok(chain.collect_string())
}
