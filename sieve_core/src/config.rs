use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::SieveError;
use crate::SieveResult;
use crate::chain::ExpandPropertiesConfig;
use crate::chain::FilterKind;
use crate::chain::FilterPlan;
use crate::chain::FilterSpec;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["sieve.toml", ".sieve.toml", ".config/sieve.toml"];

/// Configuration loaded from a `sieve.toml` file.
///
/// ```toml
/// [properties]
/// version = "1.2.3"
///
/// [copy]
/// include = ["**/*.txt"]
/// exclude = ["target/"]
/// disable_gitignore = false
///
/// [[filters]]
/// type = "replaceTokens"
/// tokens = [{ key = "DATE", value = "2024-01-01" }]
///
/// [[filters]]
/// type = "expandProperties"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SieveConfig {
	/// Values available to `expandProperties` filters as `${name}`.
	#[serde(default)]
	pub properties: BTreeMap<String, String>,
	/// File selection for directory copies.
	#[serde(default)]
	pub copy: CopyConfig,
	/// Filter tables in chain order. Each table is dispatched on its `type`
	/// field by [`SieveConfig::filter_specs`].
	#[serde(default)]
	pub filters: Vec<toml::Table>,
}

/// Configuration for selecting files during a directory copy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopyConfig {
	/// Glob patterns (relative to the source root) restricting which files
	/// are copied. Empty means every file.
	#[serde(default)]
	pub include: Vec<String>,
	/// Gitignore-style patterns for files and directories to skip.
	#[serde(default)]
	pub exclude: Vec<String>,
	/// When true, the source root's `.gitignore` is not consulted.
	#[serde(default)]
	pub disable_gitignore: bool,
}

impl FromStr for SieveConfig {
	type Err = SieveError;

	fn from_str(content: &str) -> Result<Self, Self::Err> {
		toml::from_str(content).map_err(|e| SieveError::ConfigParse(e.to_string()))
	}
}

impl SieveConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no candidate exists.
	pub fn load(root: &Path) -> SieveResult<Option<SieveConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		Self::load_file(&config_path).map(Some)
	}

	/// Load the config from an explicit path.
	pub fn load_file(path: &Path) -> SieveResult<SieveConfig> {
		let content = std::fs::read_to_string(path)?;
		let config = content.parse()?;
		tracing::debug!(path = %path.display(), "loaded config");
		Ok(config)
	}

	/// Turn every `[[filters]]` table into a typed [`FilterSpec`], in order.
	pub fn filter_specs(&self) -> SieveResult<Vec<FilterSpec>> {
		self.filters
			.iter()
			.map(|table| parse_filter_table(table, &self.properties))
			.collect()
	}

	/// Parse and validate the configured filters into a reusable plan.
	pub fn plan(&self) -> SieveResult<FilterPlan> {
		FilterPlan::new(&self.filter_specs()?)
	}
}

/// Convert one `[[filters]]` table into a typed [`FilterSpec`].
///
/// The `type` field selects the variant; unknown names fail with
/// [`SieveError::UnknownFilter`]. Global `properties` are merged into
/// `expandProperties` filters underneath any properties the filter declares
/// itself.
pub fn parse_filter_table(
	table: &toml::Table,
	properties: &BTreeMap<String, String>,
) -> SieveResult<FilterSpec> {
	let mut table = table.clone();
	let kind = match table.remove("type") {
		Some(toml::Value::String(name)) => name.parse::<FilterKind>()?,
		Some(other) => {
			return Err(SieveError::InvalidFilterConfig {
				filter: other.to_string(),
				reason: "`type` must be a string".to_string(),
			});
		}
		None => return Err(SieveError::MissingFilterType),
	};

	let spec = match kind {
		FilterKind::ReplaceTokens => FilterSpec::ReplaceTokens(deserialize_filter(kind, table)?),
		FilterKind::ExpandProperties => {
			let mut config: ExpandPropertiesConfig = deserialize_filter(kind, table)?;
			for (name, value) in properties {
				config
					.properties
					.entry(name.clone())
					.or_insert_with(|| value.clone());
			}
			FilterSpec::ExpandProperties(config)
		}
		FilterKind::ReplaceString => FilterSpec::ReplaceString(deserialize_filter(kind, table)?),
		FilterKind::ReplaceCharacter => {
			FilterSpec::ReplaceCharacter(deserialize_filter(kind, table)?)
		}
		FilterKind::StripCharacters => {
			FilterSpec::StripCharacters(deserialize_filter(kind, table)?)
		}
		FilterKind::TabsToSpaces => FilterSpec::TabsToSpaces(deserialize_filter(kind, table)?),
	};

	Ok(spec)
}

fn deserialize_filter<T: DeserializeOwned>(kind: FilterKind, table: toml::Table) -> SieveResult<T> {
	toml::Value::Table(table)
		.try_into()
		.map_err(|e: toml::de::Error| {
			SieveError::InvalidFilterConfig {
				filter: kind.to_string(),
				reason: e.to_string(),
			}
		})
}
