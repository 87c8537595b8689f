//! `sieve_core` is the streaming text filter engine behind the `sieve` copy
//! tool. Files are copied one character at a time through a chain of filters
//! that rewrite the text as it passes, without ever holding a whole file in
//! memory.
//!
//! ## Processing Pipeline
//!
//! ```text
//! sieve.toml
//!   → SieveConfig (typed [[filters]] tables)
//!   → FilterPlan (validated once, shared token tables)
//!   → FilterChain (one per file, pull based)
//!   → copy_file / copy_tree (drains the chain into the destination)
//! ```
//!
//! ## Modules
//!
//! - [`stream`]: The [`CharStream`] pull contract plus in-memory and reader
//!   backed sources.
//! - [`replace_tokens`]: Delimited token substitution (`@KEY@`) with a
//!   bounded look-ahead.
//! - [`chain`]: Filter specifications, validated plans and composed chains.
//! - [`config`]: Loading `sieve.toml`.
//! - [`copy`]: Copying files and directory trees through a plan.
//!
//! ## Quick Start
//!
//! ```rust
//! use sieve_core::FilterSpec;
//! use sieve_core::ReplaceTokensConfig;
//! use sieve_core::TokenEntry;
//! use sieve_core::filter_str;
//!
//! let spec = FilterSpec::ReplaceTokens(ReplaceTokensConfig {
//! 	tokens: vec![TokenEntry::new("DATE", "2024-01-01")],
//! 	..ReplaceTokensConfig::default()
//! });
//!
//! let output = filter_str("built on @DATE@", &[spec]).unwrap();
//! assert_eq!(output, "built on 2024-01-01");
//! ```

pub use chain::*;
pub use config::*;
pub use copy::*;
pub use error::*;
pub use expand_properties::*;
pub use filters::*;
pub use replace_string::*;
pub use replace_tokens::*;
pub use stream::*;
pub use token_table::*;

pub mod chain;
pub mod config;
pub mod copy;
#[allow(unused_assignments)]
mod error;
mod expand_properties;
mod filters;
mod replace_string;
pub mod replace_tokens;
mod staged;
pub mod stream;
mod token_table;

#[cfg(test)]
mod __fixtures;
