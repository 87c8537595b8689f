use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Copy files through streaming token and text filters.",
	long_about = "sieve copies files one character at a time through a chain of filters \
	              declared in sieve.toml, replacing @TOKEN@ markers, ${property} references \
	              and other text on the way.\n\nQuick start:\n  sieve check            \
	              Validate the filter configuration\n  sieve filter <file>    Print a filtered \
	              file\n  sieve copy <src> <dst> Copy a file or directory through the filters"
)]
pub struct SieveCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory. Used to discover `sieve.toml`.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Explicit config file. Skips discovery.
	#[arg(long, short, global = true)]
	pub config: Option<PathBuf>,

	/// Enable verbose output and debug logging.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Filter a single input and print the result to stdout.
	///
	/// Reads from stdin when no input file is given (or the input is `-`).
	Filter {
		/// File to filter.
		input: Option<PathBuf>,
	},
	/// Copy a file or directory through the configured filters.
	///
	/// Directories are copied recursively, preserving relative paths and
	/// honouring `.gitignore` plus the `[copy]` include and exclude patterns.
	/// When the destination of a single-file copy is an existing directory,
	/// the file keeps its name inside it.
	Copy {
		/// Source file or directory.
		source: PathBuf,
		/// Destination file or directory.
		destination: PathBuf,
	},
	/// Validate the configuration without copying anything.
	///
	/// Loads the config, builds every filter and reports the resulting
	/// chain. Exits with a non-zero status code when the configuration is
	/// invalid.
	Check {
		/// Output format for check results. Use `text` for human-readable
		/// output or `json` for programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
