use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use sieve_cli::Commands;
use sieve_cli::OutputFormat;
use sieve_cli::SieveCli;
use sieve_core::AnyEmptyResult;
use sieve_core::AnyResult;
use sieve_core::CopyOptions;
use sieve_core::FilterKind;
use sieve_core::FilterPlan;
use sieve_core::SieveConfig;
use sieve_core::SieveError;
use sieve_core::copy_file;
use sieve_core::copy_tree;
use sieve_core::filter_to_writer;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = SieveCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Filter { input }) => run_filter(&args, input.as_deref()),
		Some(Commands::Copy {
			source,
			destination,
		}) => run_copy(&args, source, destination),
		Some(Commands::Check { format }) => run_check(&args, *format),
		None => {
			eprintln!("No subcommand specified. Run `sieve --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Render library errors through miette for codes and help text.
		match e.downcast::<SieveError>() {
			Ok(sieve_err) => {
				let report: miette::Report = (*sieve_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr. `RUST_LOG` wins over the verbosity flag.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.init();
}

fn resolve_root(args: &SieveCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Load the explicit `--config`, or discover one below the project root.
/// Without any config the filters are empty and files are copied verbatim.
fn load_config(args: &SieveCli) -> AnyResult<SieveConfig> {
	if let Some(path) = &args.config {
		return Ok(SieveConfig::load_file(path)?);
	}

	let root = resolve_root(args);
	match SieveConfig::load(&root)? {
		Some(config) => Ok(config),
		None => {
			if args.verbose {
				eprintln!(
					"No config found in {}; copying without filters.",
					root.display()
				);
			}
			Ok(SieveConfig::default())
		}
	}
}

fn run_filter(args: &SieveCli, input: Option<&Path>) -> AnyEmptyResult {
	let plan = load_config(args)?.plan()?;
	let stdout = std::io::stdout();

	match input {
		Some(path) if path != Path::new("-") => {
			let reader = BufReader::new(File::open(path)?);
			filter_to_writer(reader, stdout.lock(), &plan)?;
		}
		_ => {
			filter_to_writer(std::io::stdin().lock(), stdout.lock(), &plan)?;
		}
	}

	Ok(())
}

fn run_copy(args: &SieveCli, source: &Path, destination: &Path) -> AnyEmptyResult {
	let config = load_config(args)?;
	let plan = config.plan()?;

	if source.is_dir() {
		let options = CopyOptions::from_config(Some(&config.copy))?;
		let report = copy_tree(source, destination, &plan, &options)?;

		if args.verbose {
			for file in &report.files {
				println!(
					"  {} -> {}",
					file.source.display(),
					file.destination.display()
				);
			}
		}

		println!(
			"{} {} file(s) ({} characters) to {}",
			colored!("Copied", green),
			report.file_count(),
			report.chars_written(),
			destination.display()
		);
		return Ok(());
	}

	let target = single_file_target(source, destination);
	let written = copy_file(source, &target, &plan)?;
	println!(
		"{} {} -> {} ({written} characters)",
		colored!("Copied", green),
		source.display(),
		target.display()
	);

	Ok(())
}

/// A file copied onto an existing directory keeps its name.
fn single_file_target(source: &Path, destination: &Path) -> PathBuf {
	match source.file_name() {
		Some(name) if destination.is_dir() => destination.join(name),
		_ => destination.to_path_buf(),
	}
}

fn run_check(args: &SieveCli, format: OutputFormat) -> AnyEmptyResult {
	let config_path = match &args.config {
		Some(path) => path.clone(),
		None => {
			let root = resolve_root(args);
			SieveConfig::resolve_path(&root).ok_or_else(|| {
				SieveError::ConfigNotFound {
					path: root.display().to_string(),
				}
			})?
		}
	};

	let outcome = SieveConfig::load_file(&config_path)
		.and_then(|config| config.plan().map(|plan| (config, plan)));

	match outcome {
		Ok((config, plan)) => {
			print_check_passed(&config_path, &config, &plan, format)?;
			Ok(())
		}
		Err(e) if e.is_configuration_error() => {
			print_check_failed(&config_path, e, format)?;
			process::exit(1);
		}
		Err(e) => Err(e.into()),
	}
}

fn print_check_passed(
	config_path: &Path,
	config: &SieveConfig,
	plan: &FilterPlan,
	format: OutputFormat,
) -> AnyEmptyResult {
	let filters: Vec<&str> = plan.kinds().into_iter().map(FilterKind::as_str).collect();

	match format {
		OutputFormat::Json => {
			let output = serde_json::json!({
				"ok": true,
				"config": config_path.display().to_string(),
				"filters": filters,
				"properties": config.properties.len(),
			});
			println!("{}", serde_json::to_string_pretty(&output)?);
		}
		OutputFormat::Text => {
			println!("Config: {}", config_path.display());
			println!("{}", colored!("Filters:", bold));
			if filters.is_empty() {
				println!("  (none, files are copied verbatim)");
			}
			for (index, name) in filters.iter().enumerate() {
				println!("  {}. {name}", index + 1);
			}
			println!("Properties: {}", config.properties.len());
			println!(
				"{} {} filter(s) ready.",
				colored!("Check passed:", green),
				filters.len()
			);
		}
	}

	Ok(())
}

fn print_check_failed(
	config_path: &Path,
	error: SieveError,
	format: OutputFormat,
) -> AnyEmptyResult {
	match format {
		OutputFormat::Json => {
			let output = serde_json::json!({
				"ok": false,
				"config": config_path.display().to_string(),
				"error": error.to_string(),
			});
			println!("{}", serde_json::to_string_pretty(&output)?);
		}
		OutputFormat::Text => {
			eprintln!(
				"{} {}",
				colored!("Check failed:", red),
				config_path.display()
			);
			let report: miette::Report = error.into();
			eprintln!("{report:?}");
		}
	}

	Ok(())
}
