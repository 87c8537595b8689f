use std::path::PathBuf;

use clap::Parser;
use rstest::rstest;
use sieve_cli::Commands;
use sieve_cli::OutputFormat;
use sieve_cli::SieveCli;
use similar_asserts::assert_eq;

#[rstest]
#[case::default_text(vec!["sieve", "check"], OutputFormat::Text)]
#[case::json(vec!["sieve", "check", "--format", "json"], OutputFormat::Json)]
fn parses_check_format(#[case] argv: Vec<&str>, #[case] expected: OutputFormat) {
	let cli = SieveCli::try_parse_from(argv).expect("arguments should parse");
	let Some(Commands::Check { format }) = cli.command else {
		panic!("expected the check command");
	};
	assert_eq!(format, expected);
}

#[test]
fn global_flags_follow_the_subcommand() {
	let cli = SieveCli::try_parse_from([
		"sieve", "copy", "in", "out", "--config", "custom.toml", "-v", "--no-color",
	])
	.expect("arguments should parse");

	assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
	assert!(cli.verbose);
	assert!(cli.no_color);
	assert!(matches!(
		cli.command,
		Some(Commands::Copy { ref source, ref destination })
			if source == &PathBuf::from("in") && destination == &PathBuf::from("out")
	));
}

#[test]
fn filter_input_is_optional() {
	let cli = SieveCli::try_parse_from(["sieve", "filter"]).expect("arguments should parse");
	assert!(matches!(cli.command, Some(Commands::Filter { input: None })));
}

#[test]
fn copy_requires_a_destination() {
	assert!(SieveCli::try_parse_from(["sieve", "copy", "in"]).is_err());
}
