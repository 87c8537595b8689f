mod common;

use serde_json::Value;
use sieve_core::AnyEmptyResult;

#[test]
fn check_lists_filters_in_order() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("sieve.toml"), common::TOKEN_CONFIG)?;

	common::sieve_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"  1. replaceTokens\n  2. expandProperties",
		))
		.stdout(predicates::str::contains("Check passed: 2 filter(s) ready."));

	Ok(())
}

#[test]
fn check_json_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("sieve.toml"), common::TOKEN_CONFIG)?;

	let output = common::sieve_cmd()
		.arg("check")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.output()?;

	assert!(output.status.success());
	let json: Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(json["ok"], Value::Bool(true));
	assert_eq!(
		json["filters"],
		serde_json::json!(["replaceTokens", "expandProperties"])
	);
	assert_eq!(json["properties"], serde_json::json!(1));

	Ok(())
}

#[test]
fn check_resolves_dot_config_sieve_toml() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join(".config"))?;
	std::fs::write(tmp.path().join(".config/sieve.toml"), "")?;

	let expected_path = tmp.path().join(".config/sieve.toml").display().to_string();

	common::sieve_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(expected_path))
		.stdout(predicates::str::contains("(none, files are copied verbatim)"));

	Ok(())
}

#[test]
fn check_fails_for_invalid_filter_configuration() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("sieve.toml"),
		"[[filters]]\ntype = \"replaceTokens\"\ntokens = []\n",
	)?;

	common::sieve_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("Check failed:"))
		.stderr(predicates::str::contains("no active tokens"));

	Ok(())
}

#[test]
fn check_json_reports_failure() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("sieve.toml"),
		"[[filters]]\ntype = \"tabsToSpaces\"\ntab_length = 0\n",
	)?;

	let output = common::sieve_cmd()
		.arg("check")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.output()?;

	assert_eq!(output.status.code(), Some(1));
	let json: Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(json["ok"], Value::Bool(false));
	assert_eq!(
		json["error"],
		Value::String("`tab_length` must be between 1 and 100, got 0".to_string())
	);

	Ok(())
}

#[test]
fn check_without_config_is_an_error() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::sieve_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("no configuration file found"));

	Ok(())
}
