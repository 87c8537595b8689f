mod common;

use sieve_core::AnyEmptyResult;

#[test]
fn filter_reads_stdin_and_writes_stdout() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("sieve.toml"), common::TOKEN_CONFIG)?;

	common::sieve_cmd()
		.arg("filter")
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("built @DATE@ for v${version}\n")
		.assert()
		.success()
		.stdout("built 2024-01-01 for v1.2.3\n");

	Ok(())
}

#[test]
fn filter_reads_a_file_argument() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("sieve.toml"), common::TOKEN_CONFIG)?;
	std::fs::write(tmp.path().join("input.txt"), "@FOO@ @DATE@")?;

	common::sieve_cmd()
		.arg("filter")
		.arg(tmp.path().join("input.txt"))
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("@FOO@ 2024-01-01");

	Ok(())
}

#[test]
fn filter_uses_explicit_config_path() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let config_path = tmp.path().join("custom.toml");
	std::fs::write(
		&config_path,
		"[[filters]]\ntype = \"replaceCharacter\"\nchr = \"/\"\nwith = \"\\\\\"\n",
	)?;

	common::sieve_cmd()
		.arg("filter")
		.arg("--path")
		.arg(tmp.path())
		.arg("--config")
		.arg(&config_path)
		.write_stdin("a/b/c")
		.assert()
		.success()
		.stdout("a\\b\\c");

	Ok(())
}

#[test]
fn filter_without_config_is_identity() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::sieve_cmd()
		.arg("filter")
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("@DATE@ stays\n")
		.assert()
		.success()
		.stdout("@DATE@ stays\n");

	Ok(())
}

#[test]
fn filter_rejects_unknown_filter_types() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("sieve.toml"),
		"[[filters]]\ntype = \"shout\"\n",
	)?;

	common::sieve_cmd()
		.arg("filter")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stdout("")
		.stderr(predicates::str::contains("unknown filter: `shout`"));

	Ok(())
}

#[test]
fn filter_reports_invalid_utf8_after_partial_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::sieve_cmd()
		.arg("filter")
		.arg("--path")
		.arg(tmp.path())
		.write_stdin(b"ok\xFFrest".to_vec())
		.assert()
		.code(2)
		.stdout("ok")
		.stderr(predicates::str::contains("invalid UTF-8"));

	Ok(())
}
