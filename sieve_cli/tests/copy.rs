mod common;

use predicates::prelude::PredicateBooleanExt;
use sieve_core::AnyEmptyResult;

#[test]
fn copy_single_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("sieve.toml"), common::TOKEN_CONFIG)?;
	std::fs::write(tmp.path().join("version.txt"), "v${version} @DATE@\n")?;
	let destination = tmp.path().join("out/version.txt");

	common::sieve_cmd()
		.arg("copy")
		.arg(tmp.path().join("version.txt"))
		.arg(&destination)
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Copied"));

	assert_eq!(
		std::fs::read_to_string(destination)?,
		"v1.2.3 2024-01-01\n"
	);

	Ok(())
}

#[test]
fn copy_file_into_existing_directory_keeps_name() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("sieve.toml"), common::TOKEN_CONFIG)?;
	std::fs::write(tmp.path().join("notes.txt"), "@DATE@")?;
	std::fs::create_dir_all(tmp.path().join("dist"))?;

	common::sieve_cmd()
		.arg("copy")
		.arg(tmp.path().join("notes.txt"))
		.arg(tmp.path().join("dist"))
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("dist/notes.txt"))?,
		"2024-01-01"
	);

	Ok(())
}

#[test]
fn copy_directory_tree() -> AnyEmptyResult {
	let project = tempfile::tempdir()?;
	let destination = tempfile::tempdir()?;
	let source = project.path().join("src");
	std::fs::create_dir_all(source.join("nested"))?;
	std::fs::create_dir_all(source.join("target"))?;
	std::fs::write(
		project.path().join("sieve.toml"),
		format!("{}\n[copy]\nexclude = [\"target/\"]\n", common::TOKEN_CONFIG),
	)?;
	std::fs::write(source.join("a.txt"), "@DATE@")?;
	std::fs::write(source.join("nested/b.txt"), "${version}")?;
	std::fs::write(source.join("target/skip.txt"), "@DATE@")?;

	common::sieve_cmd()
		.arg("copy")
		.arg(&source)
		.arg(destination.path())
		.arg("--path")
		.arg(project.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Copied 2 file(s)"));

	assert_eq!(
		std::fs::read_to_string(destination.path().join("a.txt"))?,
		"2024-01-01"
	);
	assert_eq!(
		std::fs::read_to_string(destination.path().join("nested/b.txt"))?,
		"1.2.3"
	);
	assert!(!destination.path().join("target").exists());

	Ok(())
}

#[test]
fn copy_verbose_lists_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let destination = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("docs"))?;
	std::fs::write(tmp.path().join("docs/guide.md"), "guide")?;

	common::sieve_cmd()
		.arg("copy")
		.arg(tmp.path().join("docs"))
		.arg(destination.path())
		.arg("--path")
		.arg(tmp.path())
		.arg("--verbose")
		.assert()
		.success()
		.stdout(predicates::str::contains("guide.md").and(predicates::str::contains("1 file(s)")))
		.stderr(predicates::str::contains("No config found"));

	Ok(())
}

#[test]
fn copy_missing_source_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::sieve_cmd()
		.arg("copy")
		.arg(tmp.path().join("missing.txt"))
		.arg(tmp.path().join("out.txt"))
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2);

	assert!(!tmp.path().join("out.txt").exists());

	Ok(())
}
