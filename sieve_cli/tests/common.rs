use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub const TOKEN_CONFIG: &str = r#"
[properties]
version = "1.2.3"

[[filters]]
type = "replaceTokens"
tokens = [{ key = "DATE", value = "2024-01-01" }]

[[filters]]
type = "expandProperties"
"#;

pub fn sieve_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("sieve"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("RUST_LOG");
	cmd
}
