#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;

pub const SAMPLE_SOURCE: &str = "a\n##@begin unitA\nexport x = block().add(\"hello\\nworld\");\n##@end\n  \
                                 ##@import x _ unitA\nb";

pub const SAMPLE_OUTPUT: &str = "a\n\n  hello\n  world\nb";

pub fn bmx_cmd() -> Command {
	let mut cmd = Command::new(env!("CARGO_BIN_EXE_bmx"));
	cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
	cmd
}

pub fn write(dir: &Path, name: &str, content: &str) -> std::io::Result<()> {
	if let Some(parent) = dir.join(name).parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(dir.join(name), content)
}
