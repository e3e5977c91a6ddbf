mod common;

use bmx_core::AnyEmptyResult;
use common::SAMPLE_OUTPUT;
use common::SAMPLE_SOURCE;
use common::write;
use predicates::prelude::PredicateBooleanExt;
use rstest::rstest;
use similar_asserts::assert_eq;

#[test]
fn build_writes_expanded_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(tmp.path(), "in.rs", SAMPLE_SOURCE)?;

	common::bmx_cmd()
		.arg("build")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("out.rs"))
		.assert()
		.success()
		.stdout(predicates::str::contains("1 unit(s), 1 import(s)"));

	let output = std::fs::read_to_string(tmp.path().join("out.rs"))?;
	assert_eq!(output, SAMPLE_OUTPUT);

	Ok(())
}

#[test]
fn build_replaces_existing_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(tmp.path(), "in.rs", SAMPLE_SOURCE)?;
	write(tmp.path(), "out.rs", "stale content")?;

	common::bmx_cmd()
		.arg("build")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("out.rs"))
		.assert()
		.success();

	let output = std::fs::read_to_string(tmp.path().join("out.rs"))?;
	assert_eq!(output, SAMPLE_OUTPUT);

	Ok(())
}

#[test]
fn build_dry_run_prints_without_writing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(tmp.path(), "in.rs", SAMPLE_SOURCE)?;

	common::bmx_cmd()
		.arg("build")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("out.rs"))
		.arg("--dry-run")
		.assert()
		.success()
		.stdout(SAMPLE_OUTPUT);

	assert!(!tmp.path().join("out.rs").exists());

	Ok(())
}

#[test]
fn build_unit_not_found_writes_nothing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(tmp.path(), "in.rs", "x\n##@ import block1 _ unitA\ny")?;

	common::bmx_cmd()
		.arg("build")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("out.rs"))
		.assert()
		.code(2)
		.stderr(predicates::str::contains("unitA").and(predicates::str::contains("unit_not_found")));

	assert!(!tmp.path().join("out.rs").exists());

	Ok(())
}

#[test]
fn build_unknown_directive_keeps_existing_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(tmp.path(), "in.rs", "a\n##@foo bar\nb")?;
	write(tmp.path(), "out.rs", "previous")?;

	common::bmx_cmd()
		.arg("build")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("out.rs"))
		.assert()
		.code(2)
		.stderr(predicates::str::contains("unknown directive `foo`"));

	assert_eq!(std::fs::read_to_string(tmp.path().join("out.rs"))?, "previous");

	Ok(())
}

#[test]
fn build_script_error_writes_nothing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(
		tmp.path(),
		"in.rs",
		"##@begin broken\nexport x = fetch(\"url\");\n##@end\n##@import x _ broken",
	)?;

	common::bmx_cmd()
		.arg("build")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("out.rs"))
		.assert()
		.code(2)
		.stderr(predicates::str::contains("broken"));

	assert!(!tmp.path().join("out.rs").exists());

	Ok(())
}

#[rstest]
#[case::huge_spacing("##@begin u\nexport x = block(spacing: 99999999999).add(\"a\").add(\"b\");\n##@end\n##@import x _ u")]
#[case::deep_nesting(&format!(
	"##@begin u\nexport x = block(){};\n##@end\n##@import x _ u",
	".add(\"a\")".repeat(50_000)
))]
fn hostile_unit_bodies_fail_cleanly(#[case] source: &str) -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(tmp.path(), "in.rs", source)?;

	common::bmx_cmd()
		.arg("build")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("out.rs"))
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to evaluate unit `u`"));

	assert!(!tmp.path().join("out.rs").exists());

	Ok(())
}

#[rstest]
#[case::build_without_output(&["build", "in.rs"])]
#[case::build_without_paths(&["build"])]
#[case::check_without_output(&["check", "in.rs"])]
#[case::list_without_source(&["list"])]
fn missing_path_arguments_are_usage_errors(#[case] args: &[&str]) -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(tmp.path(), "in.rs", SAMPLE_SOURCE)?;

	common::bmx_cmd()
		.current_dir(tmp.path())
		.args(args)
		.assert()
		.code(2)
		.stderr(predicates::str::contains("Usage"));

	assert_eq!(std::fs::read_dir(tmp.path())?.count(), 1);

	Ok(())
}

#[test]
fn build_missing_source_file_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::bmx_cmd()
		.arg("build")
		.arg(tmp.path().join("missing.rs"))
		.arg(tmp.path().join("out.rs"))
		.assert()
		.code(2);

	assert!(!tmp.path().join("out.rs").exists());

	Ok(())
}

#[test]
fn build_uses_discovered_config_marker() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(tmp.path(), "bmx.toml", "marker = \"//@\"\n")?;
	write(
		tmp.path(),
		"in.rs",
		"//@begin u\nexport x = block().add(\"v\");\n//@end\n\t//@import x _ u",
	)?;

	common::bmx_cmd()
		.arg("build")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("out.rs"))
		.assert()
		.success();

	assert_eq!(std::fs::read_to_string(tmp.path().join("out.rs"))?, "\n\n\tv\n");

	Ok(())
}

#[test]
fn build_marker_flag_overrides_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(tmp.path(), ".config/bmx.toml", "marker = \"//@\"\n")?;
	write(
		tmp.path(),
		"in.rs",
		"#%begin u\nexport x = block().add(\"v\");\n#%end\n#%import x _ u",
	)?;

	common::bmx_cmd()
		.arg("build")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("out.rs"))
		.arg("--marker")
		.arg("#%")
		.assert()
		.success();

	assert_eq!(std::fs::read_to_string(tmp.path().join("out.rs"))?, "\n\nv\n");

	Ok(())
}

#[test]
fn build_explicit_config_path() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(tmp.path(), "settings/custom.toml", "marker = \"@@\"\nparallel = false\n")?;
	write(tmp.path(), "in.rs", "@@begin u\nexport x = block();\n@@end\nkept")?;

	common::bmx_cmd()
		.arg("--config")
		.arg(tmp.path().join("settings/custom.toml"))
		.arg("build")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("out.rs"))
		.assert()
		.success();

	assert_eq!(std::fs::read_to_string(tmp.path().join("out.rs"))?, "\nkept");

	Ok(())
}

#[test]
fn build_invalid_config_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(tmp.path(), "bmx.toml", "unknown = 1\n")?;
	write(tmp.path(), "in.rs", SAMPLE_SOURCE)?;

	common::bmx_cmd()
		.arg("build")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("out.rs"))
		.assert()
		.code(2)
		.stderr(predicates::str::contains("config"));

	assert!(!tmp.path().join("out.rs").exists());

	Ok(())
}

#[test]
fn build_sequential_matches_parallel() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let mut source = String::from(
		"##@begin u\nlet b = block(spacing: 1);\nb.add(\"one\");\nb.add(\"  two\");\nexport \
		 b;\n##@end\n",
	);
	for depth in 0..16 {
		source.push_str(&" ".repeat(depth));
		source.push_str("##@import b _ u\n");
	}
	write(tmp.path(), "in.rs", &source)?;

	common::bmx_cmd()
		.arg("build")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("parallel.rs"))
		.assert()
		.success();
	common::bmx_cmd()
		.arg("--sequential")
		.arg("build")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("sequential.rs"))
		.assert()
		.success();

	let parallel = std::fs::read_to_string(tmp.path().join("parallel.rs"))?;
	let sequential = std::fs::read_to_string(tmp.path().join("sequential.rs"))?;
	assert_eq!(parallel, sequential);
	assert!(parallel.contains("               one\n               \n               two"));

	Ok(())
}

#[test]
fn build_verbose_logs_evaluation() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(tmp.path(), "in.rs", SAMPLE_SOURCE)?;

	common::bmx_cmd()
		.arg("--verbose")
		.arg("build")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("out.rs"))
		.assert()
		.success()
		.stderr(predicates::str::contains("evaluating unit"));

	Ok(())
}
