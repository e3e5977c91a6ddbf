mod common;

use bmx_core::AnyEmptyResult;
use common::SAMPLE_OUTPUT;
use common::SAMPLE_SOURCE;
use common::write;
use predicates::prelude::PredicateBooleanExt;

#[test]
fn check_passes_when_up_to_date() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(tmp.path(), "in.rs", SAMPLE_SOURCE)?;
	write(tmp.path(), "out.rs", SAMPLE_OUTPUT)?;

	common::bmx_cmd()
		.arg("check")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("out.rs"))
		.assert()
		.success()
		.stdout(predicates::str::contains("up to date"));

	Ok(())
}

#[test]
fn check_passes_after_build() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(tmp.path(), "in.rs", SAMPLE_SOURCE)?;

	common::bmx_cmd()
		.arg("build")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("out.rs"))
		.assert()
		.success();
	common::bmx_cmd()
		.arg("check")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("out.rs"))
		.assert()
		.success();

	Ok(())
}

#[test]
fn check_fails_when_stale() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(tmp.path(), "in.rs", SAMPLE_SOURCE)?;
	write(tmp.path(), "out.rs", "a\n\n  hello\nb")?;

	common::bmx_cmd()
		.arg("check")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("out.rs"))
		.assert()
		.code(1)
		.stderr(predicates::str::contains("out of date").and(predicates::str::contains("bmx build")));

	// Checking never modifies the output.
	assert_eq!(
		std::fs::read_to_string(tmp.path().join("out.rs"))?,
		"a\n\n  hello\nb"
	);

	Ok(())
}

#[test]
fn check_fails_when_output_missing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(tmp.path(), "in.rs", SAMPLE_SOURCE)?;

	common::bmx_cmd()
		.arg("check")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("out.rs"))
		.assert()
		.code(1)
		.stderr(predicates::str::contains("does not exist"));

	assert!(!tmp.path().join("out.rs").exists());

	Ok(())
}

#[test]
fn check_diff_shows_changes() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(tmp.path(), "in.rs", SAMPLE_SOURCE)?;
	write(tmp.path(), "out.rs", "a\n\n  hello\n  planet\nb")?;

	common::bmx_cmd()
		.arg("check")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("out.rs"))
		.arg("--diff")
		.assert()
		.code(1)
		.stderr(
			predicates::str::contains("-  planet")
				.and(predicates::str::contains("+  world"))
				.and(predicates::str::contains("   a")),
		);

	Ok(())
}

#[test]
fn check_without_diff_hides_changes() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(tmp.path(), "in.rs", SAMPLE_SOURCE)?;
	write(tmp.path(), "out.rs", "a\n\n  hello\n  planet\nb")?;

	common::bmx_cmd()
		.arg("check")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("out.rs"))
		.assert()
		.code(1)
		.stderr(predicates::str::contains("planet").not());

	Ok(())
}

#[test]
fn check_expansion_error_exits_with_two() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write(tmp.path(), "in.rs", "##@begin u\nexport x = \"text\";\n##@end\n##@import x _ u")?;
	write(tmp.path(), "out.rs", "")?;

	common::bmx_cmd()
		.arg("check")
		.arg(tmp.path().join("in.rs"))
		.arg(tmp.path().join("out.rs"))
		.assert()
		.code(2)
		.stderr(predicates::str::contains("not a code block"));

	Ok(())
}
