use miette::Diagnostic;
use thiserror::Error;

use crate::script::ScriptError;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum BmxError {
	#[error(transparent)]
	#[diagnostic(code(bmx::io_error))]
	Io(#[from] std::io::Error),

	#[error("unknown directive `{command}` on line {line}")]
	#[diagnostic(
		code(bmx::unknown_directive),
		help("supported directives are `begin <name>`, `end` and `import <export> <reserved> <unit>`")
	)]
	UnknownDirective { command: String, line: usize },

	#[error("malformed `{command}` directive on line {line}: expected `{expected}`")]
	#[diagnostic(code(bmx::malformed_directive))]
	MalformedDirective {
		command: String,
		expected: String,
		line: usize,
	},

	#[error("unit `{unit}` not found (imported on line {line})")]
	#[diagnostic(
		code(bmx::unit_not_found),
		help("define the unit with a `begin {unit}` ... `end` region in the same file")
	)]
	UnitNotFound { unit: String, line: usize },

	#[error("export `{export}` not found in unit `{unit}`")]
	#[diagnostic(
		code(bmx::export_not_found),
		help("add `export {export} = ...;` to the body of `{unit}`")
	)]
	ExportNotFound { unit: String, export: String },

	#[error("export `{export}` from unit `{unit}` is a {found}, not a code block")]
	#[diagnostic(
		code(bmx::export_type_mismatch),
		help("only values created with `block()` can be imported")
	)]
	ExportTypeMismatch {
		unit: String,
		export: String,
		found: String,
	},

	#[error("failed to evaluate unit `{unit}` (defined on line {line})")]
	#[diagnostic(code(bmx::module_evaluation))]
	ModuleEvaluation {
		unit: String,
		line: usize,
		#[source]
		source: ScriptError,
	},

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(bmx::config_parse),
		help("check that bmx.toml is valid TOML with optional `marker` and `parallel` keys")
	)]
	ConfigParse(String),

	#[error("invalid directive marker: `{0}`")]
	#[diagnostic(
		code(bmx::invalid_marker),
		help("the marker must be non-empty and must not contain whitespace")
	)]
	InvalidMarker(String),
}

pub type BmxResult<T> = Result<T, BmxError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
