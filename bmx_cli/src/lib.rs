use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Define code blocks once inside a source file and splice them anywhere.",
	long_about = "bmx (block macro expander) reads a source file containing directive lines, \
	              evaluates the macro units defined between `begin` and `end` directives and \
	              replaces every `import` directive with the exported code block, re-indented \
	              to the column of the directive.\n\nQuick start:\n  bmx build in.rs out.rs  \
	              Expand a file\n  bmx check in.rs out.rs  Verify the output is up to date\n  \
	              bmx list in.rs          Show units and import sites"
)]
pub struct BmxCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to a config file. When omitted, `bmx.toml`, `.bmx.toml` and
	/// `.config/bmx.toml` are searched in the directory of the source file.
	#[arg(long, short, global = true)]
	pub config: Option<PathBuf>,

	/// Directive marker, overriding the config file.
	#[arg(long, short, global = true)]
	pub marker: Option<String>,

	/// Render segments on the current thread instead of the thread pool.
	#[arg(long, global = true, default_value_t = false)]
	pub sequential: bool,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Expand a source file and write the result.
	///
	/// Macro bodies are removed from the output and every `import` directive
	/// is replaced by the rendered block. The output file is replaced
	/// atomically and is left untouched when expansion fails.
	Build {
		/// The source file containing directives.
		source: PathBuf,

		/// Where to write the expanded file.
		output: PathBuf,

		/// Print the expanded content to stdout without writing the output
		/// file.
		#[arg(long, default_value_t = false)]
		dry_run: bool,
	},
	/// Check that an output file matches the expansion of its source.
	///
	/// Exits with status 1 when the output is missing or stale. Ideal for CI
	/// pipelines that commit generated files.
	Check {
		/// The source file containing directives.
		source: PathBuf,

		/// The previously generated output file.
		output: PathBuf,

		/// Show a unified diff between the current and expected output.
		#[arg(long, default_value_t = false)]
		diff: bool,
	},
	/// List the macro units and import sites of a source file.
	List {
		/// The source file containing directives.
		source: PathBuf,

		/// Output format. Use `text` for human-readable output or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
