use std::path::Path;
use std::process;

use bmx_cli::BmxCli;
use bmx_cli::Commands;
use bmx_cli::OutputFormat;
use bmx_core::BmxConfig;
use bmx_core::ScannedSource;
use bmx_core::check_output;
use bmx_core::compose;
use bmx_core::scan_file;
use bmx_core::write_output;
use clap::Parser;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = BmxCli::parse();

	// Respect NO_COLOR env var, --no-color flag and terminals without color.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stderr).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Build {
			source,
			output,
			dry_run,
		}) => run_build(&args, source, output, *dry_run),
		Some(Commands::Check {
			source,
			output,
			diff,
		}) => run_check(&args, source, output, *diff),
		Some(Commands::List { source, format }) => run_list(&args, source, *format),
		None => {
			eprintln!("No subcommand specified. Run `bmx --help` for usage.");
			process::exit(2);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<bmx_core::BmxError>() {
			Ok(bmx_err) => {
				let report: miette::Report = (*bmx_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr. `--verbose` forces debug output, otherwise `RUST_LOG`
/// applies with `warn` as the fallback.
fn init_tracing(verbose: bool, use_color: bool) {
	let filter = if verbose {
		EnvFilter::new("debug")
	} else {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.try_init()
		.ok();
}

/// Resolve the effective config for `source`. An explicit `--config` path
/// wins over discovery, and CLI flags win over the file.
fn load_config(args: &BmxCli, source: &Path) -> Result<BmxConfig, Box<dyn std::error::Error>> {
	let mut config = if let Some(path) = &args.config {
		BmxConfig::load_path(path)?
	} else {
		let dir = source
			.parent()
			.filter(|parent| !parent.as_os_str().is_empty())
			.unwrap_or_else(|| Path::new("."));
		BmxConfig::load(dir)?.unwrap_or_default()
	};

	if let Some(marker) = &args.marker {
		config = config.with_marker(marker.as_str())?;
	}
	if args.sequential {
		config.parallel = false;
	}

	tracing::debug!(marker = %config.marker, parallel = config.parallel, "resolved config");

	Ok(config)
}

fn load_source(
	args: &BmxCli,
	source: &Path,
) -> Result<(BmxConfig, ScannedSource), Box<dyn std::error::Error>> {
	let config = load_config(args, source)?;
	let scanned = scan_file(source, &config)?;

	Ok((config, scanned))
}

fn run_build(
	args: &BmxCli,
	source: &Path,
	output: &Path,
	dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let (config, scanned) = load_source(args, source)?;
	let expanded = compose(&scanned, config.parallel)?;

	if dry_run {
		print!("{expanded}");
		return Ok(());
	}

	write_output(output, &expanded)?;
	println!(
		"Expanded {} into {} ({} unit(s), {} import(s)).",
		source.display(),
		output.display(),
		scanned.registry.len(),
		scanned.imports().count()
	);

	Ok(())
}

fn run_check(
	args: &BmxCli,
	source: &Path,
	output: &Path,
	show_diff: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let (config, scanned) = load_source(args, source)?;
	let result = check_output(output, compose(&scanned, config.parallel)?)?;

	if result.is_ok() {
		println!(
			"Check passed: {} is up to date.",
			colored!(output.display(), green)
		);
		return Ok(());
	}

	match &result.current_content {
		Some(current) => {
			eprintln!(
				"Check failed: {} is out of date.",
				colored!(output.display(), red)
			);
			if show_diff {
				eprintln!();
				print_diff(current, &result.expected_content);
			}
		}
		None => {
			eprintln!(
				"Check failed: {} does not exist.",
				colored!(output.display(), red)
			);
		}
	}
	eprintln!(
		"Run `bmx build {} {}` to fix.",
		source.display(),
		output.display()
	);

	process::exit(1);
}

fn run_list(
	args: &BmxCli,
	source: &Path,
	format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
	let (_, scanned) = load_source(args, source)?;
	let units = scanned.registry.sorted();
	let imports: Vec<_> = scanned.imports().collect();

	if let OutputFormat::Json = format {
		let unit_entries: Vec<serde_json::Value> = units
			.iter()
			.map(|unit| {
				serde_json::json!({
					"name": unit.name(),
					"line": unit.line(),
					"lines": unit.lines().len(),
				})
			})
			.collect();
		let import_entries: Vec<serde_json::Value> = imports
			.iter()
			.map(|import| {
				serde_json::json!({
					"line": import.line,
					"unit": import.unit,
					"export": import.export,
					"indent": import.indent,
					"linked": scanned.registry.contains_key(&import.unit),
				})
			})
			.collect();
		let output = serde_json::json!({
			"units": unit_entries,
			"imports": import_entries,
		});
		println!("{output}");
		return Ok(());
	}

	if units.is_empty() && imports.is_empty() {
		println!("No units or imports found.");
		return Ok(());
	}

	if !units.is_empty() {
		println!("{}", colored!("Units:", bold));
		for unit in &units {
			println!(
				"  {} (line {}, {} line(s))",
				unit.name(),
				unit.line(),
				unit.lines().len()
			);
		}
	}

	if !imports.is_empty() {
		if !units.is_empty() {
			println!();
		}
		println!("{}", colored!("Imports:", bold));
		for import in &imports {
			let status = if scanned.registry.contains_key(&import.unit) {
				colored!("linked", green)
			} else {
				colored!("missing", yellow)
			};
			println!(
				"  line {}: {} from {} [{status}]",
				import.line, import.export, import.unit
			);
		}
	}

	println!("\n{} unit(s), {} import(s)", units.len(), imports.len());

	Ok(())
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
	if !current.ends_with('\n') || !expected.ends_with('\n') {
		eprintln!();
	}
}
