use std::io::Write;
use std::path::Path;

use rayon::prelude::*;
use tempfile::NamedTempFile;

use crate::BmxConfig;
use crate::BmxResult;
use crate::macros::MacroRegistry;
use crate::source_scanner::ImportSegment;
use crate::source_scanner::ScannedSource;
use crate::source_scanner::Segment;
use crate::source_scanner::scan_source;

/// Result of comparing an expansion with the current output file.
#[derive(Debug)]
pub struct CheckResult {
	/// The current output file content, `None` when the file does not exist.
	pub current_content: Option<String>,
	/// The content a build would write.
	pub expected_content: String,
}

impl CheckResult {
	/// Returns true if the output file is up to date.
	pub fn is_ok(&self) -> bool {
		self.current_content.as_deref() == Some(self.expected_content.as_str())
	}
}

/// Expand every import directive in `content` using the given configuration.
pub fn expand(content: &str, config: &BmxConfig) -> BmxResult<String> {
	let scanned = scan_source(content, &config.marker)?;
	compose(&scanned, config.parallel)
}

/// Read and scan a source file without evaluating any unit.
pub fn scan_file(path: &Path, config: &BmxConfig) -> BmxResult<ScannedSource> {
	let content = std::fs::read_to_string(path)?;
	tracing::debug!(path = %path.display(), bytes = content.len(), "read source");
	scan_source(&content, &config.marker)
}

/// Read and expand a source file.
pub fn expand_file(path: &Path, config: &BmxConfig) -> BmxResult<String> {
	let scanned = scan_file(path, config)?;
	compose(&scanned, config.parallel)
}

/// Render all segments in order and join them with newlines.
///
/// Nothing is returned unless every segment rendered successfully. With
/// `parallel` set the segments are rendered on the rayon thread pool. Units
/// are still evaluated at most once.
pub fn compose(scanned: &ScannedSource, parallel: bool) -> BmxResult<String> {
	let registry = &scanned.registry;
	let rendered: Vec<String> = if parallel {
		scanned
			.segments
			.par_iter()
			.map(|segment| render_segment(segment, registry))
			.collect::<BmxResult<_>>()?
	} else {
		scanned
			.segments
			.iter()
			.map(|segment| render_segment(segment, registry))
			.collect::<BmxResult<_>>()?
	};

	Ok(rendered.join("\n"))
}

/// Render one segment. Plain segments are emitted verbatim, imports are
/// resolved through the registry.
pub fn render_segment(segment: &Segment, registry: &MacroRegistry) -> BmxResult<String> {
	match segment {
		Segment::Plain(lines) => Ok(lines.join("\n")),
		Segment::Import(import) => render_import(import, registry),
	}
}

fn render_import(import: &ImportSegment, registry: &MacroRegistry) -> BmxResult<String> {
	let block = registry
		.unit(&import.unit, import.line)?
		.get_export(&import.export)?;
	tracing::trace!(
		line = import.line,
		unit = %import.unit,
		export = %import.export,
		lines = block.lines().len(),
		"rendering import"
	);

	Ok(block.render(&import.indent))
}

/// Compare the expansion with the file at `path`.
pub fn check_output(path: &Path, expected_content: String) -> BmxResult<CheckResult> {
	let current_content = match std::fs::read_to_string(path) {
		Ok(content) => Some(content),
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
		Err(e) => return Err(e.into()),
	};

	Ok(CheckResult {
		current_content,
		expected_content,
	})
}

/// Write the expanded content to `path` atomically: the content goes to a
/// temporary file in the same directory which then replaces `path`.
pub fn write_output(path: &Path, content: &str) -> BmxResult<()> {
	let dir = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};

	let mut file = NamedTempFile::new_in(dir)?;
	file.write_all(content.as_bytes())?;
	file.flush()?;
	file.persist(path).map_err(|e| e.error)?;
	tracing::debug!(path = %path.display(), bytes = content.len(), "wrote output");

	Ok(())
}
