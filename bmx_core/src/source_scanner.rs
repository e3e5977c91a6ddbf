use crate::BmxError;
use crate::BmxResult;
use crate::code_block::leading_whitespace;
use crate::config::validate_marker;
use crate::macros::MacroDefinition;
use crate::macros::MacroRegistry;

/// One ordered, independently renderable piece of output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
	/// Raw lines emitted verbatim.
	Plain(Vec<String>),
	/// An import site, resolved against the registry at render time.
	Import(ImportSegment),
}

/// Captured from an `import <export> <reserved> <unit>` directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSegment {
	/// Leading whitespace of the directive line, applied to every rendered
	/// line.
	pub indent: String,
	/// Name of the unit (macro definition) to import from.
	pub unit: String,
	/// Name of the export inside the unit.
	pub export: String,
	/// The middle directive argument. Kept verbatim and never interpreted.
	pub reserved: String,
	/// 1-indexed line of the directive.
	pub line: usize,
}

/// The result of scanning a source file: its output segments in document
/// order and every macro definition found.
#[derive(Debug, Default)]
pub struct ScannedSource {
	pub segments: Vec<Segment>,
	pub registry: MacroRegistry,
}

impl ScannedSource {
	/// Iterate the import sites in document order.
	pub fn imports(&self) -> impl Iterator<Item = &ImportSegment> {
		self.segments.iter().filter_map(|segment| {
			match segment {
				Segment::Import(import) => Some(import),
				Segment::Plain(_) => None,
			}
		})
	}
}

/// Where plain lines currently go.
enum Collector {
	/// The trailing `Segment::Plain` of the output list.
	Plain,
	/// The body of the named macro definition.
	Macro(String),
}

/// A parsed directive line.
#[derive(Debug, PartialEq, Eq)]
enum Directive<'a> {
	Begin {
		name: &'a str,
	},
	End,
	Import {
		export: &'a str,
		reserved: &'a str,
		unit: &'a str,
	},
}

/// Scan `content` line by line, splitting it into output segments and macro
/// definitions.
///
/// A line is a directive when it starts with `marker` after its leading
/// whitespace. Lines between `begin` and `end` accumulate into the macro body
/// and never reach the output.
pub fn scan_source(content: &str, marker: &str) -> BmxResult<ScannedSource> {
	validate_marker(marker)?;

	let mut scanned = ScannedSource {
		segments: vec![Segment::Plain(Vec::new())],
		registry: MacroRegistry::new(),
	};
	let mut collector = Collector::Plain;

	for (index, line) in content.split('\n').enumerate() {
		let line_number = index + 1;
		let indent = leading_whitespace(line);
		let Some(directive) = line[indent.len()..].strip_prefix(marker) else {
			match &collector {
				Collector::Plain => push_plain(&mut scanned.segments, line),
				Collector::Macro(name) => {
					if let Some(definition) = scanned.registry.get_mut(name) {
						definition.push(line);
					}
				}
			}
			continue;
		};

		match parse_directive(directive, line_number)? {
			Directive::Begin { name } => {
				tracing::trace!(line = line_number, unit = name, "begin");
				let previous = scanned
					.registry
					.register(MacroDefinition::new(name, line_number));
				if let Some(previous) = previous {
					tracing::debug!(
						unit = name,
						previous_line = previous.line(),
						line = line_number,
						"unit redefined, the later definition wins"
					);
				}
				collector = Collector::Macro(name.to_string());
			}
			Directive::End => {
				tracing::trace!(line = line_number, "end");
				scanned.segments.push(Segment::Plain(Vec::new()));
				collector = Collector::Plain;
			}
			Directive::Import {
				export,
				reserved,
				unit,
			} => {
				tracing::trace!(line = line_number, unit, export, "import");
				scanned.segments.push(Segment::Import(ImportSegment {
					indent: indent.to_string(),
					unit: unit.to_string(),
					export: export.to_string(),
					reserved: reserved.to_string(),
					line: line_number,
				}));
				scanned.segments.push(Segment::Plain(Vec::new()));
				collector = Collector::Plain;
			}
		}
	}

	tracing::debug!(
		segments = scanned.segments.len(),
		units = scanned.registry.len(),
		"scanned source"
	);

	Ok(scanned)
}

fn push_plain(segments: &mut Vec<Segment>, line: &str) {
	if let Some(Segment::Plain(lines)) = segments.last_mut() {
		lines.push(line.to_string());
	} else {
		segments.push(Segment::Plain(vec![line.to_string()]));
	}
}

/// Split the text after the marker into a command and its arguments.
fn parse_directive(text: &str, line: usize) -> BmxResult<Directive<'_>> {
	let mut words = text.split_whitespace();
	let command = words.next().unwrap_or_default();
	let args: Vec<&str> = words.collect();

	let directive = match (command, args.as_slice()) {
		("begin", [name, ..]) => Directive::Begin { name: *name },
		("end", _) => Directive::End,
		("import", [export, reserved, unit, ..]) => {
			Directive::Import {
				export: *export,
				reserved: *reserved,
				unit: *unit,
			}
		}
		("begin", _) => {
			return Err(BmxError::MalformedDirective {
				command: command.to_string(),
				expected: "begin <name>".to_string(),
				line,
			});
		}
		("import", _) => {
			return Err(BmxError::MalformedDirective {
				command: command.to_string(),
				expected: "import <export> <reserved> <unit>".to_string(),
				line,
			});
		}
		_ => {
			return Err(BmxError::UnknownDirective {
				command: command.to_string(),
				line,
			});
		}
	};

	let expected_args = match directive {
		Directive::Begin { .. } => 1,
		Directive::End => 0,
		Directive::Import { .. } => 3,
	};
	if args.len() > expected_args {
		tracing::debug!(
			line,
			command,
			ignored = ?&args[expected_args..],
			"ignoring extra directive arguments"
		);
	}

	Ok(directive)
}
