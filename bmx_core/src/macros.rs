use std::collections::HashMap;
use std::sync::OnceLock;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use derive_more::Deref;

use crate::BmxError;
use crate::BmxResult;
use crate::code_block::CodeBlock;
use crate::evaluator::ExportTable;
use crate::evaluator::ExportValue;
use crate::evaluator::evaluate_script;
use crate::script::ScriptError;

/// The raw body of one `begin <name>` ... `end` region together with the
/// memoized result of evaluating it.
#[derive(Debug)]
pub struct MacroDefinition {
	name: String,
	/// 1-indexed line of the `begin` directive.
	line: usize,
	lines: Vec<String>,
	/// Written once by the first lookup. Failures are cached as well so every
	/// caller observes the same outcome.
	exports: OnceLock<Result<ExportTable, ScriptError>>,
	evaluations: AtomicUsize,
}

impl MacroDefinition {
	pub fn new(name: impl Into<String>, line: usize) -> Self {
		Self {
			name: name.into(),
			line,
			lines: Vec::new(),
			exports: OnceLock::new(),
			evaluations: AtomicUsize::new(0),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn line(&self) -> usize {
		self.line
	}

	/// The raw, unnormalized body lines.
	pub fn lines(&self) -> &[String] {
		&self.lines
	}

	pub(crate) fn push(&mut self, line: impl Into<String>) {
		self.lines.push(line.into());
	}

	/// How many times the body has been evaluated. Never more than one.
	pub fn evaluations(&self) -> usize {
		self.evaluations.load(Ordering::SeqCst)
	}

	/// Evaluate the body on first use and return the cached export table.
	///
	/// Concurrent callers block until the single in-flight evaluation has
	/// finished.
	pub fn exports(&self) -> BmxResult<&ExportTable> {
		let outcome = self.exports.get_or_init(|| {
			self.evaluations.fetch_add(1, Ordering::SeqCst);
			tracing::debug!(unit = %self.name, lines = self.lines.len(), "evaluating unit");
			evaluate_script(&self.lines.join("\n"))
		});

		outcome.as_ref().map_err(|error| {
			BmxError::ModuleEvaluation {
				unit: self.name.clone(),
				line: self.line,
				source: error.clone(),
			}
		})
	}

	/// Look up an export that must be a code block.
	pub fn get_export(&self, export: &str) -> BmxResult<&CodeBlock> {
		match self.exports()?.get(export) {
			Some(ExportValue::Block(block)) => Ok(block),
			Some(other) => {
				Err(BmxError::ExportTypeMismatch {
					unit: self.name.clone(),
					export: export.to_string(),
					found: other.type_name().to_string(),
				})
			}
			None => {
				Err(BmxError::ExportNotFound {
					unit: self.name.clone(),
					export: export.to_string(),
				})
			}
		}
	}
}

/// Macro definitions by name, populated while scanning and read while
/// composing.
#[derive(Debug, Default, Deref)]
pub struct MacroRegistry(HashMap<String, MacroDefinition>);

impl MacroRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a definition. An existing definition with the same name is
	/// replaced and returned.
	pub fn register(&mut self, definition: MacroDefinition) -> Option<MacroDefinition> {
		self.0.insert(definition.name.clone(), definition)
	}

	pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut MacroDefinition> {
		self.0.get_mut(name)
	}

	/// Resolve a unit by name.
	pub fn unit(&self, name: &str, line: usize) -> BmxResult<&MacroDefinition> {
		self.0.get(name).ok_or_else(|| {
			BmxError::UnitNotFound {
				unit: name.to_string(),
				line,
			}
		})
	}

	/// Definitions sorted by the line of their `begin` directive.
	pub fn sorted(&self) -> Vec<&MacroDefinition> {
		let mut definitions: Vec<_> = self.0.values().collect();
		definitions.sort_by_key(|definition| definition.line);
		definitions
	}
}
