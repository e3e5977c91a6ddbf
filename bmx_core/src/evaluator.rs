use std::cell::RefCell;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::rc::Rc;

use derive_more::Deref;

use crate::code_block::CodeBlock;
use crate::code_block::MAX_SPACING;
use crate::script::Argument;
use crate::script::Expr;
use crate::script::ScriptError;
use crate::script::Statement;
use crate::script::parse_script;

/// A value bound to an export name once a macro body has been evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportValue {
	Block(CodeBlock),
	String(String),
	Integer(usize),
	Boolean(bool),
}

impl ExportValue {
	pub fn type_name(&self) -> &'static str {
		match self {
			ExportValue::Block(_) => "block",
			ExportValue::String(_) => "string",
			ExportValue::Integer(_) => "integer",
			ExportValue::Boolean(_) => "boolean",
		}
	}
}

/// The exports produced by one evaluated macro body, keyed by export name.
#[derive(Debug, Clone, Default, Deref, PartialEq, Eq)]
pub struct ExportTable(BTreeMap<String, ExportValue>);

/// Runtime values. Blocks are shared references so that two bindings of the
/// same block observe each other's mutations.
#[derive(Debug, Clone)]
enum Value {
	Block(Rc<RefCell<CodeBlock>>),
	String(String),
	Integer(usize),
	Boolean(bool),
}

impl Value {
	fn type_name(&self) -> &'static str {
		match self {
			Value::Block(_) => "block",
			Value::String(_) => "string",
			Value::Integer(_) => "integer",
			Value::Boolean(_) => "boolean",
		}
	}

	/// Snapshot the value for the export table. Blocks are copied in their
	/// final state, after every statement of the body has run.
	fn into_export(self) -> ExportValue {
		match self {
			Value::Block(block) => ExportValue::Block(block.borrow().clone()),
			Value::String(value) => ExportValue::String(value),
			Value::Integer(value) => ExportValue::Integer(value),
			Value::Boolean(value) => ExportValue::Boolean(value),
		}
	}
}

/// Parse and evaluate a macro body, returning its exports.
///
/// The body can only construct and fill blocks; it has no access to files,
/// the environment or the process.
pub fn evaluate_script(source: &str) -> Result<ExportTable, ScriptError> {
	let statements = parse_script(source)?;
	let mut evaluator = Evaluator::default();

	for statement in &statements {
		evaluator.execute(statement)?;
	}

	let exports = evaluator
		.exports
		.into_iter()
		.map(|(name, value)| (name, value.into_export()))
		.collect();

	Ok(ExportTable(exports))
}

#[derive(Default)]
struct Evaluator {
	variables: HashMap<String, Value>,
	exports: BTreeMap<String, Value>,
}

impl Evaluator {
	fn execute(&mut self, statement: &Statement) -> Result<(), ScriptError> {
		match statement {
			Statement::Let { name, value, line } => {
				if self.variables.contains_key(name) {
					return Err(ScriptError::AlreadyDefined {
						name: name.clone(),
						line: *line,
					});
				}
				let value = self.evaluate(value)?;
				self.variables.insert(name.clone(), value);
			}
			Statement::Export { name, value, line } => {
				if self.exports.contains_key(name) {
					return Err(ScriptError::DuplicateExport {
						name: name.clone(),
						line: *line,
					});
				}
				let value = self.evaluate(value)?;
				self.exports.insert(name.clone(), value);
			}
			Statement::Expr(expr) => {
				self.evaluate(expr)?;
			}
		}

		Ok(())
	}

	fn evaluate(&mut self, expr: &Expr) -> Result<Value, ScriptError> {
		match expr {
			Expr::String(value) => Ok(Value::String(value.clone())),
			Expr::Integer(value) => Ok(Value::Integer(*value)),
			Expr::Boolean(value) => Ok(Value::Boolean(*value)),
			Expr::Variable { name, line } => {
				self.variables.get(name).cloned().ok_or_else(|| {
					ScriptError::UndefinedVariable {
						name: name.clone(),
						line: *line,
					}
				})
			}
			Expr::Call {
				function,
				arguments,
				line,
			} => self.call(function, arguments, *line),
			Expr::MethodCall {
				receiver,
				method,
				arguments,
				line,
			} => {
				let receiver = self.evaluate(receiver)?;
				self.call_method(receiver, method, arguments, *line)
			}
		}
	}

	fn call(
		&mut self,
		function: &str,
		arguments: &[Argument],
		line: usize,
	) -> Result<Value, ScriptError> {
		if function != "block" {
			return Err(ScriptError::UnknownFunction {
				name: function.to_string(),
				line,
			});
		}

		let invalid = || {
			ScriptError::InvalidArguments {
				function: "block".to_string(),
				expected: "no arguments or `spacing: <integer>`".to_string(),
				line,
			}
		};

		let block = match arguments {
			[] => CodeBlock::new(),
			[Argument { name: Some(name), value }] if name == "spacing" => {
				match self.evaluate(value)? {
					Value::Integer(spacing) => {
						CodeBlock::with_spacing(checked_spacing("block", spacing, line)?)
					}
					_ => return Err(invalid()),
				}
			}
			_ => return Err(invalid()),
		};

		Ok(Value::Block(Rc::new(RefCell::new(block))))
	}

	fn call_method(
		&mut self,
		receiver: Value,
		method: &str,
		arguments: &[Argument],
		line: usize,
	) -> Result<Value, ScriptError> {
		let Value::Block(block) = &receiver else {
			return Err(ScriptError::UnknownMethod {
				receiver: format!("a {}", receiver.type_name()),
				method: method.to_string(),
				line,
			});
		};

		match method {
			"add" => {
				let Some(Value::String(text)) = self.single_argument(arguments)? else {
					return Err(ScriptError::InvalidArguments {
						function: "add".to_string(),
						expected: "a single string".to_string(),
						line,
					});
				};
				block.borrow_mut().add(&text);
			}
			"spacing" => {
				let Some(Value::Integer(spacing)) = self.single_argument(arguments)? else {
					return Err(ScriptError::InvalidArguments {
						function: "spacing".to_string(),
						expected: "a single integer".to_string(),
						line,
					});
				};
				block
					.borrow_mut()
					.set_spacing(checked_spacing("spacing", spacing, line)?);
			}
			_ => {
				return Err(ScriptError::UnknownMethod {
					receiver: "a block".to_string(),
					method: method.to_string(),
					line,
				});
			}
		}

		// Methods return the block so calls can be chained.
		Ok(receiver)
	}

	/// Evaluate the only positional argument, or `None` when the argument list
	/// has any other shape.
	fn single_argument(&mut self, arguments: &[Argument]) -> Result<Option<Value>, ScriptError> {
		match arguments {
			[Argument { name: None, value }] => Ok(Some(self.evaluate(value)?)),
			_ => Ok(None),
		}
	}
}

/// Reject spacing values that could not be materialized as empty lines.
fn checked_spacing(function: &str, spacing: usize, line: usize) -> Result<usize, ScriptError> {
	if spacing > MAX_SPACING {
		return Err(ScriptError::InvalidArguments {
			function: function.to_string(),
			expected: format!("a spacing of at most {MAX_SPACING}"),
			line,
		});
	}

	Ok(spacing)
}
