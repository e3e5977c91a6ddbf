//! Parser for the block script language.
//!
//! A macro body is a sequence of statements:
//!
//! ```text
//! // construct a block that separates appended chunks with one blank line
//! let header = block(spacing: 1);
//! header.add("first");
//! header.add(`
//!     second
//!       nested
//! `);
//! export greeting = header;
//! export footer = block().add("bye");
//! ```
//!
//! The language has no loops, conditionals or host access. Evaluation lives in
//! [`crate::evaluator`].

use miette::Diagnostic;
use thiserror::Error;

use crate::lexer::tokenize;
use crate::tokens::SpannedToken;
use crate::tokens::Token;

/// Errors raised while lexing, parsing or evaluating a macro body. Lines are
/// 1-indexed and relative to the first line of the body.
#[derive(Debug, Clone, Diagnostic, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScriptError {
	#[error("unexpected character `{found}` on line {line}")]
	#[diagnostic(code(bmx::script::unexpected_character))]
	UnexpectedCharacter { found: String, line: usize },

	#[error("invalid escape sequence on line {line}: {reason}")]
	#[diagnostic(code(bmx::script::invalid_escape))]
	InvalidEscape { reason: String, line: usize },

	#[error("integer literal on line {line} is too large")]
	#[diagnostic(code(bmx::script::integer_overflow))]
	IntegerOverflow { line: usize },

	#[error("expected {expected} on line {line}, found {found}")]
	#[diagnostic(code(bmx::script::unexpected_token))]
	UnexpectedToken {
		expected: String,
		found: String,
		line: usize,
	},

	#[error("expected {expected}, found end of body")]
	#[diagnostic(code(bmx::script::unexpected_end))]
	UnexpectedEnd { expected: String },

	#[error("undefined variable `{name}` on line {line}")]
	#[diagnostic(code(bmx::script::undefined_variable))]
	UndefinedVariable { name: String, line: usize },

	#[error("variable `{name}` is already defined (line {line})")]
	#[diagnostic(code(bmx::script::already_defined))]
	AlreadyDefined { name: String, line: usize },

	#[error("unknown function `{name}` on line {line}")]
	#[diagnostic(
		code(bmx::script::unknown_function),
		help("the only function is `block()`, optionally `block(spacing: N)`")
	)]
	UnknownFunction { name: String, line: usize },

	#[error("{receiver} has no method `{method}` (line {line})")]
	#[diagnostic(
		code(bmx::script::unknown_method),
		help("blocks support `add(text)` and `spacing(n)`")
	)]
	UnknownMethod {
		receiver: String,
		method: String,
		line: usize,
	},

	#[error("invalid arguments for `{function}` on line {line}: expected {expected}")]
	#[diagnostic(code(bmx::script::invalid_arguments))]
	InvalidArguments {
		function: String,
		expected: String,
		line: usize,
	},

	#[error("export `{name}` is defined more than once (line {line})")]
	#[diagnostic(code(bmx::script::duplicate_export))]
	DuplicateExport { name: String, line: usize },

	#[error(
		"expression on line {line} is nested more than {max} levels deep",
		max = MAX_NESTING_DEPTH
	)]
	#[diagnostic(
		code(bmx::script::nesting_too_deep),
		help("split long method chains or nested parentheses into several `let` statements")
	)]
	NestingTooDeep { line: usize },
}

/// Maximum depth of an expression tree. Parenthesised expressions, call
/// arguments and every link of a method chain each count as one level.
pub const MAX_NESTING_DEPTH: usize = 256;

/// A single statement of a macro body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
	/// `let name = value;`
	Let {
		name: String,
		value: Expr,
		line: usize,
	},
	/// `export name = value;` or the shorthand `export name;`
	Export {
		name: String,
		value: Expr,
		line: usize,
	},
	/// A bare expression evaluated for its side effects, e.g. `b.add("x");`
	Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
	String(String),
	Integer(usize),
	Boolean(bool),
	Variable {
		name: String,
		line: usize,
	},
	/// A free function call such as `block(spacing: 1)`.
	Call {
		function: String,
		arguments: Vec<Argument>,
		line: usize,
	},
	/// A method call such as `header.add("text")`.
	MethodCall {
		receiver: Box<Expr>,
		method: String,
		arguments: Vec<Argument>,
		line: usize,
	},
}

/// A call argument, optionally named (`spacing: 1`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
	pub name: Option<String>,
	pub value: Expr,
}

/// Parse a macro body into statements.
pub fn parse_script(source: &str) -> Result<Vec<Statement>, ScriptError> {
	let tokens = tokenize(source)?;
	let mut parser = ScriptParser {
		tokens,
		cursor: 0,
		depth: 0,
	};
	parser.parse_program()
}

struct ScriptParser {
	tokens: Vec<SpannedToken>,
	cursor: usize,
	/// Current expression nesting depth, bounded by `MAX_NESTING_DEPTH`.
	depth: usize,
}

impl ScriptParser {
	fn peek(&self) -> Option<&SpannedToken> {
		self.tokens.get(self.cursor)
	}

	fn peek_nth(&self, n: usize) -> Option<&Token> {
		self.tokens.get(self.cursor + n).map(|spanned| &spanned.token)
	}

	/// Line of the next token, or of the last one at the end of the body.
	fn line(&self) -> usize {
		self.peek()
			.or_else(|| self.tokens.last())
			.map_or(1, |spanned| spanned.line)
	}

	/// Enter one more level of nesting.
	fn descend(&mut self) -> Result<(), ScriptError> {
		self.depth += 1;
		if self.depth > MAX_NESTING_DEPTH {
			return Err(ScriptError::NestingTooDeep { line: self.line() });
		}
		Ok(())
	}

	fn next(&mut self, expected: &str) -> Result<SpannedToken, ScriptError> {
		let Some(spanned) = self.tokens.get(self.cursor).cloned() else {
			return Err(ScriptError::UnexpectedEnd {
				expected: expected.to_string(),
			});
		};
		self.cursor += 1;
		Ok(spanned)
	}

	fn eat(&mut self, token: &Token) -> bool {
		if self.peek().is_some_and(|spanned| &spanned.token == token) {
			self.cursor += 1;
			true
		} else {
			false
		}
	}

	fn expect(&mut self, token: &Token) -> Result<usize, ScriptError> {
		let expected = format!("`{token}`");
		let spanned = self.next(&expected)?;
		if &spanned.token == token {
			Ok(spanned.line)
		} else {
			Err(unexpected(&expected, &spanned))
		}
	}

	fn expect_ident(&mut self) -> Result<(String, usize), ScriptError> {
		let spanned = self.next("an identifier")?;
		match spanned.token {
			Token::Ident(name) => Ok((name, spanned.line)),
			_ => Err(unexpected("an identifier", &spanned)),
		}
	}

	fn parse_program(&mut self) -> Result<Vec<Statement>, ScriptError> {
		let mut statements = Vec::new();

		while self.peek().is_some() {
			// Empty statements are allowed so `;;` is harmless.
			if self.eat(&Token::Semicolon) {
				continue;
			}
			statements.push(self.parse_statement()?);
			self.eat(&Token::Semicolon);
		}

		Ok(statements)
	}

	fn parse_statement(&mut self) -> Result<Statement, ScriptError> {
		match self.peek().map(|spanned| spanned.token.clone()) {
			None => {
				Err(ScriptError::UnexpectedEnd {
					expected: "a statement".to_string(),
				})
			}
			Some(Token::Let) => {
				self.cursor += 1;
				let (name, line) = self.expect_ident()?;
				self.expect(&Token::Assign)?;
				let value = self.parse_expr()?;
				Ok(Statement::Let { name, value, line })
			}
			Some(Token::Export) => {
				self.cursor += 1;
				let (name, line) = self.expect_ident()?;
				let value = if self.eat(&Token::Assign) {
					self.parse_expr()?
				} else {
					Expr::Variable {
						name: name.clone(),
						line,
					}
				};
				Ok(Statement::Export { name, value, line })
			}
			_ => Ok(Statement::Expr(self.parse_expr()?)),
		}
	}

	fn parse_expr(&mut self) -> Result<Expr, ScriptError> {
		let entry_depth = self.depth;
		let result = self.parse_chain();
		self.depth = entry_depth;
		result
	}

	/// A primary expression followed by any number of `.method(...)` links.
	/// Each link wraps the previous expression, so it nests one level deeper.
	fn parse_chain(&mut self) -> Result<Expr, ScriptError> {
		self.descend()?;
		let mut expr = self.parse_primary()?;

		while self.eat(&Token::Dot) {
			self.descend()?;
			let (method, line) = self.expect_ident()?;
			self.expect(&Token::ParenOpen)?;
			let arguments = self.parse_arguments()?;
			expr = Expr::MethodCall {
				receiver: Box::new(expr),
				method,
				arguments,
				line,
			};
		}

		Ok(expr)
	}

	fn parse_primary(&mut self) -> Result<Expr, ScriptError> {
		let spanned = self.next("an expression")?;
		let line = spanned.line;

		match spanned.token {
			Token::String(value) => Ok(Expr::String(value)),
			Token::Integer(value) => Ok(Expr::Integer(value)),
			Token::True => Ok(Expr::Boolean(true)),
			Token::False => Ok(Expr::Boolean(false)),
			Token::Ident(name) => {
				if self.eat(&Token::ParenOpen) {
					let arguments = self.parse_arguments()?;
					Ok(Expr::Call {
						function: name,
						arguments,
						line,
					})
				} else {
					Ok(Expr::Variable { name, line })
				}
			}
			Token::ParenOpen => {
				let expr = self.parse_expr()?;
				self.expect(&Token::ParenClose)?;
				Ok(expr)
			}
			_ => Err(unexpected("an expression", &spanned)),
		}
	}

	/// Parse call arguments after the opening parenthesis, consuming the
	/// closing one. A trailing comma is accepted.
	fn parse_arguments(&mut self) -> Result<Vec<Argument>, ScriptError> {
		let mut arguments = Vec::new();

		loop {
			if self.eat(&Token::ParenClose) {
				return Ok(arguments);
			}

			let name = if let (Some(Token::Ident(name)), Some(Token::Colon)) =
				(self.peek_nth(0), self.peek_nth(1))
			{
				Some(name.clone())
			} else {
				None
			};
			if name.is_some() {
				self.cursor += 2;
			}
			let value = self.parse_expr()?;
			arguments.push(Argument { name, value });

			if !self.eat(&Token::Comma) {
				self.expect(&Token::ParenClose)?;
				return Ok(arguments);
			}
		}
	}
}

fn unexpected(expected: &str, found: &SpannedToken) -> ScriptError {
	ScriptError::UnexpectedToken {
		expected: expected.to_string(),
		found: found.token.describe(),
		line: found.line,
	}
}
