use logos::Logos;
use snailquote::unescape;

use crate::script::ScriptError;
use crate::tokens::SpannedToken;
use crate::tokens::Token;

/// Raw tokens produced by logos for flat tokenization of a macro body.
#[derive(Logos, Debug, PartialEq)]
#[logos(skip(r"[ \t\r\n\f]+|//[^\n]*", allow_greedy = true))]
enum RawToken {
	#[token("let")]
	Let,
	#[token("export")]
	Export,
	#[token("true")]
	True,
	#[token("false")]
	False,
	#[token("=")]
	Assign,
	#[token(";")]
	Semicolon,
	#[token(",")]
	Comma,
	#[token(":")]
	Colon,
	#[token(".")]
	Dot,
	#[token("(")]
	ParenOpen,
	#[token(")")]
	ParenClose,
	#[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
	Ident,
	#[regex(r#""([^"\\]|\\.)*""#)]
	DoubleQuotedString,
	#[regex(r"`[^`]*`")]
	BacktickString,
	#[regex(r"[0-9]+")]
	Integer,
}

/// Pre-computed table of line-start byte offsets so token offsets can be
/// mapped to 1-indexed lines with a binary search.
pub(crate) struct LineTable {
	/// Byte offsets of the start of each line. `line_starts[0]` is always 0.
	line_starts: Vec<usize>,
}

impl LineTable {
	pub(crate) fn new(content: &str) -> Self {
		let mut line_starts = vec![0];
		for (i, byte) in content.bytes().enumerate() {
			if byte == b'\n' {
				line_starts.push(i + 1);
			}
		}
		Self { line_starts }
	}

	/// Convert a byte offset to a 1-indexed line number.
	pub(crate) fn line_of(&self, offset: usize) -> usize {
		match self.line_starts.binary_search(&offset) {
			Ok(exact) => exact + 1,
			Err(insert) => insert,
		}
	}
}

/// Tokenize a macro body into spanned tokens.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, ScriptError> {
	let lines = LineTable::new(source);
	let mut tokens = Vec::new();

	for (result, span) in RawToken::lexer(source).spanned() {
		let slice = &source[span.clone()];
		let line = lines.line_of(span.start);

		let Ok(raw) = result else {
			return Err(ScriptError::UnexpectedCharacter {
				found: slice.to_string(),
				line,
			});
		};

		let token = match raw {
			RawToken::Let => Token::Let,
			RawToken::Export => Token::Export,
			RawToken::True => Token::True,
			RawToken::False => Token::False,
			RawToken::Assign => Token::Assign,
			RawToken::Semicolon => Token::Semicolon,
			RawToken::Comma => Token::Comma,
			RawToken::Colon => Token::Colon,
			RawToken::Dot => Token::Dot,
			RawToken::ParenOpen => Token::ParenOpen,
			RawToken::ParenClose => Token::ParenClose,
			RawToken::Ident => Token::Ident(slice.to_string()),
			RawToken::DoubleQuotedString => {
				let value = if slice.contains('\\') {
					unescape(slice).map_err(|e| {
						ScriptError::InvalidEscape {
							reason: e.to_string(),
							line,
						}
					})?
				} else {
					slice[1..slice.len() - 1].to_string()
				};
				Token::String(value)
			}
			// Backtick strings are raw: no escapes, newlines kept verbatim.
			RawToken::BacktickString => Token::String(slice[1..slice.len() - 1].to_string()),
			RawToken::Integer => {
				let value = slice
					.parse::<usize>()
					.map_err(|_| ScriptError::IntegerOverflow { line })?;
				Token::Integer(value)
			}
		};

		tokens.push(SpannedToken { token, line });
	}

	Ok(tokens)
}
