use std::fmt::Display;

/// Tokens of the block script language that macro bodies are written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
	/// `let`
	Let,
	/// `export`
	Export,
	/// `true`
	True,
	/// `false`
	False,
	/// `=`
	Assign,
	/// `;`
	Semicolon,
	/// `,`
	Comma,
	/// `:`
	Colon,
	/// `.`
	Dot,
	/// `(`
	ParenOpen,
	/// `)`
	ParenClose,
	/// An identifier, e.g. `header`
	Ident(String),
	/// A string literal with escapes already resolved. Backtick strings are
	/// taken verbatim.
	String(String),
	/// A non-negative integer literal, e.g. `2`
	Integer(usize),
}

impl Token {
	/// Short human readable description used in parse errors.
	pub fn describe(&self) -> String {
		match self {
			Token::Ident(name) => format!("identifier `{name}`"),
			Token::String(_) => "string literal".to_string(),
			Token::Integer(value) => format!("integer `{value}`"),
			other => format!("`{other}`"),
		}
	}
}

impl Display for Token {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Token::Let => write!(f, "let"),
			Token::Export => write!(f, "export"),
			Token::True => write!(f, "true"),
			Token::False => write!(f, "false"),
			Token::Assign => write!(f, "="),
			Token::Semicolon => write!(f, ";"),
			Token::Comma => write!(f, ","),
			Token::Colon => write!(f, ":"),
			Token::Dot => write!(f, "."),
			Token::ParenOpen => write!(f, "("),
			Token::ParenClose => write!(f, ")"),
			Token::Ident(ident) => write!(f, "{ident}"),
			Token::String(string) => write!(f, "{string:?}"),
			Token::Integer(number) => write!(f, "{number}"),
		}
	}
}

/// A token together with the 1-indexed line of the macro body it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedToken {
	pub token: Token,
	pub line: usize,
}
