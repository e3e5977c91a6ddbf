//! `bmx_core` is the core library for the `bmx` block macro expander. A source
//! file defines named units between `begin` and `end` directives. Each unit
//! body is a small block script that builds and exports code blocks, and
//! `import` directives splice those blocks back into the file at the
//! indentation of the directive line.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Source file
//!   → Source scanner (directive state machine → ordered segments + registry)
//!   → Composer (renders segments, resolving imports through the registry)
//!       → Macro definition (evaluates its body once, caches the exports)
//!           → Block script (lexer → parser → evaluator)
//!               → Code block (indentation normalizer)
//!   → Atomic write of the output file
//! ```
//!
//! ## Directives
//!
//! Directive lines start with a marker (`##@` by default) after optional
//! indentation:
//!
//! ```text
//! ##@begin greetings
//! let hello = block(spacing: 1);
//! hello.add("hello");
//! hello.add("world");
//! export hello;
//! ##@end
//! fn main() {
//!     ##@import hello _ greetings
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `bmx.toml`.
//! - [`source_scanner`]: Splits a source into segments and macro definitions.
//! - [`script`]: Parser for the block script language.
//!
//! ## Quick Start
//!
//! ```rust
//! use bmx_core::BmxConfig;
//! use bmx_core::expand;
//!
//! let source = "a\n##@begin unit\nexport x = block().add(\"hi\");\n##@end\n  ##@import x _ unit\nb";
//! let output = expand(source, &BmxConfig::default()).unwrap();
//! assert_eq!(output, "a\n\n  hi\nb");
//! ```

pub use code_block::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use evaluator::*;
pub use macros::*;
pub use source_scanner::*;

mod code_block;
pub mod config;
mod engine;
mod error;
mod evaluator;
pub(crate) mod lexer;
mod macros;
pub mod script;
pub mod source_scanner;
pub(crate) mod tokens;
