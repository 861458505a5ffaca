// Interpreter library for a small statically typed scripting language
// aimed at organizing and editing audio files.
//
// The pipeline is reader -> cleaner -> lexer -> parser -> type checker
// -> interpreter; each stage has its own error family and every
// diagnostic carries a source position.

pub mod ast;
pub mod audio;
pub mod builtins;
pub mod cleaner;
pub mod config;
pub mod env;
pub mod error;
pub mod fs;
pub mod interp;
pub mod lexer;
pub mod objects;
pub mod parser;
pub mod reader;
pub mod runner;
pub mod types;
pub mod value;

// Re-export commonly used items
pub use ast::{Expr, Program, Stmt};
pub use config::Config;
pub use error::{LexError, ParseError, Position, RuntimeError, Span, TypeError};
pub use interp::Interpreter;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;
pub use types::TypeChecker;
pub use value::Value;

pub use runner::run;
