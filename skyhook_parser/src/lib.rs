//! # Skyhook Parser
//!
//! Lexer, parser and printer for the JavaScript subset the closure
//! serializer ingests and emits. The grammar covers what real closures use:
//! functions, arrows, classes, destructuring, template literals, the full
//! operator set, and automatic semicolon insertion at newlines.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod ast;
pub mod codegen;
pub mod function;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::*;
pub use codegen::{print_expr, print_program, print_stmt};
pub use function::{FunctionNode, ParsedFunction, parse_function_source};
pub use lexer::Lexer;
pub use parser::{Parser, parse, parse_expression};
pub use token::{Keyword, Token, TokenKind};
