//! A minimal interactive command interpreter.
//!
//! Each input line is split on spaces into a program name, its arguments and at
//! most one `< input` and one `> output` redirection. `cd` and `exit` run inside
//! the shell; anything else is forked and executed with the standard `PATH`
//! search, and the shell waits for it before prompting again.
//!
//! [`Interpreter`] drives the loop. The working directory and process creation
//! sit behind the [`env::WorkingDir`] and [`external::ProcessControl`] traits so
//! the loop can be exercised without touching the real process.

pub mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
pub mod executor;
pub mod external;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod parser;

pub use interpreter::{EditorReader, Interpreter, LineReader, PlainReader};
