use crate::env::Environment;
use crate::executor::Executor;
use crate::parser::parse_line;
use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead, Write};

/// Source of input lines for the shell loop.
pub trait LineReader {
    /// Show `prompt` and read one line. `Ok(None)` means the input is exhausted.
    /// The line is raw bytes and need not be valid UTF-8.
    fn read_line(&mut self, prompt: &str) -> Result<Option<Vec<u8>>>;
}

/// Interactive line editing on a terminal.
///
/// History is deliberately not recorded; every line is read fresh.
pub struct EditorReader {
    editor: DefaultEditor,
}

impl EditorReader {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new()
            .map_err(|err| anyhow::anyhow!("failed to set up the line editor: {}", err))?;
        Ok(Self { editor })
    }
}

impl LineReader for EditorReader {
    fn read_line(&mut self, prompt: &str) -> Result<Option<Vec<u8>>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line.into_bytes())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Interrupted) => {
                log::debug!("interrupted, leaving");
                Ok(None)
            }
            Err(err) => Err(anyhow::anyhow!("failed to read a line: {}", err)),
        }
    }
}

/// Reads lines from any buffered reader, writing the prompt to `prompt_out`.
///
/// Used when standard input is not a terminal, and by tests.
pub struct PlainReader<R, W> {
    input: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> PlainReader<R, W> {
    pub fn new(input: R, prompt_out: W) -> Self {
        Self { input, prompt_out }
    }
}

impl<R: BufRead, W: Write> LineReader for PlainReader<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<Vec<u8>>> {
        self.prompt_out.write_all(prompt.as_bytes())?;
        self.prompt_out.flush()?;
        let mut line = Vec::new();
        let n = self
            .input
            .read_until(b'\n', &mut line)
            .context("failed to read a line")?;
        Ok(if n == 0 { None } else { Some(line) })
    }
}

/// The read-parse-execute loop.
///
/// Example
/// ```
/// use techshell::{Interpreter, PlainReader};
/// use techshell::io_adapters::SharedBuffer;
/// use std::io::Cursor;
///
/// let out = SharedBuffer::new();
/// let mut sh = Interpreter::default().with_output(Box::new(out.clone()), Box::new(out.clone()));
/// let mut input = PlainReader::new(Cursor::new("cd\nexit\n"), out.clone());
/// sh.repl(&mut input).unwrap();
/// assert!(out.contents().contains("cd: missing argument"));
/// ```
pub struct Interpreter {
    env: Environment,
    executor: Executor,
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
}

impl Interpreter {
    pub fn new(env: Environment, executor: Executor) -> Self {
        Self {
            env,
            executor,
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
        }
    }

    /// Send the shell's own output and error messages somewhere other than the
    /// process streams. Forked children, including their redirect and exec
    /// failures, still write to the real descriptors.
    pub fn with_output(mut self, stdout: Box<dyn Write>, stderr: Box<dyn Write>) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// `true` once `exit` has run.
    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// Prompt text: the absolute working directory followed by `$ `.
    pub fn prompt(&mut self) -> Result<String> {
        match self.env.current_dir() {
            Ok(cwd) => Ok(format!("{}$ ", cwd.display())),
            Err(errno) => {
                writeln!(self.stderr, "getcwd: {}", errno.desc())?;
                Ok(String::new())
            }
        }
    }

    /// Parse and execute a single line. Blank lines do nothing.
    pub fn run_line(&mut self, line: impl AsRef<[u8]>) -> Result<()> {
        let command = parse_line(line);
        if command.is_empty() {
            return Ok(());
        }
        log::debug!("parsed {:?}", command);
        self.executor.execute(
            &command,
            self.stdout.as_mut(),
            self.stderr.as_mut(),
            &mut self.env,
        )?;
        self.stdout.flush()?;
        Ok(())
    }

    /// Prompt, read and execute until the input ends or `exit` is run.
    pub fn repl(&mut self, reader: &mut dyn LineReader) -> Result<()> {
        while !self.env.should_exit {
            let prompt = self.prompt()?;
            let Some(line) = reader.read_line(&prompt)? else {
                log::debug!("end of input");
                break;
            };
            self.run_line(&line)?;
        }
        Ok(())
    }
}

impl Default for Interpreter {
    /// Interpreter over the real process: actual working directory, fork and exec,
    /// standard output and error.
    fn default() -> Self {
        Self::new(Environment::new(), Executor::default())
    }
}
