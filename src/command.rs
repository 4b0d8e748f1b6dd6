use std::ffi::{OsStr, OsString};
use std::fmt;

/// Where a redirection operator points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    /// The token following the operator.
    Path(OsString),
    /// The operator was the last token on the line.
    Missing,
}

impl RedirectTarget {
    /// The path to open, if one was given.
    pub fn path(&self) -> Option<&OsStr> {
        match self {
            RedirectTarget::Path(p) => Some(p),
            RedirectTarget::Missing => None,
        }
    }
}

/// One parsed input line.
///
/// `arguments[0]` names the built-in or program to run. Arguments and paths are
/// kept as the raw bytes the user typed. A later `<`/`>` on the same line replaces
/// an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    pub arguments: Vec<OsString>,
    pub input: Option<RedirectTarget>,
    pub output: Option<RedirectTarget>,
}

impl Command {
    /// True for a line that was blank; such a command does nothing.
    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    pub fn name(&self) -> Option<&OsStr> {
        self.arguments.first().map(OsString::as_os_str)
    }

    pub fn input_path(&self) -> Option<&OsStr> {
        self.input.as_ref().and_then(RedirectTarget::path)
    }

    pub fn output_path(&self) -> Option<&OsStr> {
        self.output.as_ref().and_then(RedirectTarget::path)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<_> = self.arguments.iter().map(|a| a.to_string_lossy()).collect();
        write!(f, "{}", args.join(" "))?;
        for (op, target) in [("<", &self.input), (">", &self.output)] {
            match target {
                Some(RedirectTarget::Path(p)) => write!(f, " {} {}", op, p.to_string_lossy())?,
                Some(RedirectTarget::Missing) => write!(f, " {}", op)?,
                None => {}
            }
        }
        Ok(())
    }
}
