use crate::command::{Command, RedirectTarget};
use crate::lexer::{REDIRECT_IN, REDIRECT_OUT, Tokens};
use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;

fn os_string(token: &[u8]) -> OsString {
    OsStr::from_bytes(token).to_os_string()
}

struct CommandBuilder<'a> {
    tokens: Tokens<'a>,
    command: Command,
}

impl<'a> CommandBuilder<'a> {
    fn from(line: &'a [u8]) -> Self {
        CommandBuilder {
            tokens: Tokens::new(line),
            command: Command::default(),
        }
    }

    /// Consume the token after a redirection operator.
    fn redirect_target(&mut self, op: &[u8]) -> RedirectTarget {
        match self.tokens.next() {
            Some(path) => RedirectTarget::Path(os_string(path)),
            None => {
                log::warn!(
                    "`{}` at end of line has no path, ignoring it",
                    String::from_utf8_lossy(op)
                );
                RedirectTarget::Missing
            }
        }
    }

    fn build(mut self) -> Command {
        while let Some(token) = self.tokens.next() {
            match token {
                REDIRECT_IN => self.command.input = Some(self.redirect_target(token)),
                REDIRECT_OUT => self.command.output = Some(self.redirect_target(token)),
                word => self.command.arguments.push(os_string(word)),
            }
        }
        self.command
    }
}

/// Parse one input line into a [`Command`].
///
/// Parsing cannot fail: a blank line gives an empty command, and nothing is checked
/// about the program name or the redirect paths until execution. The line does not
/// have to be valid UTF-8.
pub fn parse_line(line: impl AsRef<[u8]>) -> Command {
    CommandBuilder::from(line.as_ref()).build()
}
