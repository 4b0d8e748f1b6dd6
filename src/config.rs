use argh::FromArgs;

#[derive(FromArgs, Debug, Default, PartialEq, Eq)]
/// A small interactive shell: runs programs with optional `< in` and `> out`
/// redirections, plus the `cd` and `exit` built-ins.
/// Log verbosity follows RUST_LOG (default: warn).
pub struct Options {
    #[argh(option, short = 'c')]
    /// run this single command line and exit instead of reading input.
    pub command: Option<String>,

    #[argh(switch)]
    /// read lines from standard input without the line editor. Implied when
    /// standard input is not a terminal.
    pub plain: bool,
}

impl Options {
    /// Whether the rustyline editor should be used for the given input.
    pub fn use_editor(&self, stdin_is_terminal: bool) -> bool {
        !self.plain && stdin_is_terminal
    }
}
