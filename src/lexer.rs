//! Lexical analysis of a single input line.
//!
//! Tokens are separated by runs of spaces and newlines and nothing else: there is
//! no quoting, escaping or substitution. `<` and `>` are only special when they
//! stand alone as a whole token, which is why the parser (not the lexer) decides
//! what they mean. Lines are raw bytes; nothing here requires UTF-8.

/// Input redirection operator.
pub const REDIRECT_IN: &[u8] = b"<";
/// Output redirection operator.
pub const REDIRECT_OUT: &[u8] = b">";

fn is_separator(b: u8) -> bool {
    matches!(b, b' ' | b'\n')
}

/// Incremental tokenizer over a borrowed line.
///
/// Each call to [`Iterator::next`] yields the next non-empty token, so callers can
/// pull an extra token on demand (e.g. the path after `<`). Once the line is
/// exhausted every further call returns `None`.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    line: &'a [u8],
    pos: usize,
}

impl<'a> Tokens<'a> {
    pub fn new(line: &'a [u8]) -> Self {
        Tokens { line, pos: 0 }
    }

    fn proceed_while(&mut self, f: impl Fn(u8) -> bool) {
        while let Some(&b) = self.line.get(self.pos) {
            if !f(b) {
                break;
            }
            self.pos += 1;
        }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        self.proceed_while(is_separator);
        if self.pos >= self.line.len() {
            return None;
        }
        let start = self.pos;
        self.proceed_while(|b| !is_separator(b));
        Some(&self.line[start..self.pos])
    }
}

/// Splits a whole line into tokens at once.
pub fn split_into_tokens(line: &[u8]) -> Vec<&[u8]> {
    Tokens::new(line).collect()
}
