//! Removes debugging statements from JavaScript sources.
//!
//! `console.<method>(...)` calls, `alert(...)` calls and `debugger` statements
//! are removed. A call that starts a statement is dropped together with its
//! `;`; one used inside an expression becomes `void 0` so the surrounding code
//! still parses. String, template, comment and regex literals are skipped, so
//! their contents are never touched.

use crate::errors::ExtpackError;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// What a strip pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StripReport {
    /// `console.*` calls removed or neutralized.
    pub console_calls: usize,
    /// `debugger` statements removed.
    pub debugger_statements: usize,
    /// `alert(...)` calls removed or neutralized.
    pub alert_calls: usize,
}

impl StripReport {
    /// Total removals.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.console_calls + self.debugger_statements + self.alert_calls
    }

    /// Adds another report into this one.
    pub fn merge(&mut self, other: Self) {
        self.console_calls += other.console_calls;
        self.debugger_statements += other.debugger_statements;
        self.alert_calls += other.alert_calls;
    }
}

const fn is_ident_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'$' || c >= 0x80
}

fn ident_end(src: &[u8], start: usize) -> usize {
    src[start..]
        .iter()
        .position(|&c| !is_ident_byte(c))
        .map_or(src.len(), |off| start + off)
}

fn skip_whitespace(src: &[u8], mut pos: usize) -> usize {
    while pos < src.len() && src[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

fn swallow_semicolon(src: &[u8], end: usize) -> usize {
    let mut pos = end;
    while pos < src.len() && matches!(src[pos], b' ' | b'\t') {
        pos += 1;
    }
    if src.get(pos) == Some(&b';') {
        pos + 1
    } else {
        end
    }
}

/// Marker recorded in `prev` after a keyword that is followed by an
/// expression.
const KEYWORD: u8 = b'k';

/// Keywords after which a `/` opens a regex literal.
const EXPRESSION_KEYWORDS: &[&str] = &[
    "await", "case", "delete", "do", "else", "in", "instanceof", "new", "of", "return", "throw",
    "typeof", "void", "yield",
];

/// A `/` starts a regex literal rather than a division after these.
const fn regex_allowed(prev: Option<u8>) -> bool {
    match prev {
        None => true,
        Some(c) => matches!(
            c,
            b'(' | b',' | b'=' | b':' | b'[' | b'!' | b'&' | b'|' | b'?' | b'{' | b'}' | b';'
                | b'+' | b'-' | b'*' | b'%' | b'<' | b'>' | b'~' | b'^' | KEYWORD
        ),
    }
}

#[derive(Clone)]
struct Scanner<'a> {
    src: &'a [u8],
    pos: usize,
    /// Last significant byte; identifiers record `a`, expression keywords
    /// [`KEYWORD`], literals `"`.
    prev: Option<u8>,
}

impl<'a> Scanner<'a> {
    const fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            pos: 0,
            prev: None,
        }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    const fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// Steps over a string, template, comment or regex literal at the cursor.
    fn skip_literal(&mut self) -> bool {
        let Some(c) = self.peek(0) else {
            return false;
        };
        match c {
            b'\'' | b'"' => {
                self.skip_quoted(c);
                self.prev = Some(b'"');
                true
            }
            b'`' => {
                self.skip_template();
                self.prev = Some(b'"');
                true
            }
            b'/' => match self.peek(1) {
                Some(b'/') => {
                    while !self.at_end() && self.src[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                    true
                }
                Some(b'*') => {
                    self.pos += 2;
                    while !self.at_end() && !(self.src[self.pos] == b'*' && self.peek(1) == Some(b'/')) {
                        self.pos += 1;
                    }
                    self.pos = (self.pos + 2).min(self.src.len());
                    true
                }
                _ if regex_allowed(self.prev) => {
                    self.skip_regex();
                    self.prev = Some(b'"');
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    fn skip_quoted(&mut self, quote: u8) {
        self.pos += 1;
        while !self.at_end() {
            match self.src[self.pos] {
                b'\\' => self.pos += 2,
                c if c == quote => {
                    self.pos += 1;
                    return;
                }
                b'\n' => return,
                _ => self.pos += 1,
            }
        }
        self.pos = self.src.len();
    }

    fn skip_template(&mut self) {
        self.pos += 1;
        while !self.at_end() {
            match self.src[self.pos] {
                b'\\' => self.pos += 2,
                b'`' => {
                    self.pos += 1;
                    return;
                }
                b'$' if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    self.skip_balanced(b'{', b'}');
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.src.len();
    }

    fn skip_regex(&mut self) {
        let start = self.pos;
        self.pos += 1;
        let mut in_class = false;
        while !self.at_end() {
            match self.src[self.pos] {
                b'\\' => self.pos += 2,
                b'[' => {
                    in_class = true;
                    self.pos += 1;
                }
                b']' => {
                    in_class = false;
                    self.pos += 1;
                }
                b'/' if !in_class => {
                    self.pos = ident_end(self.src, self.pos + 1);
                    return;
                }
                b'\n' => {
                    // Not a regex after all; treat the slash as an operator.
                    self.pos = start + 1;
                    return;
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.src.len();
    }

    /// With the cursor just past `open`, advances past the matching `close`.
    fn skip_balanced(&mut self, open: u8, close: u8) -> bool {
        let mut depth = 1usize;
        self.prev = Some(open);
        while !self.at_end() {
            if self.skip_literal() {
                continue;
            }
            let c = self.src[self.pos];
            self.pos += 1;
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    self.prev = Some(close);
                    return true;
                }
            }
            if !c.is_ascii_whitespace() {
                self.prev = Some(c);
            }
        }
        false
    }

    /// Matches `.method(...)` after a `console` identifier ending at `from`.
    fn console_call_end(&self, from: usize) -> Option<usize> {
        let src = self.src;
        let mut pos = skip_whitespace(src, from);
        if src.get(pos) != Some(&b'.') {
            return None;
        }
        pos = skip_whitespace(src, pos + 1);
        let method_end = ident_end(src, pos);
        if method_end == pos {
            return None;
        }
        self.arguments_end(method_end)
    }

    /// Matches `(...)` after a callee ending at `from`.
    fn arguments_end(&self, from: usize) -> Option<usize> {
        let pos = skip_whitespace(self.src, from);
        if self.src.get(pos) != Some(&b'(') {
            return None;
        }

        let mut call = self.clone();
        call.pos = pos + 1;
        call.skip_balanced(b'(', b')').then_some(call.pos)
    }
}

#[derive(Clone, Copy)]
enum Removal {
    Console,
    Debugger,
    Alert,
}

/// Strips debugging statements from `source`.
#[must_use]
pub fn strip_debug(source: &str) -> (String, StripReport) {
    let src = source.as_bytes();
    let mut scanner = Scanner::new(src);
    let mut out = String::with_capacity(source.len());
    let mut copied = 0;
    let mut report = StripReport::default();

    while !scanner.at_end() {
        if scanner.skip_literal() {
            continue;
        }

        let c = src[scanner.pos];
        if !(is_ident_byte(c) && !c.is_ascii_digit()) {
            scanner.pos += 1;
            if !c.is_ascii_whitespace() {
                scanner.prev = Some(c);
            }
            continue;
        }

        let start = scanner.pos;
        let end = ident_end(src, start);
        let removal = if scanner.prev == Some(b'.') {
            None
        } else {
            match &source[start..end] {
                "console" => scanner.console_call_end(end).map(|stop| (stop, Removal::Console)),
                "debugger" => {
                    let next = src.get(skip_whitespace(src, end)).copied();
                    if matches!(next, Some(b':' | b'(' | b'=' | b'.')) {
                        None
                    } else {
                        Some((end, Removal::Debugger))
                    }
                }
                // `function alert(...)` declares rather than calls.
                "alert" if scanner.prev != Some(b'a') => {
                    scanner.arguments_end(end).map(|stop| (stop, Removal::Alert))
                }
                _ => None,
            }
        };

        let Some((stop, kind)) = removal else {
            let word = &source[start..end];
            scanner.pos = end;
            scanner.prev = if scanner.prev != Some(b'.') && EXPRESSION_KEYWORDS.contains(&word) {
                Some(KEYWORD)
            } else {
                Some(b'a')
            };
            continue;
        };

        out.push_str(&source[copied..start]);
        let statement_start = matches!(scanner.prev, None | Some(b';' | b'{' | b'}'));
        let resume = if statement_start {
            swallow_semicolon(src, stop)
        } else {
            out.push_str("void 0");
            scanner.prev = Some(b'0');
            stop
        };
        copied = resume;
        scanner.pos = resume;

        match kind {
            Removal::Console => report.console_calls += 1,
            Removal::Debugger => report.debugger_statements += 1,
            Removal::Alert => report.alert_calls += 1,
        }
    }

    out.push_str(&source[copied..]);
    (out, report)
}

/// Strips the file at `path` in place. Files with nothing to strip are not
/// rewritten.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written.
pub async fn strip_file(path: &Path) -> Result<StripReport, ExtpackError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ExtpackError::io_at(path, e))?;
    let (stripped, report) = strip_debug(&text);
    if report.total() > 0 {
        tokio::fs::write(path, stripped)
            .await
            .map_err(|e| ExtpackError::io_at(path, e))?;
        debug!(path = %path.display(), removed = report.total(), "Stripped debug statements");
    }
    Ok(report)
}
