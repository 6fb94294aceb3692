//! Line reconstruction: fold physical text lines into one logical line per
//! statement record.
//!
//! PDF text extraction breaks long narrations over several physical lines and
//! repeats column headers on every page. The reconstructor is a two-state
//! machine (idle, buffering) driven by the adapter's [`LineRules`]:
//!
//! - a start marker closes the open record and opens a new one;
//! - header and separator lines are dropped wherever they appear and never
//!   close the open record;
//! - a terminator (end-of-table text such as a statement summary) closes the
//!   open record and returns to idle;
//! - anything else continues the open record, or is preamble while idle.

use regex::Regex;

/// A trimmed physical line and the page it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub page: usize,
    pub text: String,
}

impl RawLine {
    pub fn new(page: usize, text: impl Into<String>) -> Self {
        Self {
            page,
            text: text.into(),
        }
    }
}

/// One reconstructed record. `page` is where the record started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub page: usize,
    pub text: String,
    /// Physical lines folded into this one
    pub parts: usize,
}

impl LogicalLine {
    fn open(line: &RawLine) -> Self {
        Self {
            page: line.page,
            text: line.text.clone(),
            parts: 1,
        }
    }

    fn append(&mut self, continuation: &str, wrap: WrapMode) {
        match wrap {
            // "to 30-" + "06-2022" → "to 30-06-2022"
            WrapMode::HyphenStitch if self.text.ends_with('-') => {}
            _ => self.text.push(' '),
        }
        self.text.push_str(continuation);
        self.parts += 1;
    }
}

/// How a wrapped record continues on the next physical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    /// Wraps fall between tokens; continuations join with a space.
    Space,
    /// Wraps may split a token after a hyphen; a buffer ending in `-` is
    /// joined to its continuation with no separator.
    HyphenStitch,
}

const SEPARATOR: &str = r"^-{5,}";

#[derive(Debug, Clone)]
pub struct LineRules {
    starts: Vec<Regex>,
    headers: Vec<Regex>,
    terminators: Vec<Regex>,
    wrap: WrapMode,
}

impl LineRules {
    /// Rules with no start markers yet. Separator runs of five or more
    /// hyphens are always treated as header lines.
    pub fn new(wrap: WrapMode) -> Result<Self, regex::Error> {
        Ok(Self {
            starts: Vec::new(),
            headers: vec![Regex::new(SEPARATOR)?],
            terminators: Vec::new(),
            wrap,
        })
    }

    pub fn start(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.starts.push(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn header(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.headers.push(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn terminator(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.terminators.push(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn wrap(&self) -> WrapMode {
        self.wrap
    }

    pub fn is_start(&self, line: &str) -> bool {
        self.starts.iter().any(|re| re.is_match(line))
    }

    pub fn is_header(&self, line: &str) -> bool {
        self.headers.iter().any(|re| re.is_match(line))
    }

    pub fn is_terminator(&self, line: &str) -> bool {
        self.terminators.iter().any(|re| re.is_match(line))
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Buffering(LogicalLine),
}

#[derive(Debug)]
pub struct Reconstructor<'r> {
    rules: &'r LineRules,
    state: State,
}

impl<'r> Reconstructor<'r> {
    pub fn new(rules: &'r LineRules) -> Self {
        Self {
            rules,
            state: State::Idle,
        }
    }

    /// Feed one physical line; returns a record if this line closed one.
    pub fn push(&mut self, line: RawLine) -> Option<LogicalLine> {
        let text = line.text.trim();
        if text.is_empty() || self.rules.is_header(text) {
            return None;
        }

        if self.rules.is_start(text) {
            let opened = LogicalLine::open(&RawLine::new(line.page, text));
            return match std::mem::replace(&mut self.state, State::Buffering(opened)) {
                State::Buffering(done) => Some(done),
                State::Idle => None,
            };
        }

        if self.rules.is_terminator(text) {
            return match std::mem::replace(&mut self.state, State::Idle) {
                State::Buffering(done) => Some(done),
                State::Idle => None,
            };
        }

        match &mut self.state {
            State::Buffering(buffer) => buffer.append(text, self.rules.wrap),
            State::Idle => log::trace!("preamble line skipped: {text}"),
        }
        None
    }

    /// Flush the open record at end of stream.
    pub fn finish(self) -> Option<LogicalLine> {
        match self.state {
            State::Buffering(done) => Some(done),
            State::Idle => None,
        }
    }
}

/// Run the whole stream through a fresh reconstructor.
pub fn reconstruct(rules: &LineRules, lines: impl IntoIterator<Item = RawLine>) -> Vec<LogicalLine> {
    let mut machine = Reconstructor::new(rules);
    let mut out: Vec<LogicalLine> = lines.into_iter().filter_map(|l| machine.push(l)).collect();
    out.extend(machine.finish());
    out
}
