use std::fmt;

use thiserror::Error;

/// Diagnostics past this count are counted but not kept.
pub const MAX_DIAGNOSTICS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("Unterminated string")]
    UnterminatedString,

    #[error("Unknown character '{0}'")]
    UnknownCharacter(char),

    #[error("Integer literal '{0}' is out of range")]
    IntegerOutOfRange(String),

    #[error("Expected opening brace '{{' after {after}")]
    ExpectedOpenBrace { after: &'static str },

    #[error("Unterminated block: expected '}}' to close {opened_by} before end of input")]
    UnterminatedBlock { opened_by: &'static str },

    #[error("Expected {expected} after '{command}'")]
    MissingArgument {
        command: String,
        expected: &'static str,
    },

    #[error("Expected comparison operator (<, >, ==, !=) in {after} condition")]
    ExpectedComparison { after: &'static str },

    #[error("Blocks nested deeper than {limit} levels; skipping this {opened_by} block")]
    NestingTooDeep { opened_by: &'static str, limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub column: usize,
    pub error: CompileError,
}

impl Diagnostic {
    pub fn new(line: usize, column: usize, error: CompileError) -> Self {
        Diagnostic { line, column, error }
    }

    /// Render with the offending source line and a caret under the column.
    pub fn render(&self, source: &SourceText) -> String {
        let mut out = format!("{}\n", self);
        if let Some(content) = source.line(self.line) {
            let gutter = self.line.to_string().len();
            out.push_str(&format!("  {:width$} |\n", "", width = gutter));
            out.push_str(&format!("  {} | {}\n", self.line, content.trim_end()));
            let offset = self.column.saturating_sub(1);
            out.push_str(&format!(
                "  {:width$} | {}^--- here\n",
                "",
                " ".repeat(offset),
                width = gutter
            ));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}, Col {}: {}", self.line, self.column, self.error)
    }
}

/// Ordered diagnostic log with a fixed cap. Overflow is counted in `dropped`.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
    dropped: usize,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if self.entries.len() < MAX_DIAGNOSTICS {
            self.entries.push(diagnostic);
        } else {
            self.dropped += 1;
        }
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}

/// Edit distance between two words, computed one row at a time.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal
            } else {
                1 + diagonal.min(above).min(row[j])
            };
            diagonal = above;
        }
    }

    row[b.len()]
}

/// Closest command word within a small edit budget.
///
/// Words of two letters or fewer are taken as intentional and get no hint,
/// and neither does a word that is already a command.
pub fn suggest_command<'k>(word: &str, commands: &[&'k str]) -> Option<&'k str> {
    let word = word.to_ascii_lowercase();
    if word.len() <= 2 || commands.iter().any(|c| *c == word) {
        return None;
    }

    let budget = if word.len() >= 4 { 2 } else { 1 };
    commands
        .iter()
        .copied()
        .filter(|c| c.len().abs_diff(word.len()) <= budget)
        .map(|c| (edit_distance(&word, c), c))
        .filter(|&(distance, _)| distance <= budget)
        .min_by_key(|&(distance, _)| distance)
        .map(|(_, c)| c)
}

/// A program's text with the name it was read from, for caret rendering.
pub struct SourceText<'a> {
    pub name: &'a str,
    text: &'a str,
}

impl<'a> SourceText<'a> {
    pub fn new(name: &'a str, text: &'a str) -> Self {
        SourceText { name, text }
    }

    /// 1-based line lookup.
    pub fn line(&self, number: usize) -> Option<&'a str> {
        number.checked_sub(1).and_then(|index| self.text.lines().nth(index))
    }
}
