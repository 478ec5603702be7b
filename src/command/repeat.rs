// Tally - a program for statistical analysis.
// Copyright (C) 2026 Free Software Foundation, Inc.
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <http://www.gnu.org/licenses/>.

//! DO REPEAT ... END REPEAT.
//!
//! `DO REPEAT` binds dummy variables to lists of substitution values, buffers
//! the raw lines between itself and the matching `END REPEAT`, and then
//! replays the buffered lines once per substitution value, with each dummy
//! variable textually replaced by its value for the current pass.  The
//! replayed lines re-enter the regular lexer through the line source, so
//! whatever they contain is parsed as ordinary syntax, including further
//! `DO REPEAT` commands.

use std::{cell::RefCell, rc::Rc};

use thiserror::Error as ThisError;
use unicase::UniCase;

use crate::{
    command::{CommandResult, Context},
    dictionary::VarWidth,
    identifier::{Identifier, IdentifierChar, id_match},
    lex::token::{Punct, Token},
    message::Diagnostic,
    source::{Line, LineFilter, LineSupplier},
};

#[derive(Clone, Debug, ThisError, PartialEq)]
pub enum RepeatError {
    #[error("expecting dummy variable name")]
    ExpectedDummyName,

    #[error("Dummy variable name `{0}` is given twice.")]
    DuplicateDummy(Identifier),

    #[error("expecting `=` following dummy variable name")]
    ExpectedEquals,

    #[error("expecting variable names, numbers, or strings as substitution values")]
    ExpectedValues,

    #[error("expecting number")]
    ExpectedNumber,

    #[error("Ranges may only have integer bounds.")]
    NonIntegerRange,

    #[error("Range spans {count} values, which exceeds the limit of {limit}.")]
    TooManyValues { count: u64, limit: usize },

    #[error(
        "Dummy variable `{first}` had {first_count} substitutions, \
         so `{second}` must also, but {second_count} were specified."
    )]
    CountMismatch {
        first: Identifier,
        first_count: usize,
        second: Identifier,
        second_count: usize,
    },

    #[error("expecting `/` or end of command")]
    ExpectedSlashOrEnd,

    #[error("Missing END REPEAT following DO REPEAT.")]
    MissingEndRepeat,

    #[error("DO REPEAT body longer than {0} lines; missing END REPEAT?")]
    TooManyLines(usize),

    #[error("No matching DO REPEAT.")]
    NoMatchingDoRepeat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum EntryKind {
    /// Values are variable names, to be created if they don't exist.
    NameList,

    /// Values are arbitrary replacement text.
    Other,
}

/// One dummy variable and its per-iteration values.
struct RepeatEntry {
    name: Identifier,
    kind: EntryKind,
    values: Vec<String>,
}

/// A fully parsed construct, shared between the installed filter and
/// supplier.
pub struct RepeatBlock {
    entries: Vec<RepeatEntry>,
    lines: Vec<Line>,
    n_iterations: usize,

    /// Current pass, 0-based.
    iteration: usize,

    /// Index of the next line to replay within the current pass.
    cursor: usize,

    print: bool,
}

impl RepeatBlock {
    /// Whether `END REPEAT PRINT` asked for replayed lines to be shown.
    pub fn print(&self) -> bool {
        self.print
    }

    fn value_for(&self, word: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.name == *word)
            .and_then(|entry| entry.values.get(self.iteration))
            .map(String::as_str)
    }

    /// Replaces each identifier-shaped run that names a dummy variable (the
    /// whole run, case-insensitively) with the dummy's value for the current
    /// pass.  Text inside single or double quotes passes through unchanged.
    fn substitute(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        let mut quote = None;
        while let Some(c) = rest.chars().next() {
            if let Some(q) = quote {
                if c == q {
                    quote = None;
                }
                out.push(c);
                rest = &rest[c.len_utf8()..];
            } else if c == '\'' || c == '"' {
                quote = Some(c);
                out.push(c);
                rest = &rest[c.len_utf8()..];
            } else if c.may_start_id() {
                let end = rest
                    .find(|c: char| !c.may_continue_id())
                    .unwrap_or(rest.len());
                let (word, after) = rest.split_at(end);
                match self.value_for(word) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(word),
                }
                rest = after;
            } else {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
        out
    }
}

struct RepeatFilter(Rc<RefCell<RepeatBlock>>);

impl LineFilter for RepeatFilter {
    fn apply(&mut self, line: &mut Line) {
        let block = self.0.borrow();
        line.text = block.substitute(&line.text);
    }
}

struct RepeatSupplier(Rc<RefCell<RepeatBlock>>);

impl LineSupplier for RepeatSupplier {
    fn get(&mut self) -> Option<Line> {
        let mut block = self.0.borrow_mut();
        loop {
            if block.cursor < block.lines.len() {
                let line = block.lines[block.cursor].clone();
                block.cursor += 1;
                return Some(line);
            }
            block.iteration += 1;
            if block.iteration >= block.n_iterations || block.lines.is_empty() {
                return None;
            }
            block.cursor = 0;
        }
    }
}

/// DO REPEAT.
pub fn cmd_do_repeat(context: &mut Context) -> CommandResult {
    match parse_repeat(context) {
        Ok(()) => CommandResult::Success,
        Err(error) => {
            let location = context.lexer.location();
            context.error(Diagnostic::error(location, error));
            context.lexer.skip_to_end_of_command();
            CommandResult::CascadingFailure
        }
    }
}

/// END REPEAT.  A real `END REPEAT` is consumed while the body of its
/// `DO REPEAT` is buffered, so one that reaches command dispatch has no open
/// construct.
pub fn cmd_end_repeat(context: &mut Context) -> CommandResult {
    let location = context.lexer.location();
    context.error(Diagnostic::error(location, RepeatError::NoMatchingDoRepeat));
    context.lexer.skip_to_end_of_command();
    CommandResult::CascadingFailure
}

fn parse_repeat(context: &mut Context) -> Result<(), RepeatError> {
    let entries = parse_entries(context)?;

    if !context.lexer.at_end() {
        return Err(RepeatError::ExpectedSlashOrEnd);
    }
    context.lexer.match_token(&Token::End);
    // The body starts on the next line.
    context.lexer.discard_rest_of_line();

    let (lines, print) = buffer_body(context)?;

    for entry in &entries {
        if entry.kind == EntryKind::NameList {
            for value in &entry.values {
                context
                    .dictionary
                    .create(Identifier(UniCase::new(value.clone())), VarWidth::Numeric);
            }
        }
    }

    let n_iterations = entries.first().map(|e| e.values.len()).unwrap_or(0);
    let block = Rc::new(RefCell::new(RepeatBlock {
        entries,
        lines,
        n_iterations,
        iteration: 0,
        cursor: 0,
        print,
    }));
    let source = context.lexer.source_mut();
    source.install_supplier(Box::new(RepeatSupplier(Rc::clone(&block))));
    source.install_filter(Box::new(RepeatFilter(block)));
    context.lexer.reset_eof();
    Ok(())
}

fn parse_entries(context: &mut Context) -> Result<Vec<RepeatEntry>, RepeatError> {
    let mut entries: Vec<RepeatEntry> = Vec::new();
    loop {
        let name = context
            .lexer
            .take_id()
            .ok_or(RepeatError::ExpectedDummyName)?;
        if entries.iter().any(|entry| entry.name == name) {
            return Err(RepeatError::DuplicateDummy(name));
        }
        if let Some(variable) = context.dictionary.lookup(&name) {
            let location = context.lexer.location();
            context.error(Diagnostic::warning(
                location,
                format!(
                    "Dummy variable name `{name}` hides dictionary variable `{}`.",
                    variable.name
                ),
            ));
        }
        if !context.lexer.match_token(&Token::Punct(Punct::Equals)) {
            return Err(RepeatError::ExpectedEquals);
        }

        let (kind, values) = parse_values(context)?;
        if let Some(first) = entries.first() {
            if values.len() != first.values.len() {
                return Err(RepeatError::CountMismatch {
                    first: first.name.clone(),
                    first_count: first.values.len(),
                    second: name,
                    second_count: values.len(),
                });
            }
        }
        entries.push(RepeatEntry { name, kind, values });

        if !context.lexer.match_token(&Token::Punct(Punct::Slash)) {
            return Ok(entries);
        }
    }
}

fn parse_values(context: &mut Context) -> Result<(EntryKind, Vec<String>), RepeatError> {
    match context.lexer.token() {
        Some(Token::Id(_)) => {
            let mut values = Vec::new();
            while let Some(id) = context.lexer.take_id() {
                values.push(String::from(id.as_str()));
                context.lexer.match_token(&Token::Punct(Punct::Comma));
            }
            Ok((EntryKind::NameList, values))
        }
        Some(Token::String(_)) => {
            let mut values = Vec::new();
            while let Some(s) = context.lexer.take_string() {
                // Requoted so that substituting the dummy yields a valid
                // string literal.
                values.push(Token::String(s).to_string());
                context.lexer.match_token(&Token::Punct(Punct::Comma));
            }
            Ok((EntryKind::Other, values))
        }
        Some(Token::Number(_) | Token::Punct(Punct::Dash)) => {
            let mut values = Vec::new();
            loop {
                let first = take_number(context)?;
                if context.lexer.match_token(&Token::Punct(Punct::To)) {
                    let last = take_number(context)?;
                    expand_range(first, last, context.settings.max_repeat_values, &mut values)?;
                } else {
                    values.push(Token::Number(first).to_string());
                }
                context.lexer.match_token(&Token::Punct(Punct::Comma));
                if !matches!(
                    context.lexer.token(),
                    Some(Token::Number(_) | Token::Punct(Punct::Dash))
                ) {
                    return Ok((EntryKind::Other, values));
                }
            }
        }
        _ => Err(RepeatError::ExpectedValues),
    }
}

fn take_number(context: &mut Context) -> Result<f64, RepeatError> {
    let negative = context.lexer.match_token(&Token::Punct(Punct::Dash));
    match context.lexer.token().and_then(Token::as_number) {
        Some(number) => {
            context.lexer.get();
            Ok(if negative { -number } else { number })
        }
        None => Err(RepeatError::ExpectedNumber),
    }
}

/// Expands `first TO last` into one value per integer in the inclusive
/// range, ascending or descending as given.  The range is materialized
/// eagerly, so its size is checked against `limit` first.
fn expand_range(
    first: f64,
    last: f64,
    limit: usize,
    values: &mut Vec<String>,
) -> Result<(), RepeatError> {
    let (first, last) = match (
        Token::Number(first).as_integer(),
        Token::Number(last).as_integer(),
    ) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(RepeatError::NonIntegerRange),
    };
    let count = first.abs_diff(last).saturating_add(1);
    if count > limit.saturating_sub(values.len()) as u64 {
        return Err(RepeatError::TooManyValues { count, limit });
    }
    if first <= last {
        values.extend((first..=last).map(|i| i.to_string()));
    } else {
        values.extend((last..=first).rev().map(|i| i.to_string()));
    }
    Ok(())
}

fn buffer_body(context: &mut Context) -> Result<(Vec<Line>, bool), RepeatError> {
    let mut lines = Vec::new();
    let mut depth = 1usize;
    loop {
        let Some(line) = context.lexer.source_mut().read_line() else {
            return Err(RepeatError::MissingEndRepeat);
        };
        match recognize_marker(&line.text) {
            Marker::DoRepeat => depth += 1,
            Marker::EndRepeat { print } => {
                depth -= 1;
                if depth == 0 {
                    return Ok((lines, print));
                }
            }
            Marker::Plain => (),
        }
        if lines.len() >= context.settings.max_loop_lines {
            return Err(RepeatError::TooManyLines(context.settings.max_loop_lines));
        }
        lines.push(Line {
            text: String::from(line.text.trim_end()),
            file_name: line.file_name.clone(),
            // Negative line numbers mark replayed lines.
            number: -line.number.abs(),
        });
    }
}

enum Marker {
    DoRepeat,
    EndRepeat { print: bool },
    Plain,
}

/// Recognizes a line that opens or closes a construct.  This is a textual
/// scan run before any tokenization: a single leading `+` or `-` is ignored
/// and keywords may be abbreviated to 3 characters.  Quoting is not
/// considered, so a line whose first words are the marker words inside a
/// string literal still counts as a marker.
fn recognize_marker(text: &str) -> Marker {
    let rest = text.trim_start();
    let rest = rest.strip_prefix(['+', '-']).unwrap_or(rest);
    let (first, rest) = split_first_word(rest);
    if id_match("DO", first) {
        let (second, _rest) = split_first_word(rest);
        if id_match("REPEAT", second) {
            return Marker::DoRepeat;
        }
    } else if id_match("END", first) {
        let (second, rest) = split_first_word(rest);
        if id_match("REPEAT", second) {
            let (third, _rest) = split_first_word(rest);
            return Marker::EndRepeat {
                print: id_match("PRINT", third),
            };
        }
    }
    Marker::Plain
}

fn split_first_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    let end = text
        .find(|c: char| !c.may_continue_id())
        .unwrap_or(text.len());
    text.split_at(end)
}

#[cfg(test)]
mod test {
    use unicase::UniCase;

    use crate::{
        command::repeat::{EntryKind, Marker, RepeatBlock, RepeatEntry, recognize_marker},
        identifier::Identifier,
    };

    fn block(bindings: &[(&str, &[&str])]) -> RepeatBlock {
        let entries = bindings
            .iter()
            .map(|(name, values)| RepeatEntry {
                name: Identifier(UniCase::new(String::from(*name))),
                kind: EntryKind::Other,
                values: values.iter().map(|v| String::from(*v)).collect(),
            })
            .collect::<Vec<_>>();
        let n_iterations = entries.first().map(|e| e.values.len()).unwrap_or(0);
        RepeatBlock {
            entries,
            lines: Vec::new(),
            n_iterations,
            iteration: 0,
            cursor: 0,
            print: false,
        }
    }

    #[test]
    fn markers() {
        assert!(matches!(recognize_marker("do repeat x=1."), Marker::DoRepeat));
        assert!(matches!(recognize_marker("  +DO REP y=a."), Marker::DoRepeat));
        assert!(matches!(
            recognize_marker("end repeat."),
            Marker::EndRepeat { print: false }
        ));
        assert!(matches!(
            recognize_marker("-end rep print."),
            Marker::EndRepeat { print: true }
        ));
        assert!(matches!(recognize_marker("compute x=1."), Marker::Plain));
        // One- and two-letter abbreviations don't count.
        assert!(matches!(recognize_marker("do re x=1."), Marker::Plain));
        // The scan is not aware of quoting.
        assert!(matches!(
            recognize_marker("'end repeat' inside a string"),
            Marker::Plain
        ));
        assert!(matches!(
            recognize_marker("end repeat' inside a string"),
            Marker::EndRepeat { print: false }
        ));
    }

    #[test]
    fn substitution_is_length_exact_and_case_insensitive() {
        let block = block(&[("x", &["9"])]);
        assert_eq!(block.substitute("COMPUTE x=x+1."), "COMPUTE 9=9+1.");
        assert_eq!(block.substitute("COMPUTE X=1."), "COMPUTE 9=1.");
        assert_eq!(block.substitute("COMPUTE xx=x1."), "COMPUTE xx=x1.");
    }

    #[test]
    fn substitution_skips_quoted_spans() {
        let block = block(&[("A", &["9"])]);
        assert_eq!(block.substitute("PRINT 'A'."), "PRINT 'A'.");
        assert_eq!(block.substitute("PRINT \"A\" A."), "PRINT \"A\" 9.");
    }

    #[test]
    fn iteration_advances_values() {
        let mut block = block(&[("v", &["one", "two"])]);
        assert_eq!(block.substitute("v"), "one");
        block.iteration = 1;
        assert_eq!(block.substitute("v"), "two");
    }
}
