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

//! Command name matching.
//!
//! A command name is matched word by word against the words the user typed.
//! Every word may be abbreviated to 3 or more characters, except that a
//! 3-character abbreviation of the first word is rejected when the command
//! table contains an adjacent entry whose first word shares the same first
//! three letters.  That rule is what makes table order significant.

use crate::command::{Command, ProgramState};

/// Result of matching typed words against one command table entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MatchResult {
    /// The words cannot belong to this command.
    NoMatch,

    /// The words so far are a prefix of this command's name.
    Partial {
        /// True if the next word of the command's name begins with a hyphen.
        dash_possible: bool,
    },

    /// The words name this command in full.
    Complete,
}

/// Splits a command name into match words.  A maximal run of alphanumeric
/// characters is one word and any other non-space character is a word by
/// itself.
pub fn split_words(name: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut rest = name;
    while let Some(start) = rest.find(|c: char| !c.is_whitespace()) {
        rest = &rest[start..];
        let Some(c) = rest.chars().next() else {
            break;
        };
        let len = if c.is_alphanumeric() {
            rest.find(|c: char| !c.is_alphanumeric())
                .unwrap_or(rest.len())
        } else {
            c.len_utf8()
        };
        words.push(&rest[..len]);
        rest = &rest[len..];
    }
    words
}

/// Returns the length of the longest common case-insensitive prefix of `a`
/// and `b`.
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .take_while(|(a, b)| a.eq_ignore_ascii_case(b))
        .count()
}

/// Returns true if first words `a` and `b` can be confused on the basis of
/// their first three letters.
fn conflicting_3char_prefixes(a: &str, b: &str) -> bool {
    if a.len() < 3 || b.len() < 3 {
        return false;
    }

    // Words that are the same don't conflict.
    if a.eq_ignore_ascii_case(b) {
        return false;
    }

    // Two words that are both exactly 3 letters can only be told apart in
    // full, so they don't conflict either.
    if a.len() == 3 && b.len() == 3 {
        return false;
    }

    a[..3].eq_ignore_ascii_case(&b[..3])
}

fn first_word(name: &str) -> &str {
    split_words(name).first().copied().unwrap_or("")
}

/// Returns true if the entry at `index` 3-letter-conflicts with either of its
/// immediate neighbors in `commands`.
fn has_conflicting_neighbor(commands: &[Command], index: usize) -> bool {
    let word = first_word(commands[index].name);
    (index > 0 && conflicting_3char_prefixes(word, first_word(commands[index - 1].name)))
        || (index + 1 < commands.len()
            && conflicting_3char_prefixes(word, first_word(commands[index + 1].name)))
}

/// Matches `words` against the entry at `index` in `commands`.
pub fn match_entry(commands: &[Command], index: usize, words: &[String]) -> MatchResult {
    let name_words = split_words(commands[index].name);
    for (word_idx, word) in words.iter().enumerate() {
        let Some(name_word) = name_words.get(word_idx) else {
            // More words typed than the name has.
            return MatchResult::NoMatch;
        };
        if name_word.eq_ignore_ascii_case(word) {
            continue;
        }
        match common_prefix_len(name_word, word) {
            0..=2 => return MatchResult::NoMatch,
            3 => {
                if word_idx == 0 && has_conflicting_neighbor(commands, index) {
                    return MatchResult::NoMatch;
                }
            }
            _ => (),
        }
    }
    if words.len() == name_words.len() {
        MatchResult::Complete
    } else {
        MatchResult::Partial {
            dash_possible: name_words[words.len()].starts_with('-'),
        }
    }
}

/// Returns the number of entries in `commands` for which `words` are a
/// partial or complete match, and whether any partial match continues with a
/// hyphen word.  Entries invisible in `state` (or debug-only while testing
/// mode is off) are treated as absent.
pub fn count_matches(
    commands: &[Command],
    words: &[String],
    state: ProgramState,
    testing_mode: bool,
) -> (usize, bool) {
    let mut count = 0;
    let mut dash_possible = false;
    for (index, command) in commands.iter().enumerate() {
        if !command.visible(state, testing_mode) {
            continue;
        }
        match match_entry(commands, index, words) {
            MatchResult::NoMatch => (),
            MatchResult::Partial { dash_possible: d } => {
                count += 1;
                dash_possible |= d;
            }
            MatchResult::Complete => count += 1,
        }
    }
    (count, dash_possible)
}

/// Returns the visible entry that `words` name in full, if there is one.
pub fn find_complete<'a>(
    commands: &'a [Command],
    words: &[String],
    state: ProgramState,
    testing_mode: bool,
) -> Option<&'a Command> {
    commands
        .iter()
        .enumerate()
        .filter(|(_index, command)| command.visible(state, testing_mode))
        .find(|(index, _command)| match_entry(commands, *index, words) == MatchResult::Complete)
        .map(|(_index, command)| command)
}
