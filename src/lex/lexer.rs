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

//! High-level lexical analysis.
//!
//! The [Lexer] turns the lines served by a [LineSource] into [Token]s, one
//! line at a time, and holds them in a buffer that callers may also push
//! tokens back into.  Pushback has no depth limit, which is what lets command
//! name resolution consume a whole multi-word name and then return the words
//! that turned out to belong to the command body.

use std::collections::VecDeque;

use crate::{
    identifier::Identifier,
    lex::{scan::StringScanner, token::Token},
    message::{Diagnostic, Location},
    source::LineSource,
};

/// A [Token] together with where it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct LexToken {
    pub token: Token,
    pub location: Location,
}

pub struct Lexer {
    source: LineSource,

    /// Tokens not yet consumed, in order.  Refilled a line at a time.
    tokens: VecDeque<LexToken>,

    /// Scan errors not yet collected by the caller.
    diagnostics: Vec<Diagnostic>,

    eof: bool,
}

impl Lexer {
    pub fn new(source: LineSource) -> Self {
        Self {
            source,
            tokens: VecDeque::new(),
            diagnostics: Vec::new(),
            eof: false,
        }
    }

    /// Reads and scans lines until the token buffer is nonempty or input is
    /// exhausted.
    fn fill(&mut self) {
        while self.tokens.is_empty() && !self.eof {
            let Some(line) = self.source.read_line() else {
                self.eof = true;
                return;
            };
            let location = Location::new(line.file_name.clone(), line.number);
            for result in StringScanner::new(&line.text) {
                match result {
                    Ok(token) => self.tokens.push_back(LexToken {
                        token,
                        location: location.clone(),
                    }),
                    Err(error) => {
                        self.diagnostics.push(Diagnostic::error(location, error));
                        // Terminate the command in progress.  The scanner has
                        // already abandoned the rest of the line.
                        self.tokens.push_back(LexToken {
                            token: Token::End,
                            location: self
                                .source
                                .current_line()
                                .map(|line| Location::new(line.file_name.clone(), line.number))
                                .unwrap_or_default(),
                        });
                        break;
                    }
                }
            }
        }
    }

    /// Returns the next token without consuming it, or `None` at end of
    /// input.
    pub fn token(&mut self) -> Option<&Token> {
        self.fill();
        self.tokens.front().map(|t| &t.token)
    }

    /// Consumes and returns the next token.
    pub fn get(&mut self) -> Option<LexToken> {
        self.fill();
        self.tokens.pop_front()
    }

    /// Returns `token` to the front of the buffer.
    pub fn push_back(&mut self, token: LexToken) {
        self.tokens.push_front(token);
    }

    /// If the next token equals `token`, consumes it and returns true.
    pub fn match_token(&mut self, token: &Token) -> bool {
        if self.token() == Some(token) {
            self.tokens.pop_front();
            true
        } else {
            false
        }
    }

    /// If the next token is an identifier matching `keyword` (with the usual
    /// 3-character abbreviation), consumes it and returns true.
    pub fn match_keyword(&mut self, keyword: &str) -> bool {
        if self.token().is_some_and(|t| t.matches_keyword(keyword)) {
            self.tokens.pop_front();
            true
        } else {
            false
        }
    }

    /// If the next token is an identifier, consumes and returns it.
    pub fn take_id(&mut self) -> Option<Identifier> {
        if let Some(Token::Id(_)) = self.token() {
            match self.tokens.pop_front() {
                Some(LexToken {
                    token: Token::Id(id),
                    ..
                }) => Some(id),
                _ => None,
            }
        } else {
            None
        }
    }

    /// If the next token is a string, consumes and returns it.
    pub fn take_string(&mut self) -> Option<String> {
        if let Some(Token::String(_)) = self.token() {
            match self.tokens.pop_front() {
                Some(LexToken {
                    token: Token::String(s),
                    ..
                }) => Some(s),
                _ => None,
            }
        } else {
            None
        }
    }

    /// Returns true if the next token ends the command (or input is
    /// exhausted).
    pub fn at_end(&mut self) -> bool {
        matches!(self.token(), None | Some(Token::End))
    }

    /// Consumes tokens through the next command terminator.
    pub fn skip_to_end_of_command(&mut self) {
        while let Some(t) = self.get() {
            if t.token == Token::End {
                break;
            }
        }
    }

    /// Location of the next token, or of the current line if the buffer is
    /// empty.
    pub fn location(&mut self) -> Location {
        self.fill();
        match self.tokens.front() {
            Some(t) => t.location.clone(),
            None => self
                .source
                .current_line()
                .map(|line| Location::new(line.file_name.clone(), line.number))
                .unwrap_or_default(),
        }
    }

    /// Drops any tokens remaining from the current line, so that the next
    /// token comes from a fresh line.
    pub fn discard_rest_of_line(&mut self) {
        self.tokens.clear();
        self.source.discard_current_line();
    }

    /// Access to the underlying line source, for commands that consume raw
    /// lines or install substitutions.
    pub fn source_mut(&mut self) -> &mut LineSource {
        &mut self.source
    }

    /// Once input is exhausted a supplier installed afterward still gets a
    /// chance to serve lines.
    pub fn reset_eof(&mut self) {
        self.eof = false;
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

#[cfg(test)]
mod test {
    use crate::{
        identifier::Identifier,
        lex::{lexer::Lexer, token::Token},
        source::LineSource,
    };

    fn lexer(syntax: &str) -> Lexer {
        Lexer::new(LineSource::for_string(syntax))
    }

    #[test]
    fn tokens_across_lines() {
        let mut lexer = lexer("NUMERIC x\n  y.\n");
        assert!(lexer.match_keyword("NUMERIC"));
        assert_eq!(
            lexer.get().map(|t| t.token),
            Some(Token::Id(Identifier::new("x").unwrap()))
        );
        assert_eq!(
            lexer.get().map(|t| t.token),
            Some(Token::Id(Identifier::new("y").unwrap()))
        );
        assert!(lexer.at_end());
        assert!(lexer.match_token(&Token::End));
        assert_eq!(lexer.get(), None);
    }

    #[test]
    fn pushback() {
        let mut lexer = lexer("a b.");
        let a = lexer.get().unwrap();
        let b = lexer.get().unwrap();
        lexer.push_back(b);
        lexer.push_back(a);
        assert!(lexer.match_keyword("a"));
        assert!(lexer.match_keyword("b"));
        assert!(lexer.at_end());
    }

    #[test]
    fn scan_error_terminates_command() {
        let mut lexer = lexer("NUMERIC ! x.\nECHO 'ok'.");
        assert!(lexer.match_keyword("NUMERIC"));
        assert!(lexer.match_token(&Token::End));
        assert_eq!(lexer.take_diagnostics().len(), 1);
        assert!(lexer.match_keyword("ECHO"));
    }

    #[test]
    fn token_location() {
        let mut lexer = lexer("one\ntwo");
        lexer.get().unwrap();
        assert_eq!(lexer.location().line, Some(2));
    }
}
