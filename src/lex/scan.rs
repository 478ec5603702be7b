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

//! Low-level tokenization of a single line of syntax.

use thiserror::Error as ThisError;
use unicase::UniCase;

use crate::{
    identifier::{Identifier, IdentifierChar, ReservedWord},
    lex::token::{Punct, Token},
};

/// Error returned by [StringScanner].
#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
pub enum ScanError {
    /// Unterminated string constant.
    #[error("Unterminated string constant.")]
    ExpectedQuote,

    /// Missing exponent.
    #[error("Missing exponent following `{0}`.")]
    ExpectedExponent(String),

    /// Bad character in input.
    #[error("Bad character {0:?} in input.")]
    UnexpectedChar(char),
}

/// Tokenizes one line of syntax.  Iterates tokens left to right; scanning
/// stops at the first error.
pub struct StringScanner<'a> {
    input: &'a str,
}

impl<'a> StringScanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    fn scan_string(&mut self, quote: char) -> Result<Token, ScanError> {
        let mut s = String::new();
        let mut rest = &self.input[quote.len_utf8()..];
        loop {
            match rest.find(quote) {
                None => {
                    self.input = "";
                    return Err(ScanError::ExpectedQuote);
                }
                Some(index) => {
                    s.push_str(&rest[..index]);
                    rest = &rest[index + quote.len_utf8()..];
                    if rest.starts_with(quote) {
                        // Doubled quote stands for itself.
                        s.push(quote);
                        rest = &rest[quote.len_utf8()..];
                    } else {
                        self.input = rest;
                        return Ok(Token::String(s));
                    }
                }
            }
        }
    }

    fn scan_number(&mut self) -> Result<Token, ScanError> {
        let mut end = self
            .input
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.input.len());
        let rest = &self.input[end..];
        if let Some(frac) = rest.strip_prefix('.') {
            // A period ends the number (and the command) unless a digit
            // follows it.
            let n_frac = frac
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(frac.len());
            if n_frac > 0 {
                end += 1 + n_frac;
            }
        }
        let rest = &self.input[end..];
        if rest.starts_with(['e', 'E']) {
            let exponent = &rest[1..];
            let exponent = exponent
                .strip_prefix(['+', '-'])
                .map(|digits| (digits, 2))
                .unwrap_or((exponent, 1));
            let n_digits = exponent
                .0
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(exponent.0.len());
            if n_digits == 0 {
                let bad = String::from(&self.input[..end + exponent.1]);
                self.input = "";
                return Err(ScanError::ExpectedExponent(bad));
            }
            end += exponent.1 + n_digits;
        }
        let (number, rest) = self.input.split_at(end);
        self.input = rest;
        match number.parse::<f64>() {
            Ok(number) => Ok(Token::Number(number)),
            Err(_) => Err(ScanError::UnexpectedChar(
                number.chars().next().unwrap_or('?'),
            )),
        }
    }

    fn scan_id(&mut self) -> Token {
        let end = self
            .input
            .find(|c: char| !c.may_continue_id())
            .unwrap_or(self.input.len());
        let (id, rest) = self.input.split_at(end);
        self.input = rest;
        match ReservedWord::try_from(id) {
            Ok(reserved) => Token::Punct(match reserved {
                ReservedWord::And => Punct::And,
                ReservedWord::Or => Punct::Or,
                ReservedWord::Not => Punct::Not,
                ReservedWord::Eq => Punct::Eq,
                ReservedWord::Ge => Punct::Ge,
                ReservedWord::Gt => Punct::Gt,
                ReservedWord::Le => Punct::Le,
                ReservedWord::Lt => Punct::Lt,
                ReservedWord::Ne => Punct::Ne,
                ReservedWord::All => Punct::All,
                ReservedWord::By => Punct::By,
                ReservedWord::To => Punct::To,
                ReservedWord::With => Punct::With,
            }),
            Err(()) => Token::Id(Identifier(UniCase::new(String::from(id)))),
        }
    }

    fn scan_punct(&mut self, c: char) -> Result<Token, ScanError> {
        let (punct, len) = match c {
            '+' => (Punct::Plus, 1),
            '-' => (Punct::Dash, 1),
            '*' => {
                if self.input[1..].starts_with('*') {
                    (Punct::Exp, 2)
                } else {
                    (Punct::Asterisk, 1)
                }
            }
            '/' => (Punct::Slash, 1),
            '=' => (Punct::Equals, 1),
            '(' => (Punct::LParen, 1),
            ')' => (Punct::RParen, 1),
            '[' => (Punct::LSquare, 1),
            ']' => (Punct::RSquare, 1),
            ',' => (Punct::Comma, 1),
            ';' => (Punct::Semicolon, 1),
            ':' => (Punct::Colon, 1),
            '&' => (Punct::And, 1),
            '|' => (Punct::Or, 1),
            '>' => {
                if self.input[1..].starts_with('=') {
                    (Punct::Ge, 2)
                } else {
                    (Punct::Gt, 1)
                }
            }
            '<' => {
                if self.input[1..].starts_with('=') {
                    (Punct::Le, 2)
                } else if self.input[1..].starts_with('>') {
                    (Punct::Ne, 2)
                } else {
                    (Punct::Lt, 1)
                }
            }
            '~' => {
                if self.input[1..].starts_with('=') {
                    (Punct::Ne, 2)
                } else {
                    (Punct::Not, 1)
                }
            }
            _ => {
                self.input = "";
                return Err(ScanError::UnexpectedChar(c));
            }
        };
        self.input = &self.input[len..];
        Ok(Token::Punct(punct))
    }
}

impl Iterator for StringScanner<'_> {
    type Item = Result<Token, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.input = self.input.trim_start();
        let c = self.input.chars().next()?;
        Some(match c {
            '\'' | '"' => self.scan_string(c),
            '0'..='9' => self.scan_number(),
            '.' => {
                if self.input[1..].starts_with(|c: char| c.is_ascii_digit()) {
                    self.scan_number()
                } else {
                    self.input = &self.input[1..];
                    Ok(Token::End)
                }
            }
            c if c.may_start_id() => Ok(self.scan_id()),
            c => self.scan_punct(c),
        })
    }
}
