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

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::identifier::Identifier;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// Identifier.
    Id(Identifier),

    /// Number.
    Number(f64),

    /// Quoted string.
    String(String),

    /// Command terminator.
    End,

    /// Operators, punctuators, and reserved words.
    Punct(Punct),
}

impl Token {
    pub fn id(&self) -> Option<&Identifier> {
        match self {
            Self::Id(identifier) => Some(identifier),
            _ => None,
        }
    }

    pub fn matches_keyword(&self, keyword: &str) -> bool {
        self.id().is_some_and(|id| id.matches_keyword(keyword))
    }

    pub fn as_number(&self) -> Option<f64> {
        if let Self::Number(number) = self {
            Some(*number)
        } else {
            None
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Number(number)
                if *number >= i64::MIN as f64
                    && *number <= i64::MAX as f64
                    && *number == number.floor() =>
            {
                Some(*number as i64)
            }
            _ => None,
        }
    }
}

fn string_representation(s: &str, quote: char, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "{quote}")?;
    for section in s.split_inclusive(quote) {
        if let Some(rest) = section.strip_suffix(quote) {
            write!(f, "{rest}{quote}{quote}")?;
        } else {
            write!(f, "{section}")?;
        }
    }
    write!(f, "{quote}")
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Token::Id(s) => write!(f, "{s}"),
            Token::Number(number) => {
                if number.is_sign_negative() {
                    write!(f, "-{}", number.abs())
                } else {
                    write!(f, "{number}")
                }
            }
            Token::String(s) => {
                if s.contains('"') {
                    string_representation(s, '\'', f)
                } else {
                    string_representation(s, '"', f)
                }
            }
            Token::End => write!(f, "."),
            Token::Punct(punct) => punct.fmt(f),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Punct {
    /// `+`.
    Plus,

    /// `-`.
    Dash,

    /// `*`.
    Asterisk,

    /// `/`.
    Slash,

    /// `=`.
    Equals,

    /// `(`.
    LParen,

    /// `)`.
    RParen,

    /// `[`.
    LSquare,

    /// `]`.
    RSquare,

    /// `,`.
    Comma,

    /// `;`.
    Semicolon,

    /// `:`.
    Colon,

    /// `AND` or `&`.
    And,

    /// `OR` or `|`.
    Or,

    /// `NOT` or `~`.
    Not,

    /// `EQ`.
    Eq,

    /// `GE` or '>=`
    Ge,

    /// `GT` or `>`.
    Gt,

    /// `LE` or `<=`.
    Le,

    /// `LT` or `<`.
    Lt,

    /// `NE` or `~=` or `<>`.
    Ne,

    /// `ALL`.
    All,

    /// `BY`.
    By,

    /// `TO`.
    To,

    /// `WITH`.
    With,

    /// `**`.
    Exp,
}

impl Punct {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Dash => "-",
            Self::Asterisk => "*",
            Self::Slash => "/",
            Self::Equals => "=",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LSquare => "[",
            Self::RSquare => "]",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Colon => ":",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::Eq => "EQ",
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Lt => "<",
            Self::Ne => "~=",
            Self::All => "ALL",
            Self::By => "BY",
            Self::To => "TO",
            Self::With => "WITH",
            Self::Exp => "**",
        }
    }
}

impl Display for Punct {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod test {
    use crate::lex::token::Token;

    #[test]
    fn string_quoting() {
        assert_eq!(Token::String(String::from("abc")).to_string(), "\"abc\"");
        assert_eq!(
            Token::String(String::from("say \"hi\"")).to_string(),
            "'say \"hi\"'"
        );
        assert_eq!(Token::String(String::from("a\"b")).to_string(), "'a\"b'");
    }

    #[test]
    fn negative_zero() {
        assert_eq!(Token::Number(-0.0).to_string(), "-0");
    }
}
