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

//! Diagnostic messages.

use std::{
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    sync::Arc,
};

/// Location relevant to a diagnostic message.
///
/// Line numbers are 1-based.  A negative line number marks a line replayed by
/// a macro-style construct rather than read from the original source; it is
/// the negation of the line number the text was originally read from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    /// File name, if any.
    pub file_name: Option<Arc<String>>,

    /// Line number, if any.
    pub line: Option<i32>,
}

impl Location {
    pub fn new(file_name: Option<Arc<String>>, line: i32) -> Self {
        Self {
            file_name,
            line: Some(line),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.file_name.is_none() && self.line.is_none()
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if let Some(file_name) = &self.file_name {
            write!(f, "{}", file_name)?;
        }
        if let Some(line) = self.line {
            if self.file_name.is_some() {
                write!(f, ":")?;
            }
            write!(f, "{}", line.abs())?;
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

pub struct Diagnostic {
    pub severity: Severity,
    pub location: Location,
    pub text: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, location: Location, text: impl ToString) -> Self {
        let mut text = text.to_string();
        if !text.ends_with(['.', '?', '!']) {
            text.push('.');
        }
        Self {
            severity,
            location,
            text,
        }
    }

    pub fn error(location: Location, text: impl ToString) -> Self {
        Self::new(Severity::Error, location, text)
    }

    pub fn warning(location: Location, text: impl ToString) -> Self {
        Self::new(Severity::Warning, location, text)
    }

    pub fn note(location: Location, text: impl ToString) -> Self {
        Self::new(Severity::Note, location, text)
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if !self.location.is_empty() {
            write!(f, "{}: ", self.location)?;
        }
        write!(f, "{}: {}", self.severity, self.text)
    }
}

impl Debug for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self, f)
    }
}
