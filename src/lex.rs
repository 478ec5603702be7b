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

//! Syntax lexical analysis.
//!
//! Lexical analysis is made up of three layers:
//!
//! - [scan](scan) tokenizes one line of syntax at a time.
//!
//! - [token](token) defines the tokens themselves.
//!
//! - [lexer](lexer) drives scanning over a [LineSource](crate::source::LineSource)
//!   and buffers tokens for lookahead and pushback.

pub mod lexer;
pub mod scan;
pub mod token;
