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

//! The syntax front end of a statistical analysis language: a lexer over
//! replaceable line sources, a table-driven command matcher and dispatcher,
//! and the `DO REPEAT` substitution construct.

pub mod command;
pub mod dictionary;
pub mod engine;
pub mod identifier;
pub mod lex;
pub mod message;
pub mod settings;
pub mod source;
