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

use std::{cell::Cell, path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::Result;
use clap::Parser;
use encoding_rs::Encoding;
use thiserror::Error as ThisError;

use tally::{
    command::CommandResult,
    engine::Engine,
    lex::lexer::Lexer,
    message::{Diagnostic, Severity},
    settings::Settings,
    source::{LineSource, SyntaxFile},
};

/// Tally, a program for statistical analysis of sampled data.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Syntax files to run, in order.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// The encoding of the syntax files (by default, it is detected).
    #[arg(long, value_parser = parse_encoding)]
    encoding: Option<&'static Encoding>,

    /// Allow commands reserved for testing.
    #[arg(long)]
    testing_mode: bool,
}

#[derive(ThisError, Debug)]
#[error("{0}: unknown encoding")]
struct UnknownEncodingError(String);

fn parse_encoding(arg: &str) -> Result<&'static Encoding, UnknownEncodingError> {
    match Encoding::for_label_no_replacement(arg.as_bytes()) {
        Some(encoding) => Ok(encoding),
        None => Err(UnknownEncodingError(arg.to_string())),
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let any_errors = Cell::new(false);
    let report = |diagnostic: Diagnostic| {
        if diagnostic.severity == Severity::Error {
            any_errors.set(true);
        }
        eprintln!("{diagnostic}");
    };

    for file in &cli.files {
        let settings = Settings {
            testing_mode: cli.testing_mode,
            ..Settings::default()
        };
        let mut engine = Engine::new(settings);
        let syntax = SyntaxFile::for_file(file, cli.encoding)?;
        let mut lexer = Lexer::new(LineSource::new(Arc::new(syntax)));
        if engine.run(&mut lexer, &report) == CommandResult::CascadingFailure {
            any_errors.set(true);
        }
    }

    Ok(if any_errors.get() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
