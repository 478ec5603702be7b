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

//! Command registry and name resolution.

use std::sync::OnceLock;

use enum_iterator::Sequence;
use itertools::Itertools;
use smallvec::SmallVec;

use crate::{
    command::repeat::{cmd_do_repeat, cmd_end_repeat},
    dictionary::{Dictionary, VarWidth},
    identifier::Identifier,
    lex::{
        lexer::Lexer,
        token::{Punct, Token},
    },
    message::Diagnostic,
    settings::Settings,
};

pub mod matcher;
pub mod repeat;

/// The overall phase of syntax processing, which determines the set of
/// commands that are currently legal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Sequence)]
pub enum ProgramState {
    /// No data source defined yet.
    Initial,

    /// Inside `INPUT PROGRAM`.
    Input,

    /// A data source is defined and transformations may be added.
    Transformations,

    /// A procedure has been executed.
    Procedure,

    /// Sentinel marking an illegal transition in a command's transition
    /// table.  Never persists between commands.
    Error,
}

impl ProgramState {
    /// Index into a command's transition table, or `None` for the sentinel.
    fn index(self) -> Option<usize> {
        match self {
            ProgramState::Initial => Some(0),
            ProgramState::Input => Some(1),
            ProgramState::Transformations => Some(2),
            ProgramState::Procedure => Some(3),
            ProgramState::Error => None,
        }
    }
}

/// What became of one command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CommandResult {
    Success,

    /// The command requested graceful termination.
    Eof,

    /// The command was rejected outright.  No state transition.
    Failure,

    /// The command left processing in a state that later commands cannot be
    /// trusted to recover from.  The caller should stop reading commands from
    /// this source.
    CascadingFailure,

    /// The command executed but trailing tokens were discarded.
    TrailingGarbage,

    /// The command partially executed.
    PartSuccess,

    /// The command may have partially executed.
    PartSuccessMaybe,
}

impl CommandResult {
    /// Returns true for any degree of success, that is, any result that
    /// still causes a state transition.
    pub fn success(self) -> bool {
        !matches!(self, CommandResult::Failure | CommandResult::CascadingFailure)
    }
}

/// Context passed to a command handler.
pub struct Context<'a> {
    pub lexer: &'a mut Lexer,
    pub dictionary: &'a mut Dictionary,
    pub settings: &'a mut Settings,
    pub state: ProgramState,
    pub error: &'a dyn Fn(Diagnostic),
}

impl Context<'_> {
    pub fn error(&self, diagnostic: Diagnostic) {
        (self.error)(diagnostic);
    }
}

type Handler = Box<dyn Fn(&mut Context) -> CommandResult + Send + Sync>;

/// One entry in the command registry.
pub struct Command {
    pub name: &'static str,

    /// Next state for each of [Initial](ProgramState::Initial),
    /// [Input](ProgramState::Input),
    /// [Transformations](ProgramState::Transformations), and
    /// [Procedure](ProgramState::Procedure), in that order.
    /// [Error](ProgramState::Error) marks a state the command may not appear
    /// in.
    pub transitions: [ProgramState; 4],

    /// `None` means the command is recognized but not implemented.
    pub run: Option<Handler>,

    /// Whether name resolution consumes the final word of the name, or
    /// leaves it for the handler to reparse.
    pub skip_entire_name: bool,

    /// Only matchable in testing mode.
    pub debug: bool,
}

impl Command {
    /// Returns this command's transition out of `state`.
    pub fn transition(&self, state: ProgramState) -> ProgramState {
        state
            .index()
            .map(|index| self.transitions[index])
            .unwrap_or(ProgramState::Error)
    }

    /// Returns true if this command can be matched at all in `state`.
    pub fn visible(&self, state: ProgramState, testing_mode: bool) -> bool {
        self.transition(state) != ProgramState::Error && (!self.debug || testing_mode)
    }
}

const ALL_STATES: [ProgramState; 4] = [
    ProgramState::Initial,
    ProgramState::Input,
    ProgramState::Transformations,
    ProgramState::Procedure,
];

fn command(name: &'static str, transitions: [ProgramState; 4], run: Option<Handler>) -> Command {
    Command {
        name,
        transitions,
        run,
        skip_entire_name: true,
        debug: false,
    }
}

fn new_commands() -> Vec<Command> {
    use ProgramState::*;

    vec![
        command(
            "COMMENT",
            ALL_STATES,
            Some(Box::new(|context| {
                context.lexer.skip_to_end_of_command();
                CommandResult::Success
            })),
        ),
        command(
            "DATA LIST",
            [Transformations, Input, Transformations, Transformations],
            Some(Box::new(cmd_data_list)),
        ),
        Command {
            debug: true,
            ..command("DEBUG ECHO", ALL_STATES, Some(Box::new(cmd_echo)))
        },
        command("DESCRIPTIVES", [Error, Error, Procedure, Procedure], None),
        command("DISCRIMINANT", [Error, Error, Procedure, Procedure], None),
        command(
            "DISPLAY",
            [Error, Input, Transformations, Procedure],
            Some(Box::new(cmd_display)),
        ),
        command("DO REPEAT", ALL_STATES, Some(Box::new(cmd_do_repeat))),
        command("ECHO", ALL_STATES, Some(Box::new(cmd_echo))),
        command(
            "END INPUT PROGRAM",
            [Error, Transformations, Error, Error],
            Some(Box::new(end_of_command)),
        ),
        command("END REPEAT", ALL_STATES, Some(Box::new(cmd_end_repeat))),
        command(
            "EXECUTE",
            [Error, Error, Procedure, Procedure],
            Some(Box::new(end_of_command)),
        ),
        command(
            "FINISH",
            ALL_STATES,
            Some(Box::new(|context| match end_of_command(context) {
                CommandResult::Success => CommandResult::Eof,
                other => other,
            })),
        ),
        command("FREQUENCIES", [Error, Error, Procedure, Procedure], None),
        command(
            "INPUT PROGRAM",
            [Input, Error, Error, Error],
            Some(Box::new(end_of_command)),
        ),
        command("LIST", [Error, Error, Procedure, Procedure], None),
        command(
            "NEW FILE",
            [Initial, Error, Initial, Initial],
            Some(Box::new(|context| {
                context.dictionary.clear();
                end_of_command(context)
            })),
        ),
        command(
            "NUMERIC",
            [Error, Input, Transformations, Transformations],
            Some(Box::new(cmd_numeric)),
        ),
        command(
            "STRING",
            [Error, Input, Transformations, Transformations],
            Some(Box::new(cmd_string)),
        ),
        command(
            "SUBTITLE",
            ALL_STATES,
            Some(Box::new(|context| cmd_title(context, false))),
        ),
        command("T-TEST", [Error, Error, Procedure, Procedure], None),
        command(
            "TITLE",
            ALL_STATES,
            Some(Box::new(|context| cmd_title(context, true))),
        ),
    ]
}

/// The command registry.  Entries are ordered alphabetically, which entries
/// that share a 3-letter first-word prefix rely on for adjacency.
pub fn registry() -> &'static [Command] {
    static REGISTRY: OnceLock<Vec<Command>> = OnceLock::new();
    REGISTRY.get_or_init(new_commands).as_slice()
}

/// A command name may comprise at most this many words.
const MAX_WORDS: usize = 16;

/// Resolves the words at the head of `lexer` to a command.  On failure,
/// reports the problem and returns the result the dispatcher should yield.
pub fn parse_command_name<'a>(
    lexer: &mut Lexer,
    commands: &'a [Command],
    state: ProgramState,
    settings: &Settings,
    error: &dyn Fn(Diagnostic),
) -> Result<&'a Command, CommandResult> {
    let mut words = SmallVec::<[String; MAX_WORDS]>::new();
    let mut consumed = Vec::new();
    let mut dash_possible = false;
    let mut fallback: Option<(&Command, usize)> = None;

    while words.len() < MAX_WORDS {
        let word = match lexer.token() {
            Some(Token::Id(id)) => id.as_str().to_ascii_uppercase(),
            Some(Token::Punct(Punct::Dash)) if dash_possible => String::from("-"),
            _ => break,
        };
        if let Some(token) = lexer.get() {
            consumed.push(token);
        }
        words.push(word);

        let (count, dash) = matcher::count_matches(commands, &words, state, settings.testing_mode);
        dash_possible = dash;
        match count {
            0 => break,
            1 => {
                if let Some(command) =
                    matcher::find_complete(commands, &words, state, settings.testing_mode)
                {
                    if !command.skip_entire_name {
                        if let Some(token) = consumed.pop() {
                            lexer.push_back(token);
                        }
                    }
                    check_debug(command, settings, lexer, error)?;
                    return Ok(command);
                }
            }
            _ => {
                if let Some(command) =
                    matcher::find_complete(commands, &words, state, settings.testing_mode)
                {
                    fallback = Some((command, words.len()));
                }
            }
        }
    }

    if let Some((command, n_words)) = fallback {
        let keep = if command.skip_entire_name {
            n_words
        } else {
            n_words - 1
        };
        while consumed.len() > keep {
            if let Some(token) = consumed.pop() {
                lexer.push_back(token);
            }
        }
        check_debug(command, settings, lexer, error)?;
        return Ok(command);
    }

    error(Diagnostic::error(
        lexer.location(),
        format!("Unknown command `{}`.", words.iter().join(" ")),
    ));
    Err(CommandResult::Failure)
}

fn check_debug(
    command: &Command,
    settings: &Settings,
    lexer: &mut Lexer,
    error: &dyn Fn(Diagnostic),
) -> Result<(), CommandResult> {
    if command.debug && !settings.testing_mode {
        error(Diagnostic::error(
            lexer.location(),
            format!("{} may be used only in testing mode.", command.name),
        ));
        Err(CommandResult::Failure)
    } else {
        Ok(())
    }
}

/// Checks that the command in `context` ends here, consuming the terminator.
/// Extra tokens are reported and discarded.
pub fn end_of_command(context: &mut Context) -> CommandResult {
    if context.lexer.at_end() {
        context.lexer.match_token(&Token::End);
        CommandResult::Success
    } else {
        let location = context.lexer.location();
        context.error(Diagnostic::error(
            location,
            "expecting end of command",
        ));
        context.lexer.skip_to_end_of_command();
        CommandResult::TrailingGarbage
    }
}

fn take_variable_name(context: &mut Context) -> Option<Identifier> {
    let name = context.lexer.take_id();
    if name.is_none() {
        let location = context.lexer.location();
        context.error(Diagnostic::error(
            location,
            "expecting variable name",
        ));
    }
    name
}

/// NUMERIC: defines new numeric variables.
fn cmd_numeric(context: &mut Context) -> CommandResult {
    loop {
        let Some(name) = take_variable_name(context) else {
            context.lexer.skip_to_end_of_command();
            return CommandResult::Failure;
        };
        if !context.dictionary.create(name.clone(), VarWidth::Numeric) {
            let location = context.lexer.location();
            context.error(Diagnostic::error(
                location,
                format!("There is already a variable named {name}."),
            ));
            context.lexer.skip_to_end_of_command();
            return CommandResult::Failure;
        }
        context.lexer.match_token(&Token::Punct(Punct::Comma));
        if context.lexer.at_end() {
            return end_of_command(context);
        }
    }
}

/// STRING: defines new string variables, e.g. `STRING name (A8).`.
fn cmd_string(context: &mut Context) -> CommandResult {
    let mut names = Vec::new();
    while !context.lexer.match_token(&Token::Punct(Punct::LParen)) {
        let Some(name) = take_variable_name(context) else {
            context.lexer.skip_to_end_of_command();
            return CommandResult::Failure;
        };
        names.push(name);
        context.lexer.match_token(&Token::Punct(Punct::Comma));
    }

    let width = context
        .lexer
        .get()
        .and_then(|t| t.token.id().cloned())
        .and_then(|id| {
            id.as_str()
                .strip_prefix(['A', 'a'])
                .and_then(|digits| digits.parse::<u16>().ok())
        });
    let Some(width) = width else {
        let location = context.lexer.location();
        context.error(Diagnostic::error(
            location,
            "expecting string format, e.g. A8",
        ));
        context.lexer.skip_to_end_of_command();
        return CommandResult::Failure;
    };
    if !context.lexer.match_token(&Token::Punct(Punct::RParen)) {
        let location = context.lexer.location();
        context.error(Diagnostic::error(location, "expecting `)`"));
        context.lexer.skip_to_end_of_command();
        return CommandResult::Failure;
    }

    for name in names {
        if !context.dictionary.create(name.clone(), VarWidth::String(width)) {
            let location = context.lexer.location();
            context.error(Diagnostic::error(
                location,
                format!("There is already a variable named {name}."),
            ));
            context.lexer.skip_to_end_of_command();
            return CommandResult::Failure;
        }
    }
    end_of_command(context)
}

/// DATA LIST: defines the variables read from the data source.  Only the
/// variable-definition core is supported: an optional FREE keyword, then `/`
/// and variable names.
fn cmd_data_list(context: &mut Context) -> CommandResult {
    context.lexer.match_keyword("FREE");
    context.lexer.match_token(&Token::Punct(Punct::Slash));
    while !context.lexer.at_end() {
        let Some(name) = take_variable_name(context) else {
            context.lexer.skip_to_end_of_command();
            return CommandResult::Failure;
        };
        context.dictionary.create(name, VarWidth::Numeric);
        context.lexer.match_token(&Token::Punct(Punct::Comma));
    }
    end_of_command(context)
}

/// ECHO: writes its argument back out as a note.
fn cmd_echo(context: &mut Context) -> CommandResult {
    let location = context.lexer.location();
    match context.lexer.take_string() {
        Some(s) => {
            context.error(Diagnostic::note(location, s));
            end_of_command(context)
        }
        None => {
            context.error(Diagnostic::error(location, "expecting string"));
            context.lexer.skip_to_end_of_command();
            CommandResult::Failure
        }
    }
}

/// DISPLAY: reports the variables currently defined.
fn cmd_display(context: &mut Context) -> CommandResult {
    let location = context.lexer.location();
    let text = if context.dictionary.is_empty() {
        String::from("No variables defined")
    } else {
        format!(
            "Variables: {}",
            context.dictionary.variables().map(|v| &v.name).join(", ")
        )
    };
    context.error(Diagnostic::note(location, text));
    end_of_command(context)
}

/// TITLE and SUBTITLE: sets the page title or subtitle, given either as a
/// quoted string or as unquoted words.
fn cmd_title(context: &mut Context, title: bool) -> CommandResult {
    let text = match context.lexer.take_string() {
        Some(s) => s,
        None => {
            let mut words = Vec::new();
            while !context.lexer.at_end() {
                match context.lexer.get() {
                    Some(t) => words.push(t.token.to_string()),
                    None => break,
                }
            }
            words.join(" ")
        }
    };
    if title {
        context.settings.title = Some(text);
    } else {
        context.settings.subtitle = Some(text);
    }
    end_of_command(context)
}
