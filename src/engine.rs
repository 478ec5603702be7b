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

//! The command dispatch loop.

use crate::{
    command::{
        Command, CommandResult, Context, ProgramState, parse_command_name, registry,
    },
    dictionary::Dictionary,
    lex::{
        lexer::Lexer,
        token::{Punct, Token},
    },
    message::Diagnostic,
    settings::Settings,
};

/// Hook consulted before executing a command while a structured-input
/// construct is active.  Returns a rejection message, or `None` to permit the
/// command.
pub type StructureGuard = Box<dyn Fn(&Command, ProgramState) -> Option<String>>;

/// Reads commands one at a time, resolves each against the registry, checks
/// its state transition, and executes it.
pub struct Engine {
    state: ProgramState,
    dictionary: Dictionary,
    settings: Settings,
    structure_guard: Option<StructureGuard>,
}

impl Engine {
    pub fn new(settings: Settings) -> Self {
        Self {
            state: ProgramState::Initial,
            dictionary: Dictionary::new(),
            settings,
            structure_guard: None,
        }
    }

    pub fn state(&self) -> ProgramState {
        self.state
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_structure_guard(&mut self, guard: StructureGuard) {
        self.structure_guard = Some(guard);
    }

    /// Parses and executes one command from `lexer`, reporting diagnostics to
    /// `error`.
    pub fn parse_one_command(
        &mut self,
        lexer: &mut Lexer,
        error: &dyn Fn(Diagnostic),
    ) -> CommandResult {
        let result = self.dispatch(lexer, error);
        for diagnostic in lexer.take_diagnostics() {
            error(diagnostic);
        }
        result
    }

    fn dispatch(&mut self, lexer: &mut Lexer, error: &dyn Fn(Diagnostic)) -> CommandResult {
        let next = match lexer.token() {
            None => return CommandResult::Eof,
            Some(token) => token.clone(),
        };

        // A blank command is fine.
        if next == Token::End {
            lexer.get();
            return CommandResult::Success;
        }

        // `*` introduces a comment.
        if next == Token::Punct(Punct::Asterisk) {
            lexer.skip_to_end_of_command();
            return CommandResult::Success;
        }

        if !matches!(next, Token::Id(_)) {
            error(Diagnostic::error(lexer.location(), "expecting command name"));
            lexer.skip_to_end_of_command();
            return CommandResult::Failure;
        }

        let command =
            match parse_command_name(lexer, registry(), self.state, &self.settings, error) {
                Ok(command) => command,
                Err(result) => {
                    lexer.skip_to_end_of_command();
                    return result;
                }
            };

        let Some(run) = &command.run else {
            error(Diagnostic::note(
                lexer.location(),
                format!("{} is not yet implemented.", command.name),
            ));
            lexer.skip_to_end_of_command();
            return CommandResult::Success;
        };

        if let Some(guard) = &self.structure_guard {
            if let Some(message) = guard(command, self.state) {
                error(Diagnostic::error(lexer.location(), message));
                lexer.skip_to_end_of_command();
                return CommandResult::Failure;
            }
        }

        let transition = command.transition(self.state);
        if transition == ProgramState::Error {
            error(Diagnostic::error(
                lexer.location(),
                state_mismatch(command.name, self.state),
            ));
            lexer.skip_to_end_of_command();
            return CommandResult::Failure;
        }

        let result = {
            let mut context = Context {
                lexer,
                dictionary: &mut self.dictionary,
                settings: &mut self.settings,
                state: self.state,
                error,
            };
            run(&mut context)
        };

        if result.success() {
            self.state = transition;
            // A handler could conceivably leave the transition table pointing
            // at the sentinel.  Never let it persist.
            if self.state == ProgramState::Error {
                self.dictionary.clear();
                self.state = ProgramState::Initial;
            }
        }
        result
    }

    /// Parses and executes commands from `lexer` until end of input, a
    /// `FINISH` command, or a failure that processing cannot continue past.
    pub fn run(&mut self, lexer: &mut Lexer, error: &dyn Fn(Diagnostic)) -> CommandResult {
        loop {
            let result = self.parse_one_command(lexer, error);
            if let CommandResult::Eof | CommandResult::CascadingFailure = result {
                return result;
            }
        }
    }
}

/// One canned message per state a command can be rejected in.
fn state_mismatch(name: &str, state: ProgramState) -> String {
    match state {
        ProgramState::Initial => format!(
            "{name} is not allowed (1) before a command to specify the input program, \
             such as DATA LIST, (2) between FILE TYPE and END FILE TYPE, \
             (3) between INPUT PROGRAM and END INPUT PROGRAM."
        ),
        ProgramState::Input => format!("{name} is not allowed within an input program."),
        ProgramState::Transformations => {
            format!("{name} is only allowed within an input program.")
        }
        ProgramState::Procedure => {
            format!("{name} is not allowed after a procedure has been executed.")
        }
        ProgramState::Error => format!("{name} is not allowed here."),
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;

    use enum_iterator::all;

    use crate::{
        command::{CommandResult, ProgramState},
        engine::{Engine, state_mismatch},
        identifier::Identifier,
        lex::lexer::Lexer,
        message::{Diagnostic, Severity},
        settings::Settings,
        source::LineSource,
    };

    fn run_with(syntax: &str, settings: Settings) -> (CommandResult, Vec<Diagnostic>, Engine) {
        let diagnostics = RefCell::new(Vec::new());
        let sink = |d: Diagnostic| diagnostics.borrow_mut().push(d);
        let mut engine = Engine::new(settings);
        let mut lexer = Lexer::new(LineSource::for_string(syntax));
        let result = engine.run(&mut lexer, &sink);
        (result, diagnostics.into_inner(), engine)
    }

    fn run(syntax: &str) -> (CommandResult, Vec<Diagnostic>, Engine) {
        run_with(syntax, Settings::default())
    }

    fn notes(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Note)
            .map(|d| d.text.as_str())
            .collect()
    }

    fn errors(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.text.as_str())
            .collect()
    }

    #[test]
    fn empty_input() {
        let (result, diagnostics, _engine) = run("");
        assert_eq!(result, CommandResult::Eof);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn blank_commands_and_comments() {
        let (result, diagnostics, _engine) = run(".\n* this is a comment.\nCOMMENT so is this.\n");
        assert_eq!(result, CommandResult::Eof);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn unknown_command() {
        let (result, diagnostics, _engine) = run("FROBNICATE x.\nECHO 'still here'.");
        assert_eq!(result, CommandResult::Eof);
        assert_eq!(errors(&diagnostics), vec!["Unknown command `FROBNICATE`."]);
        assert_eq!(notes(&diagnostics), vec!["still here."]);
    }

    #[test]
    fn non_identifier_start() {
        let (_result, diagnostics, _engine) = run("5 + 5.");
        assert_eq!(errors(&diagnostics), vec!["expecting command name."]);
    }

    #[test]
    fn state_transitions() {
        let (_result, _diagnostics, engine) = run("DATA LIST /x y.");
        assert_eq!(engine.state(), ProgramState::Transformations);
        assert_eq!(engine.dictionary().len(), 2);

        let (_result, _diagnostics, engine) = run("INPUT PROGRAM.");
        assert_eq!(engine.state(), ProgramState::Input);

        let (_result, _diagnostics, engine) = run("INPUT PROGRAM.\nEND INPUT PROGRAM.");
        assert_eq!(engine.state(), ProgramState::Transformations);
    }

    #[test]
    fn state_gates_visibility() {
        // EXECUTE is meaningless before a data source exists, so in the
        // initial state it doesn't even resolve.
        let (_result, diagnostics, _engine) = run("EXECUTE.");
        assert_eq!(errors(&diagnostics), vec!["Unknown command `EXECUTE`."]);

        let (_result, diagnostics, engine) = run("DATA LIST /x.\nEXECUTE.");
        assert!(errors(&diagnostics).is_empty());
        assert_eq!(engine.state(), ProgramState::Procedure);
    }

    #[test]
    fn unimplemented_command_is_benign() {
        let (result, diagnostics, engine) = run("DATA LIST /x.\nFREQUENCIES /VARIABLES=x.");
        assert_eq!(result, CommandResult::Eof);
        assert_eq!(notes(&diagnostics), vec!["FREQUENCIES is not yet implemented."]);
        // An unimplemented command is a no-op, so no state transition.
        assert_eq!(engine.state(), ProgramState::Transformations);
    }

    #[test]
    fn state_never_persists_as_error() {
        for syntax in [
            "",
            "FROBNICATE.",
            "DATA LIST /x.\nEXECUTE.\nNEW FILE.",
            "END REPEAT.",
            "INPUT PROGRAM.\nEND INPUT PROGRAM.",
        ] {
            let (_result, _diagnostics, engine) = run(syntax);
            assert_ne!(engine.state(), ProgramState::Error, "syntax {syntax:?}");
        }
    }

    #[test]
    fn canned_state_messages() {
        for state in all::<ProgramState>() {
            let message = state_mismatch("FOO", state);
            assert!(message.starts_with("FOO is "), "state {state:?}");
        }
        assert!(state_mismatch("FOO", ProgramState::Input).contains("within an input program"));

        // Each live state gets its own message.
        let live = [
            ProgramState::Initial,
            ProgramState::Input,
            ProgramState::Transformations,
            ProgramState::Procedure,
        ];
        let messages = live.map(|state| state_mismatch("FOO", state));
        for (index, message) in messages.iter().enumerate() {
            for earlier in &messages[..index] {
                assert_ne!(message, earlier);
            }
        }
        assert!(state_mismatch("FOO", ProgramState::Procedure).contains("procedure"));
    }

    #[test]
    fn do_repeat_replays_three_passes() {
        let (result, diagnostics, engine) = run(
            "DO REPEAT a=1 2 3 /b='x' 'y' 'z'.\n\
             ECHO b.\n\
             TITLE a.\n\
             END REPEAT.",
        );
        assert_eq!(result, CommandResult::Eof);
        assert_eq!(notes(&diagnostics), vec!["x.", "y.", "z."]);
        // TITLE saw the substituted value of each pass; the last one sticks.
        assert_eq!(engine.settings().title.as_deref(), Some("3"));
    }

    #[test]
    fn replayed_lines_have_negated_numbers() {
        let (_result, diagnostics, _engine) = run("DO REPEAT a=1.\nECHO 'hi'.\nEND REPEAT.");
        let note = diagnostics
            .iter()
            .find(|d| d.severity == Severity::Note)
            .unwrap();
        assert_eq!(note.location.line, Some(-2));
        assert_eq!(note.to_string(), "2: note: hi.");
    }

    #[test]
    fn count_mismatch_names_both_dummies() {
        let (result, diagnostics, _engine) =
            run("DO REPEAT a=1 2 3 /c=1 2.\nECHO 'x'.\nEND REPEAT.");
        assert_eq!(result, CommandResult::CascadingFailure);
        assert_eq!(
            errors(&diagnostics),
            vec![
                "Dummy variable `a` had 3 substitutions, \
                 so `c` must also, but 2 were specified."
            ]
        );
    }

    #[test]
    fn duplicate_dummy_rejected() {
        let (result, diagnostics, _engine) =
            run("DO REPEAT a=1 2 /a=3 4.\nECHO 'x'.\nEND REPEAT.");
        assert_eq!(result, CommandResult::CascadingFailure);
        assert_eq!(
            errors(&diagnostics),
            vec!["Dummy variable name `a` is given twice."]
        );
    }

    #[test]
    fn descending_and_single_ranges() {
        let (_result, diagnostics, engine) =
            run("DO REPEAT a=5 TO 1.\nECHO 'p'.\nTITLE a.\nEND REPEAT.");
        assert_eq!(notes(&diagnostics).len(), 5);
        assert_eq!(engine.settings().title.as_deref(), Some("1"));

        let (_result, diagnostics, engine) =
            run("DO REPEAT a=1 TO 1.\nECHO 'q'.\nTITLE a.\nEND REPEAT.");
        assert_eq!(notes(&diagnostics).len(), 1);
        assert_eq!(engine.settings().title.as_deref(), Some("1"));
    }

    #[test]
    fn quoted_spans_not_substituted() {
        let (_result, diagnostics, _engine) =
            run("DO REPEAT A=9.\nECHO 'A'.\nEND REPEAT.");
        assert_eq!(notes(&diagnostics), vec!["A."]);
    }

    #[test]
    fn name_list_dummies_materialize_variables() {
        let (_result, _diagnostics, engine) =
            run("DO REPEAT v=n1 n2.\nECHO 'm'.\nEND REPEAT.");
        assert!(engine.dictionary().contains(&Identifier::new("n1").unwrap()));
        assert!(engine.dictionary().contains(&Identifier::new("n2").unwrap()));
    }

    #[test]
    fn dummy_hiding_variable_warns() {
        let (_result, diagnostics, _engine) =
            run("DATA LIST /x.\nDO REPEAT x=1.\nECHO 'w'.\nEND REPEAT.");
        let warnings = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            warnings,
            vec!["Dummy variable name `x` hides dictionary variable `x`."]
        );
    }

    #[test]
    fn nested_do_repeat() {
        let (result, diagnostics, _engine) = run(
            "DO REPEAT outer='a' 'b'.\n\
             DO REPEAT inner='c'.\n\
             ECHO outer.\n\
             ECHO inner.\n\
             END REPEAT.\n\
             END REPEAT.",
        );
        assert_eq!(result, CommandResult::Eof);
        assert_eq!(notes(&diagnostics), vec!["a.", "c.", "b.", "c."]);
    }

    #[test]
    fn bare_end_repeat_is_hard_error() {
        let (result, diagnostics, _engine) = run("END REPEAT.\nECHO 'not reached'.");
        assert_eq!(result, CommandResult::CascadingFailure);
        assert_eq!(errors(&diagnostics), vec!["No matching DO REPEAT."]);
        assert!(notes(&diagnostics).is_empty());
    }

    #[test]
    fn cascading_failure_leaves_no_construct_behind() {
        let diagnostics = RefCell::new(Vec::new());
        let sink = |d: Diagnostic| diagnostics.borrow_mut().push(d);
        let mut engine = Engine::new(Settings::default());
        let mut lexer = Lexer::new(LineSource::for_string(
            "DO REPEAT a=1 2 /b=3.\nECHO 'after'.",
        ));
        assert_eq!(
            engine.parse_one_command(&mut lexer, &sink),
            CommandResult::CascadingFailure
        );
        // The next command parses normally; nothing tries to resume the
        // aborted construct.
        assert_eq!(
            engine.parse_one_command(&mut lexer, &sink),
            CommandResult::Success
        );
        assert_eq!(
            engine.parse_one_command(&mut lexer, &sink),
            CommandResult::Eof
        );
        let diagnostics = diagnostics.into_inner();
        assert!(diagnostics.iter().any(|d| d.text == "after."));
    }

    #[test]
    fn missing_end_repeat() {
        let (result, diagnostics, _engine) = run("DO REPEAT a=1.\nECHO 'x'.");
        assert_eq!(result, CommandResult::CascadingFailure);
        assert_eq!(
            errors(&diagnostics),
            vec!["Missing END REPEAT following DO REPEAT."]
        );
    }

    #[test]
    fn runaway_body_is_limited() {
        let settings = Settings {
            max_loop_lines: 2,
            ..Settings::default()
        };
        let (result, diagnostics, _engine) = run_with(
            "DO REPEAT a=1.\nECHO 'x'.\nECHO 'y'.\nECHO 'z'.\nEND REPEAT.",
            settings,
        );
        assert_eq!(result, CommandResult::CascadingFailure);
        assert_eq!(
            errors(&diagnostics),
            vec!["DO REPEAT body longer than 2 lines; missing END REPEAT?"]
        );
    }

    #[test]
    fn runaway_range_is_limited() {
        let settings = Settings {
            max_repeat_values: 3,
            ..Settings::default()
        };
        let (result, diagnostics, _engine) = run_with(
            "DO REPEAT a=1 TO 5.\nECHO 'x'.\nEND REPEAT.",
            settings,
        );
        assert_eq!(result, CommandResult::CascadingFailure);
        assert_eq!(
            errors(&diagnostics),
            vec!["Range spans 5 values, which exceeds the limit of 3."]
        );
    }

    #[test]
    fn trailing_garbage_still_transitions() {
        let (result, diagnostics, engine) = run("DATA LIST /x.\nEXECUTE now please.");
        assert_eq!(result, CommandResult::Eof);
        assert_eq!(errors(&diagnostics), vec!["expecting end of command."]);
        assert_eq!(engine.state(), ProgramState::Procedure);
    }

    #[test]
    fn finish_stops_processing() {
        let (result, diagnostics, _engine) = run("FINISH.\nECHO 'not reached'.");
        assert_eq!(result, CommandResult::Eof);
        assert!(notes(&diagnostics).is_empty());
    }

    #[test]
    fn title_and_subtitle() {
        let (_result, _diagnostics, engine) = run("TITLE 'My Title'.\nSUBTITLE sub heading.");
        assert_eq!(engine.settings().title.as_deref(), Some("My Title"));
        assert_eq!(engine.settings().subtitle.as_deref(), Some("sub heading"));
    }

    #[test]
    fn structure_guard_can_reject() {
        let diagnostics = RefCell::new(Vec::new());
        let sink = |d: Diagnostic| diagnostics.borrow_mut().push(d);
        let mut engine = Engine::new(Settings::default());
        engine.set_structure_guard(Box::new(|command, _state| {
            (command.name == "ECHO").then(|| String::from("ECHO is not allowed here"))
        }));
        let mut lexer = Lexer::new(LineSource::for_string("ECHO 'hi'."));
        assert_eq!(
            engine.parse_one_command(&mut lexer, &sink),
            CommandResult::Failure
        );
        assert_eq!(
            diagnostics.into_inner()[0].text,
            "ECHO is not allowed here."
        );
    }
}
