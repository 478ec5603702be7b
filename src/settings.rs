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

/// Syntax processing settings.
///
/// Owned by the [Engine](crate::engine::Engine) so that tests can run
/// independent engines with different settings.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Allows commands flagged for testing use only.
    pub testing_mode: bool,

    /// Limit on buffered `DO REPEAT` body lines, to catch a runaway body with
    /// a missing `END REPEAT`.
    pub max_loop_lines: usize,

    /// Limit on substitution values per `DO REPEAT` dummy variable, to catch
    /// a runaway numeric range.
    pub max_repeat_values: usize,

    /// Page title, set by `TITLE`.
    pub title: Option<String>,

    /// Page subtitle, set by `SUBTITLE`.
    pub subtitle: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            testing_mode: false,
            max_loop_lines: 10_000,
            max_repeat_values: 10_000,
            title: None,
            subtitle: None,
        }
    }
}
