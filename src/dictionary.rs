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

//! The working dictionary of variables.

use indexmap::IndexMap;
use unicase::UniCase;

use crate::identifier::Identifier;

/// Width of a variable's values.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum VarWidth {
    /// Numeric.
    #[default]
    Numeric,

    /// String, with the given width in bytes.
    String(u16),
}

/// A variable in the working dictionary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variable {
    pub name: Identifier,
    pub width: VarWidth,
}

/// The set of variables currently defined, in order of definition, indexed by
/// name (case-insensitively).
#[derive(Default)]
pub struct Dictionary {
    variables: IndexMap<UniCase<String>, Variable>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, name: &Identifier) -> Option<&Variable> {
        self.variables.get(&name.0)
    }

    pub fn contains(&self, name: &Identifier) -> bool {
        self.variables.contains_key(&name.0)
    }

    /// Defines a variable named `name` with `width`, if no variable with that
    /// name exists yet.  Returns true if the variable was created.
    pub fn create(&mut self, name: Identifier, width: VarWidth) -> bool {
        match self.variables.entry(name.0.clone()) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(Variable { name, width });
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    /// Discards all variables.
    pub fn clear(&mut self) {
        self.variables.clear();
    }
}

#[cfg(test)]
mod test {
    use crate::{
        dictionary::{Dictionary, VarWidth},
        identifier::Identifier,
    };

    fn id(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    #[test]
    fn create_is_idempotent() {
        let mut dictionary = Dictionary::new();
        assert!(dictionary.create(id("x"), VarWidth::Numeric));
        assert!(!dictionary.create(id("X"), VarWidth::String(8)));
        assert_eq!(dictionary.len(), 1);
        assert_eq!(dictionary.lookup(&id("X")).unwrap().width, VarWidth::Numeric);
    }

    #[test]
    fn definition_order_is_kept() {
        let mut dictionary = Dictionary::new();
        dictionary.create(id("b"), VarWidth::Numeric);
        dictionary.create(id("a"), VarWidth::Numeric);
        let names = dictionary
            .variables()
            .map(|v| v.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["b", "a"]);
    }
}
