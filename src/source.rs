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

//! Line-level input.
//!
//! Syntax reaches the lexer one raw line at a time through a [LineSource].
//! The source normally serves lines from a [SyntaxFile], but a command may
//! install a substitute [LineSupplier] (and usually a [LineFilter] alongside
//! it) that temporarily takes over where lines come from; `DO REPEAT` replays
//! its buffered body this way.  Installations stack: the newest layer serves
//! lines, and when its supplier reports end of input the layer is closed and
//! popped, so a construct replayed *by* another construct resumes the outer
//! one correctly.

use std::{fs, io::Result as IoResult, iter::once, path::Path, sync::Arc};

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

/// One raw line of syntax.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    /// Line text, without its trailing new-line.
    pub text: String,

    /// `None` if the line did not come from a file.
    pub file_name: Option<Arc<String>>,

    /// 1-based line number.  Negative for a line replayed by a substitute
    /// supplier: the absolute value is the line number the text was
    /// originally read from.
    pub number: i32,
}

/// A syntax file and its contents.
///
/// This holds the entire contents of a syntax file, which are always read into
/// memory in their entirety, recoded into UTF-8 if necessary.  It includes the
/// file name (if any) and an index to make finding lines by line number more
/// efficient.
pub struct SyntaxFile {
    /// `None` if this source is not associated with a file.
    file_name: Option<Arc<String>>,

    /// Original encoding.
    #[allow(dead_code)]
    encoding: &'static Encoding,

    /// Source file contents.
    contents: String,

    /// Byte offsets into `contents` of starts of lines.  The first element is
    /// 0.
    lines: Vec<usize>,
}

impl SyntaxFile {
    /// Returns a `SyntaxFile` by reading `path` and recoding it from
    /// `encoding`, or from its detected encoding if `encoding` is `None`.
    pub fn for_file<P>(path: P, encoding: Option<&'static Encoding>) -> IoResult<Self>
    where
        P: AsRef<Path>,
    {
        let bytes = fs::read(path.as_ref())?;
        let encoding = encoding.unwrap_or_else(|| {
            let mut encoding_detector = EncodingDetector::new();
            encoding_detector.feed(&bytes, true);
            encoding_detector.guess(None, true)
        });
        let (contents, _malformed) = encoding.decode_with_bom_removal(&bytes);
        Ok(Self::new(
            contents.to_string(),
            Some(path.as_ref().to_string_lossy().to_string()),
            encoding,
        ))
    }

    /// Creates a new `SyntaxFile` for `contents`, recording that `contents`
    /// was originally encoded in `encoding` and read from `file_name`.
    pub fn new(contents: String, file_name: Option<String>, encoding: &'static Encoding) -> Self {
        let lines = once(0)
            .chain(contents.match_indices('\n').map(|(index, _s)| index + 1))
            .filter(|index| *index < contents.len())
            .collect::<Vec<_>>();
        Self {
            file_name: file_name.map(Arc::new),
            encoding,
            contents,
            lines,
        }
    }

    /// Returns a `SyntaxFile` for `contents`.
    pub fn for_string(contents: impl Into<String>) -> Self {
        Self::new(contents.into(), None, UTF_8)
    }

    pub fn file_name(&self) -> Option<&Arc<String>> {
        self.file_name.as_ref()
    }

    /// Returns the number of lines in the file.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the syntax for 1-based line number `line_number`.
    pub fn get_line(&self, line_number: i32) -> &str {
        if (1..=self.lines.len() as i32).contains(&line_number) {
            let line_number = line_number as usize;
            let start = self.lines[line_number - 1];
            let end = self
                .lines
                .get(line_number)
                .copied()
                .unwrap_or(self.contents.len());
            self.contents[start..end].strip_newline()
        } else {
            ""
        }
    }
}

trait StripNewline {
    fn strip_newline(&self) -> &str;
}

impl StripNewline for str {
    fn strip_newline(&self) -> &str {
        self.strip_suffix("\r\n")
            .unwrap_or(self.strip_suffix('\n').unwrap_or(self))
    }
}

/// Transforms each line a [LineSource] is about to deliver.
pub trait LineFilter {
    fn apply(&mut self, line: &mut Line);

    /// Called when the layer the filter belongs to is uninstalled.
    fn close(&mut self) {}
}

/// A substitute source of lines.
pub trait LineSupplier {
    /// Returns the next line, or `None` when the supplier is exhausted.  An
    /// exhausted supplier is closed and uninstalled by the [LineSource].
    fn get(&mut self) -> Option<Line>;

    /// Called when the supplier is uninstalled.
    fn close(&mut self) {}
}

/// One installed substitution: an optional filter over an optional supplier.
#[derive(Default)]
struct Layer {
    filter: Option<Box<dyn LineFilter>>,
    supplier: Option<Box<dyn LineSupplier>>,
}

impl Layer {
    fn close(mut self) {
        if let Some(supplier) = &mut self.supplier {
            supplier.close();
        }
        if let Some(filter) = &mut self.filter {
            filter.close();
        }
    }
}

/// Supplies raw text lines, with file name and line number metadata.
pub struct LineSource {
    file: Arc<SyntaxFile>,

    /// 1-based number of the next line to read from `file`.
    next_line: i32,

    /// Installed substitutions, innermost last.
    layers: Vec<Layer>,

    /// The line most recently returned by [read_line](Self::read_line).
    current: Option<Line>,
}

impl LineSource {
    pub fn new(file: Arc<SyntaxFile>) -> Self {
        Self {
            file,
            next_line: 1,
            layers: Vec::new(),
            current: None,
        }
    }

    pub fn for_string(contents: impl Into<String>) -> Self {
        Self::new(Arc::new(SyntaxFile::for_string(contents)))
    }

    /// Installs `filter` to rewrite lines before they are delivered.  The
    /// filter attaches to the most recently installed supplier, if any is
    /// still unfiltered; otherwise it applies to the underlying file.
    pub fn install_filter(&mut self, filter: Box<dyn LineFilter>) {
        match self.layers.last_mut() {
            Some(layer) if layer.filter.is_none() => layer.filter = Some(filter),
            _ => self.layers.push(Layer {
                filter: Some(filter),
                supplier: None,
            }),
        }
    }

    /// Installs `supplier` as the place lines come from, until it is
    /// exhausted.
    pub fn install_supplier(&mut self, supplier: Box<dyn LineSupplier>) {
        self.layers.push(Layer {
            filter: None,
            supplier: Some(supplier),
        });
    }

    /// Returns true if any substitute supplier is installed.
    pub fn has_supplier(&self) -> bool {
        self.layers.iter().any(|layer| layer.supplier.is_some())
    }

    /// Returns the next line of input, or `None` at end of input.
    pub fn read_line(&mut self) -> Option<Line> {
        loop {
            let mut line = match self.layers.last_mut() {
                Some(layer) => match &mut layer.supplier {
                    Some(supplier) => match supplier.get() {
                        Some(line) => line,
                        None => {
                            if let Some(layer) = self.layers.pop() {
                                layer.close();
                            }
                            continue;
                        }
                    },
                    None => self.read_file_line()?,
                },
                None => self.read_file_line()?,
            };
            if let Some(layer) = self.layers.last_mut() {
                if let Some(filter) = &mut layer.filter {
                    filter.apply(&mut line);
                }
            }
            self.current = Some(line.clone());
            return Some(line);
        }
    }

    fn read_file_line(&mut self) -> Option<Line> {
        if (self.next_line as usize) > self.file.len() {
            return None;
        }
        let number = self.next_line;
        self.next_line += 1;
        Some(Line {
            text: String::from(self.file.get_line(number)),
            file_name: self.file.file_name().cloned(),
            number,
        })
    }

    /// Returns the line most recently delivered, if any.
    pub fn current_line(&self) -> Option<&Line> {
        self.current.as_ref()
    }

    /// Forgets the most recently delivered line, so error recovery does not
    /// reconsider it.
    pub fn discard_current_line(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod test {
    use super::{Line, LineSource, LineSupplier};

    struct Fixed(Vec<Line>);

    impl LineSupplier for Fixed {
        fn get(&mut self) -> Option<Line> {
            if self.0.is_empty() {
                None
            } else {
                Some(self.0.remove(0))
            }
        }
    }

    fn line(text: &str, number: i32) -> Line {
        Line {
            text: String::from(text),
            file_name: None,
            number,
        }
    }

    #[test]
    fn reads_lines_in_order() {
        let mut source = LineSource::for_string("one\ntwo\r\nthree");
        assert_eq!(source.read_line(), Some(line("one", 1)));
        assert_eq!(source.read_line(), Some(line("two", 2)));
        assert_eq!(source.read_line(), Some(line("three", 3)));
        assert_eq!(source.read_line(), None);
    }

    #[test]
    fn supplier_takes_over_then_pops() {
        let mut source = LineSource::for_string("after");
        source.install_supplier(Box::new(Fixed(vec![line("sub", -1)])));
        assert!(source.has_supplier());
        assert_eq!(source.read_line(), Some(line("sub", -1)));
        assert_eq!(source.read_line(), Some(line("after", 1)));
        assert!(!source.has_supplier());
    }

    #[test]
    fn suppliers_stack() {
        let mut source = LineSource::for_string("");
        source.install_supplier(Box::new(Fixed(vec![line("outer", -1), line("outer2", -2)])));
        source.install_supplier(Box::new(Fixed(vec![line("inner", -9)])));
        assert_eq!(source.read_line(), Some(line("inner", -9)));
        assert_eq!(source.read_line(), Some(line("outer", -1)));
        assert_eq!(source.read_line(), Some(line("outer2", -2)));
        assert_eq!(source.read_line(), None);
    }
}
