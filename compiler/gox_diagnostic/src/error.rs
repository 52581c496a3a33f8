//! Positioned errors and the ordered error list.

use gox_ir::Position;
use std::fmt;
use thiserror::Error as ThisError;

fn render(pos: &Position, msg: &str) -> String {
    // A position with a filename but no line still identifies the file.
    if pos.is_valid() || !pos.filename.is_empty() {
        format!("{pos}: {msg}")
    } else {
        msg.to_owned()
    }
}

/// One diagnostic: a resolved source position and a message.
#[derive(Clone, Debug, ThisError)]
#[error("{}", render(.pos, .msg))]
pub struct Error {
    pub pos: Position,
    pub msg: String,
}

/// A list of [`Error`]s, usable as an error itself.
#[derive(Clone, Debug, Default)]
pub struct ErrorList {
    errors: Vec<Error>,
}

impl ErrorList {
    pub fn new() -> Self {
        ErrorList::default()
    }

    pub fn add(&mut self, pos: Position, msg: impl Into<String>) {
        self.errors.push(Error {
            pos,
            msg: msg.into(),
        });
    }

    pub fn reset(&mut self) {
        self.errors.clear();
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.errors.iter()
    }

    pub fn first(&self) -> Option<&Error> {
        self.errors.first()
    }

    /// Sort by filename, then line, then column, then message.
    pub fn sort(&mut self) {
        self.errors.sort_by(|a, b| {
            (&a.pos.filename, a.pos.line, a.pos.column, &a.msg).cmp(&(
                &b.pos.filename,
                b.pos.line,
                b.pos.column,
                &b.msg,
            ))
        });
    }

    /// Sort the list and drop all but the first error per source line.
    ///
    /// Parse errors after the first on a line are usually consequences
    /// of the first, so this is what display paths want.
    pub fn remove_multiples(&mut self) {
        self.sort();
        let mut last: Option<(String, u32)> = None;
        self.errors.retain(|e| {
            let key = (e.pos.filename.clone(), e.pos.line);
            if last.as_ref() == Some(&key) {
                false
            } else {
                last = Some(key);
                true
            }
        });
    }

    /// `None` when the list is empty, otherwise the list itself. Mirrors
    /// the convention that an empty error list means success.
    pub fn err(self) -> Option<ErrorList> {
        if self.errors.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    pub fn into_vec(self) -> Vec<Error> {
        self.errors
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => f.write_str("no errors"),
            [only] => write!(f, "{only}"),
            [first, rest @ ..] => write!(f, "{first} (and {} more errors)", rest.len()),
        }
    }
}

impl std::error::Error for ErrorList {}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl IntoIterator for ErrorList {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pos(filename: &str, line: u32, column: u32) -> Position {
        Position {
            filename: filename.to_owned(),
            offset: 0,
            line,
            column,
        }
    }

    #[test]
    fn error_display_includes_position() {
        let e = Error {
            pos: pos("a.gox", 3, 7),
            msg: "expected ';'".to_owned(),
        };
        assert_eq!(e.to_string(), "a.gox:3:7: expected ';'");
    }

    #[test]
    fn error_display_without_position() {
        let e = Error {
            pos: Position::default(),
            msg: "out of thin air".to_owned(),
        };
        assert_eq!(e.to_string(), "out of thin air");
    }

    #[test]
    fn list_display_summarizes() {
        let mut list = ErrorList::new();
        assert_eq!(list.to_string(), "no errors");

        list.add(pos("a.gox", 1, 1), "first");
        assert_eq!(list.to_string(), "a.gox:1:1: first");

        list.add(pos("a.gox", 2, 1), "second");
        list.add(pos("a.gox", 3, 1), "third");
        assert_eq!(list.to_string(), "a.gox:1:1: first (and 2 more errors)");
    }

    #[test]
    fn sort_orders_by_file_then_position() {
        let mut list = ErrorList::new();
        list.add(pos("b.gox", 1, 1), "m");
        list.add(pos("a.gox", 2, 5), "m");
        list.add(pos("a.gox", 2, 3), "m");
        list.sort();

        let positions: Vec<(String, u32, u32)> = list
            .iter()
            .map(|e| (e.pos.filename.clone(), e.pos.line, e.pos.column))
            .collect();
        assert_eq!(
            positions,
            vec![
                ("a.gox".to_owned(), 2, 3),
                ("a.gox".to_owned(), 2, 5),
                ("b.gox".to_owned(), 1, 1),
            ]
        );
    }

    #[test]
    fn remove_multiples_keeps_one_per_line() {
        let mut list = ErrorList::new();
        list.add(pos("a.gox", 2, 9), "late");
        list.add(pos("a.gox", 2, 1), "early");
        list.add(pos("a.gox", 3, 1), "other line");
        list.add(pos("b.gox", 2, 1), "other file");
        list.remove_multiples();

        assert_eq!(list.len(), 3);
        assert_eq!(list.iter().map(|e| e.msg.as_str()).collect::<Vec<_>>(), vec![
            "early",
            "other line",
            "other file"
        ]);
    }

    #[test]
    fn err_is_none_when_empty() {
        assert!(ErrorList::new().err().is_none());

        let mut list = ErrorList::new();
        list.add(pos("a.gox", 1, 1), "boom");
        assert!(list.err().is_some());
    }
}
