//! Source positions and the file-set registry.
//!
//! A [`Pos`] is a dense `u32` unique within a [`FileSet`]. Each [`File`]
//! occupies a half-open range `[base, base + size]` of that space; the
//! extra slot past `size` gives EOF its own position. Converting a `Pos`
//! back to `{filename, line, column}` is a binary search over the file's
//! line table, optionally adjusted by `//line` directive overrides.
//!
//! # Concurrency
//!
//! Multiple files of one package may be scanned in parallel while error
//! reporting converts positions from any thread, so the file list and the
//! per-file line/override tables sit behind `parking_lot` read-write
//! locks. Line scanning appends monotonically, which keeps the write
//! sections tiny.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Dense position within a [`FileSet`].
///
/// `Pos::NONE` (zero) is the invalid position; every real position is
/// `>= 1` because a set's base starts at 1. Comparing two positions
/// reflects source order only when both fall in the same file or in
/// sequentially-added files.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct Pos(pub u32);

impl Pos {
    /// The invalid position.
    pub const NONE: Pos = Pos(0);

    /// Returns `true` unless this is [`Pos::NONE`].
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Pos::NONE
    }
}

impl fmt::Debug for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({})", self.0)
    }
}

/// A decoded source position.
///
/// Valid iff `line > 0`. Column and offset are byte-based, 1- and
/// 0-indexed respectively.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Position {
    pub filename: String,
    /// Byte offset within the file, starting at 0.
    pub offset: u32,
    /// Line number, starting at 1.
    pub line: u32,
    /// Column number in bytes, starting at 1.
    pub column: u32,
}

impl Position {
    /// A position is valid iff its line is positive.
    pub fn is_valid(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for Position {
    /// `file:line:col`, dropping whichever parts are absent; `-` for a
    /// wholly invalid position.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        if !self.filename.is_empty() {
            write!(f, "{}", self.filename)?;
            wrote = true;
        }
        if self.is_valid() {
            if wrote {
                write!(f, ":")?;
            }
            write!(f, "{}:{}", self.line, self.column)?;
            wrote = true;
        }
        if !wrote {
            write!(f, "-")?;
        }
        Ok(())
    }
}

/// A `//line` directive override: positions at or after `offset` report
/// `filename` and a line count rebased on `line`.
#[derive(Clone, Debug)]
pub struct LineInfo {
    pub offset: u32,
    pub filename: String,
    pub line: u32,
}

#[derive(Default)]
struct FileTables {
    /// Byte offsets of line starts; strictly increasing, all < size,
    /// first entry 0 once any line has been added.
    lines: Vec<u32>,
    /// Line directive overrides; strictly increasing by offset.
    infos: Vec<LineInfo>,
}

/// A source file registered in a [`FileSet`].
///
/// The identity triple `{name, base, size}` is immutable; the line and
/// override tables grow as the scanner advances.
pub struct File {
    name: String,
    base: u32,
    size: u32,
    tables: RwLock<FileTables>,
}

impl File {
    fn new(name: String, base: u32, size: u32) -> Self {
        File {
            name,
            base,
            size,
            tables: RwLock::new(FileTables {
                lines: vec![0],
                infos: Vec::new(),
            }),
        }
    }

    /// File name as registered with [`FileSet::add_file`].
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First `Pos` value of this file.
    pub fn base(&self) -> u32 {
        self.base
    }

    /// File size in bytes; `pos(size)` is the EOF position.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of recorded lines.
    pub fn line_count(&self) -> usize {
        self.tables.read().lines.len()
    }

    /// Record a new line starting at `offset`.
    ///
    /// Ignored if `offset` does not strictly increase the table or is
    /// not below the file size; the scanner calls this once per line so
    /// the append-only fast path holds the write lock only briefly.
    pub fn add_line(&self, offset: u32) {
        let mut tables = self.tables.write();
        let ok = match tables.lines.last() {
            Some(&last) => last < offset,
            None => true,
        };
        if ok && offset < self.size {
            tables.lines.push(offset);
        }
    }

    /// Merge line `line` (1-based) into the following line.
    ///
    /// Tooling supplement: removes the line break at the end of `line`
    /// so both lines report as one. The last line cannot be merged.
    pub fn merge_line(&self, line: u32) {
        assert!(line > 0, "invalid line number {line} (should be >= 1)");
        let mut tables = self.tables.write();
        let count = tables.lines.len() as u32;
        assert!(line < count, "invalid line number {line}");
        tables.lines.remove(line as usize);
    }

    /// Replace the whole line table.
    ///
    /// Returns `false` (leaving the table untouched) if the offsets are
    /// not strictly increasing or not all below the file size.
    pub fn set_lines(&self, lines: Vec<u32>) -> bool {
        for (i, &offset) in lines.iter().enumerate() {
            if (i > 0 && offset <= lines[i - 1]) || self.size <= offset {
                return false;
            }
        }
        self.tables.write().lines = lines;
        true
    }

    /// Derive the line table from raw file content.
    pub fn set_lines_for_content(&self, content: &[u8]) {
        let mut lines = Vec::new();
        let mut line_start = Some(0u32);
        for (offset, &b) in content.iter().enumerate() {
            if let Some(start) = line_start.take() {
                lines.push(start);
            }
            if b == b'\n' {
                line_start = Some(offset as u32 + 1);
            }
        }
        self.tables.write().lines = lines;
    }

    /// Install a `//line filename:line` override taking effect at
    /// `offset`. Ignored if `offset` does not strictly increase the
    /// override table or is not below the file size.
    pub fn add_line_info(&self, offset: u32, filename: String, line: u32) {
        let mut tables = self.tables.write();
        let ok = match tables.infos.last() {
            Some(info) => info.offset < offset,
            None => true,
        };
        if ok && offset < self.size {
            tables.infos.push(LineInfo {
                offset,
                filename,
                line,
            });
        }
    }

    /// `Pos` for the byte offset `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is past the file size.
    pub fn pos(&self, offset: u32) -> Pos {
        assert!(offset <= self.size, "illegal file offset {offset}");
        Pos(self.base + offset)
    }

    /// Byte offset for a `Pos` within this file.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is outside `[base, base + size]`.
    pub fn offset(&self, pos: Pos) -> u32 {
        assert!(
            pos.0 >= self.base && pos.0 <= self.base + self.size,
            "illegal Pos value {}",
            pos.0
        );
        pos.0 - self.base
    }

    /// Line number for a position, ignoring line directives.
    pub fn line(&self, pos: Pos) -> u32 {
        self.position(pos).line
    }

    /// Decode a position, honoring line directives.
    pub fn position(&self, pos: Pos) -> Position {
        self.position_for(pos, true)
    }

    /// Decode a position; `adjusted` selects whether `//line` overrides
    /// are honored.
    pub fn position_for(&self, pos: Pos, adjusted: bool) -> Position {
        if !pos.is_valid() {
            return Position::default();
        }
        let offset = self.offset(pos);
        self.unpack(offset, adjusted)
    }

    fn unpack(&self, offset: u32, adjusted: bool) -> Position {
        let tables = self.tables.read();
        let mut filename = self.name.clone();
        let (mut line, mut column) = (0u32, 0u32);

        // partition_point returns the count of line starts <= offset;
        // the line index is that count - 1.
        let i = tables.lines.partition_point(|&start| start <= offset);
        if i > 0 {
            line = i as u32;
            column = offset - tables.lines[i - 1] + 1;
        }

        if adjusted && !tables.infos.is_empty() {
            let j = tables.infos.partition_point(|info| info.offset <= offset);
            if j > 0 {
                let info = &tables.infos[j - 1];
                filename = info.filename.clone();
                // Line of the directive itself, relative to the override.
                let i0 = tables
                    .lines
                    .partition_point(|&start| start <= info.offset);
                if i0 > 0 {
                    line = line - i0 as u32 + info.line;
                }
            }
        }

        Position {
            filename,
            offset,
            line,
            column,
        }
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("name", &self.name)
            .field("base", &self.base)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

struct SetState {
    /// Base for the next file; starts at 1 so `Pos::NONE` stays invalid.
    base: u32,
    /// Files in the order they were added; bases are non-decreasing.
    files: Vec<Arc<File>>,
    /// One-element cache for the common repeated-file lookup.
    last: Option<Arc<File>>,
}

/// Registry of source files sharing one `Pos` numbering space.
///
/// Methods take `&self`; all mutation happens behind an internal lock so
/// a set can be shared across the threads parsing a package.
pub struct FileSet {
    state: RwLock<SetState>,
}

impl FileSet {
    pub fn new() -> Self {
        FileSet {
            state: RwLock::new(SetState {
                base: 1,
                files: Vec::new(),
                last: None,
            }),
        }
    }

    /// Base that [`add_file`](Self::add_file) would use for the next file.
    pub fn base(&self) -> u32 {
        self.state.read().base
    }

    /// Register a file of `size` bytes.
    ///
    /// `base` is the file's first position, or `None` for "the set's
    /// current base". The next file's base becomes `base + size + 1`,
    /// reserving one position for EOF.
    ///
    /// # Panics
    ///
    /// Panics if `base` is below the set's current base.
    pub fn add_file(&self, name: impl Into<String>, base: Option<u32>, size: u32) -> Arc<File> {
        let mut state = self.state.write();
        let base = base.unwrap_or(state.base);
        assert!(
            base >= state.base,
            "illegal base {base} (minimum {})",
            state.base
        );
        let file = Arc::new(File::new(name.into(), base, size));
        // base + size + 1: the extra slot is the file's EOF position.
        state.base = base
            .checked_add(size)
            .and_then(|b| b.checked_add(1))
            .unwrap_or_else(|| panic!("offset overflow (> 4G of source code in file set)"));
        state.files.push(Arc::clone(&file));
        state.last = Some(Arc::clone(&file));
        file
    }

    /// The file containing `pos`, if any.
    pub fn file(&self, pos: Pos) -> Option<Arc<File>> {
        if !pos.is_valid() {
            return None;
        }
        let state = self.state.read();
        // Cache hit for the common case of repeated lookups in one file.
        if let Some(last) = &state.last {
            if last.base <= pos.0 && pos.0 <= last.base + last.size {
                return Some(Arc::clone(last));
            }
        }
        let i = state.files.partition_point(|f| f.base <= pos.0);
        if i > 0 {
            let file = &state.files[i - 1];
            if pos.0 <= file.base + file.size {
                let found = Arc::clone(file);
                drop(state);
                self.state.write().last = Some(Arc::clone(&found));
                return Some(found);
            }
        }
        None
    }

    /// Decode `pos`, honoring line directives.
    pub fn position(&self, pos: Pos) -> Position {
        self.position_for(pos, true)
    }

    /// Decode `pos`; `adjusted` selects whether `//line` overrides are
    /// honored. Invalid or out-of-set positions decode to an invalid
    /// `Position`.
    pub fn position_for(&self, pos: Pos, adjusted: bool) -> Position {
        match self.file(pos) {
            Some(file) => file.position_for(pos, adjusted),
            None => Position::default(),
        }
    }

    /// Snapshot of the registered files in add order.
    pub fn iter(&self) -> impl Iterator<Item = Arc<File>> {
        self.state.read().files.clone().into_iter()
    }
}

impl Default for FileSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn no_pos_is_invalid() {
        assert!(!Pos::NONE.is_valid());
        assert!(Pos(1).is_valid());
    }

    #[test]
    fn position_display_forms() {
        let full = Position {
            filename: "a.go".into(),
            offset: 0,
            line: 3,
            column: 7,
        };
        assert_eq!(full.to_string(), "a.go:3:7");

        let no_file = Position {
            filename: String::new(),
            offset: 0,
            line: 3,
            column: 7,
        };
        assert_eq!(no_file.to_string(), "3:7");

        let file_only = Position {
            filename: "a.go".into(),
            ..Position::default()
        };
        assert_eq!(file_only.to_string(), "a.go");

        assert_eq!(Position::default().to_string(), "-");
    }

    #[test]
    fn add_file_reserves_eof_slot() {
        let fset = FileSet::new();
        assert_eq!(fset.base(), 1);
        let a = fset.add_file("a.go", None, 10);
        assert_eq!(a.base(), 1);
        assert_eq!(fset.base(), 12); // 1 + 10 + 1
        let b = fset.add_file("b.go", None, 5);
        assert_eq!(b.base(), 12);
    }

    #[test]
    fn pos_offset_round_trip() {
        let fset = FileSet::new();
        let file = fset.add_file("a.go", None, 100);
        for offset in [0u32, 1, 42, 99, 100] {
            assert_eq!(file.offset(file.pos(offset)), offset);
        }
    }

    #[test]
    #[should_panic(expected = "illegal file offset")]
    fn pos_past_size_panics() {
        let fset = FileSet::new();
        let file = fset.add_file("a.go", None, 10);
        let _ = file.pos(11);
    }

    #[test]
    fn line_table_rejects_non_increasing() {
        let fset = FileSet::new();
        let file = fset.add_file("a.go", None, 100);
        file.add_line(5);
        file.add_line(5); // ignored
        file.add_line(3); // ignored
        file.add_line(7);
        file.add_line(100); // ignored: not < size
        assert_eq!(file.line_count(), 3); // offsets 0, 5, 7
    }

    #[test]
    fn line_and_column_lookup() {
        let src = b"hello\nworld\n";
        let fset = FileSet::new();
        let file = fset.add_file("a.go", None, src.len() as u32);
        file.add_line(6); // "world" starts at offset 6

        let p = file.position(file.pos(0));
        assert_eq!((p.line, p.column), (1, 1));
        let p = file.position(file.pos(4));
        assert_eq!((p.line, p.column), (1, 5));
        let p = file.position(file.pos(6));
        assert_eq!((p.line, p.column), (2, 1));
        let p = file.position(file.pos(8));
        assert_eq!((p.line, p.column), (2, 3));
    }

    #[test]
    fn set_lines_validates() {
        let fset = FileSet::new();
        let file = fset.add_file("a.go", None, 10);
        assert!(file.set_lines(vec![0, 3, 7]));
        assert_eq!(file.line_count(), 3);
        assert!(!file.set_lines(vec![0, 3, 3]));
        assert!(!file.set_lines(vec![0, 10]));
        assert_eq!(file.line_count(), 3); // unchanged after rejections
    }

    #[test]
    fn set_lines_for_content_counts_lines() {
        let fset = FileSet::new();
        let src = b"a\nbb\n\nccc";
        let file = fset.add_file("a.go", None, src.len() as u32);
        file.set_lines_for_content(src);
        assert_eq!(file.line_count(), 4);
    }

    #[test]
    fn merge_line_joins_lines() {
        let fset = FileSet::new();
        let src = b"a\nb\nc\n";
        let file = fset.add_file("a.go", None, src.len() as u32);
        file.add_line(2);
        file.add_line(4);
        file.merge_line(1);
        // Offsets 0..4 now all report line 1.
        assert_eq!(file.position(file.pos(2)).line, 1);
        assert_eq!(file.position(file.pos(4)).line, 2);
    }

    #[test]
    fn line_directive_overrides() {
        // Two lines; a directive at the start of line 2 relabels it.
        let src = b"x := 1\ny := 2\n";
        let fset = FileSet::new();
        let file = fset.add_file("a.go", None, src.len() as u32);
        file.add_line(7);
        file.add_line_info(7, "other.go".into(), 100);

        let adjusted = file.position_for(file.pos(7), true);
        assert_eq!(adjusted.filename, "other.go");
        assert_eq!(adjusted.line, 100);

        let raw = file.position_for(file.pos(7), false);
        assert_eq!(raw.filename, "a.go");
        assert_eq!(raw.line, 2);

        // Positions before the directive are unaffected.
        assert_eq!(file.position(file.pos(0)).filename, "a.go");
    }

    #[test]
    fn fileset_position_spans_files() {
        let fset = FileSet::new();
        let a = fset.add_file("a.go", None, 4);
        let b = fset.add_file("b.go", None, 4);
        assert_eq!(fset.position(a.pos(2)).filename, "a.go");
        assert_eq!(fset.position(b.pos(2)).filename, "b.go");
        assert!(!fset.position(Pos::NONE).is_valid());
    }

    #[test]
    fn fileset_iter_in_add_order() {
        let fset = FileSet::new();
        fset.add_file("a.go", None, 1);
        fset.add_file("b.go", None, 1);
        let names: Vec<String> = fset.iter().map(|f| f.name().to_owned()).collect();
        assert_eq!(names, ["a.go", "b.go"]);
    }

    #[test]
    fn concurrent_line_recording() {
        let fset = FileSet::new();
        let a = fset.add_file("a.go", None, 1000);
        let b = fset.add_file("b.go", None, 1000);
        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 1..100 {
                    a.add_line(i * 10);
                }
            });
            s.spawn(|| {
                for i in 1..100 {
                    b.add_line(i * 10);
                }
            });
            s.spawn(|| {
                // Reads race harmlessly against the writers above.
                for _ in 0..100 {
                    let _ = fset.position(a.pos(500));
                }
            });
        });
        assert_eq!(a.line_count(), 100);
        assert_eq!(b.line_count(), 100);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn offset_pos_round_trip(size in 1u32..10_000, offsets in proptest::collection::vec(0u32..10_000, 0..64)) {
                let fset = FileSet::new();
                let file = fset.add_file("p.go", None, size);
                for o in offsets {
                    let o = o % (size + 1);
                    prop_assert_eq!(file.offset(file.pos(o)), o);
                }
            }

            #[test]
            fn line_table_stays_monotone(size in 2u32..10_000, offsets in proptest::collection::vec(0u32..10_000, 0..128)) {
                let fset = FileSet::new();
                let file = fset.add_file("p.go", None, size);
                for o in offsets {
                    file.add_line(o);
                }
                // Probe: every consecutive pair of reported positions is ordered.
                let mut prev_line = 0;
                for o in 0..size {
                    let line = file.position(file.pos(o)).line;
                    prop_assert!(line >= prev_line);
                    prev_line = line;
                }
            }
        }
    }
}
