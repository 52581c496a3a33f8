//! Comments and comment groups.
//!
//! The scanner produces individual comments; the parser collects runs of
//! comments with no blank line between them into groups and associates
//! groups with the declarations they document.

use crate::pos::Pos;

/// A single `//` or `/* */` comment.
///
/// The text includes the comment markers; carriage returns inside the
/// source are preserved here (position arithmetic depends on the raw
/// length), stripping happens in [`CommentGroup::text`].
#[derive(Clone, Debug)]
pub struct Comment {
    /// Position of the leading `/`.
    pub slash: Pos,
    pub text: String,
}

impl Comment {
    pub fn pos(&self) -> Pos {
        self.slash
    }

    /// Position immediately past the comment text.
    pub fn end(&self) -> Pos {
        Pos(self.slash.0 + self.text.len() as u32)
    }
}

/// A run of comments with no other tokens and no empty lines between them.
#[derive(Clone, Debug, Default)]
pub struct CommentGroup {
    pub list: Vec<Comment>,
}

impl CommentGroup {
    pub fn pos(&self) -> Pos {
        self.list.first().map_or(Pos::NONE, Comment::pos)
    }

    pub fn end(&self) -> Pos {
        self.list.last().map_or(Pos::NONE, Comment::end)
    }

    /// The group's content with comment markers, leading whitespace, and
    /// `//line` directives removed. Each surviving comment line ends in a
    /// newline; empty runs collapse so the result never contains a blank
    /// leading or trailing line.
    pub fn text(&self) -> String {
        let mut lines: Vec<&str> = Vec::with_capacity(self.list.len());
        for comment in &self.list {
            let mut c = comment.text.as_str();
            if c.starts_with("//line ") {
                continue;
            }
            match c.as_bytes().get(1) {
                Some(b'/') => {
                    c = &c[2..];
                    // A space after // is part of the marker.
                    c = c.strip_prefix(' ').unwrap_or(c);
                    lines.push(c);
                }
                Some(b'*') => {
                    c = &c[2..c.len() - 2];
                    for line in c.split('\n') {
                        lines.push(line.strip_suffix('\r').unwrap_or(line));
                    }
                }
                _ => {}
            }
        }

        // Drop leading and trailing blank lines, collapse interior runs.
        let mut out = String::new();
        let mut pending_blank = false;
        for line in lines {
            let line = line.trim_end();
            if line.is_empty() {
                pending_blank = !out.is_empty();
                continue;
            }
            if pending_blank {
                out.push('\n');
                pending_blank = false;
            }
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(texts: &[&str]) -> CommentGroup {
        let mut pos = 1u32;
        let mut list = Vec::new();
        for t in texts {
            list.push(Comment {
                slash: Pos(pos),
                text: (*t).to_owned(),
            });
            pos += t.len() as u32 + 1;
        }
        CommentGroup { list }
    }

    #[test]
    fn line_comment_text() {
        let g = group(&["// hello", "// world"]);
        assert_eq!(g.text(), "hello\nworld\n");
    }

    #[test]
    fn block_comment_text() {
        let g = group(&["/* one\n   two */"]);
        assert_eq!(g.text(), "one\n   two\n");
    }

    #[test]
    fn line_directives_dropped() {
        let g = group(&["//line file.gox:10", "// real doc"]);
        assert_eq!(g.text(), "real doc\n");
    }

    #[test]
    fn blank_lines_collapse() {
        let g = group(&["//", "// a", "//", "//", "// b", "//"]);
        assert_eq!(g.text(), "a\n\nb\n");
    }

    #[test]
    fn end_spans_text() {
        let c = Comment {
            slash: Pos(10),
            text: "// ok".to_owned(),
        };
        assert_eq!(c.end(), Pos(15));
        assert_eq!(CommentGroup::default().pos(), Pos::NONE);
    }
}
