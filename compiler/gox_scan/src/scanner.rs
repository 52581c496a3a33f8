//! The scanner proper.

use bitflags::bitflags;
use gox_diagnostic::ErrorList;
use gox_ir::{File, Pos, Position, Token};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

/// Callback invoked once per lexical error, with the resolved position
/// and a message.
pub type ErrorHandler<'a> = Box<dyn FnMut(Position, String) + 'a>;

/// Handler that appends every error to a shared [`ErrorList`].
pub fn error_list_handler(list: Rc<RefCell<ErrorList>>) -> ErrorHandler<'static> {
    Box::new(move |pos, msg| list.borrow_mut().add(pos, msg))
}

bitflags! {
    /// Scanner behavior switches.
    #[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
    pub struct Mode: u32 {
        /// Emit comments as [`Token::Comment`] instead of skipping them.
        const SCAN_COMMENTS = 1 << 0;
        /// Disable automatic semicolon insertion (token-stream tools).
        const DONT_INSERT_SEMIS = 1 << 1;
    }
}

const BOM: char = '\u{feff}';

fn is_letter(ch: char) -> bool {
    ch == '_' || ch.is_alphabetic()
}

fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit() || (!ch.is_ascii() && ch.is_numeric())
}

fn digit_val(ch: char) -> u32 {
    match ch {
        '0'..='9' => ch as u32 - '0' as u32,
        'a'..='f' => ch as u32 - 'a' as u32 + 10,
        'A'..='F' => ch as u32 - 'A' as u32 + 10,
        _ => 16,
    }
}

/// Decode the first character of `bytes`. Returns the character, its
/// encoded width, and whether the encoding was valid; invalid encodings
/// decode as U+FFFD with width 1.
fn decode_rune(bytes: &[u8]) -> (char, usize, bool) {
    let limit = bytes.len().min(4);
    let prefix = match std::str::from_utf8(&bytes[..limit]) {
        Ok(s) => s,
        Err(e) => match std::str::from_utf8(&bytes[..e.valid_up_to()]) {
            Ok(s) => s,
            Err(_) => "",
        },
    };
    match prefix.chars().next() {
        Some(ch) => (ch, ch.len_utf8(), true),
        None => ('\u{fffd}', 1, false),
    }
}

/// A scanner over one source file.
///
/// Produced tokens carry their literal text where the token class has
/// one; position information accumulates in the shared [`File`] as the
/// scanner discovers line breaks.
pub struct Scanner<'a> {
    file: Arc<File>,
    /// Directory of the file, for relative `//line` filenames.
    dir: String,
    src: &'a [u8],
    err: Option<ErrorHandler<'a>>,
    mode: Mode,

    /// Current character; `None` at end of input.
    ch: Option<char>,
    /// Offset of `ch`.
    offset: usize,
    /// Offset of the character after `ch`.
    rd_offset: usize,
    /// Offset of the first character of the current line.
    line_offset: usize,
    /// Whether a newline in the immediate future should become a
    /// semicolon.
    insert_semi: bool,

    /// Number of errors reported so far.
    pub error_count: usize,
}

impl<'a> Scanner<'a> {
    /// Prepare a scanner over `src`, which must be the content of
    /// `file`.
    ///
    /// # Panics
    ///
    /// Panics if `file`'s registered size does not equal `src.len()`.
    pub fn new(
        file: Arc<File>,
        src: &'a [u8],
        err: Option<ErrorHandler<'a>>,
        mode: Mode,
    ) -> Scanner<'a> {
        assert_eq!(
            file.size() as usize,
            src.len(),
            "file size does not match source length"
        );
        let dir = Path::new(file.name())
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut scanner = Scanner {
            file,
            dir,
            src,
            err,
            mode,
            ch: Some(' '),
            offset: 0,
            rd_offset: 0,
            line_offset: 0,
            insert_semi: false,
            error_count: 0,
        };
        scanner.next();
        if scanner.ch == Some(BOM) {
            // A leading byte order mark is allowed and skipped.
            scanner.next();
        }
        scanner
    }

    fn error(&mut self, offs: usize, msg: impl Into<String>) {
        self.error_count += 1;
        if let Some(handler) = self.err.as_mut() {
            let position = self.file.position(self.file.pos(offs as u32));
            handler(position, msg.into());
        }
    }

    /// Advance to the next character, registering line breaks and
    /// reporting NUL bytes, invalid UTF-8, and stray byte order marks.
    fn next(&mut self) {
        if self.rd_offset < self.src.len() {
            self.offset = self.rd_offset;
            if self.ch == Some('\n') {
                self.line_offset = self.offset;
                self.file.add_line(self.offset as u32);
            }
            let (ch, width, valid) = decode_rune(&self.src[self.rd_offset..]);
            if self.src[self.rd_offset] == 0 {
                self.error(self.offset, "illegal character NUL");
            } else if !valid {
                self.error(self.offset, "illegal UTF-8 encoding");
            } else if ch == BOM && self.offset > 0 {
                self.error(self.offset, "illegal byte order mark");
            }
            self.rd_offset += width;
            self.ch = Some(ch);
        } else {
            self.offset = self.src.len();
            if self.ch == Some('\n') {
                self.line_offset = self.offset;
                self.file.add_line(self.offset as u32);
            }
            self.ch = None;
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.ch, Some(' ' | '\t' | '\r'))
            || (self.ch == Some('\n') && !self.insert_semi)
        {
            self.next();
        }
    }

    fn lit_from(&self, offs: usize) -> String {
        String::from_utf8_lossy(&self.src[offs..self.offset]).into_owned()
    }

    fn scan_identifier(&mut self) -> String {
        let offs = self.offset;
        while self.ch.is_some_and(|ch| is_letter(ch) || is_digit(ch)) {
            self.next();
        }
        self.lit_from(offs)
    }

    fn scan_mantissa(&mut self, base: u32) {
        while self.ch.is_some_and(|ch| digit_val(ch) < base) {
            self.next();
        }
    }

    /// Scan a number. `seen_decimal_point` is set when the caller already
    /// consumed a leading `.` (so this is a fraction like `.5`).
    fn scan_number(&mut self, seen_decimal_point: bool) -> (Token, String) {
        let mut offs = self.offset;
        let mut tok = Token::Int;
        // Hexadecimal and plain octal integers take neither a fraction
        // nor an exponent nor the imaginary suffix.
        let mut check_fraction = false;
        let mut check_exponent = false;

        if seen_decimal_point {
            offs -= 1;
            tok = Token::Float;
            self.scan_mantissa(10);
            check_exponent = true;
        } else if self.ch == Some('0') {
            let zero_offs = self.offset;
            self.next();
            if matches!(self.ch, Some('x' | 'X')) {
                self.next();
                self.scan_mantissa(16);
                if self.offset - zero_offs <= 2 {
                    // Only "0x" or "0X" was consumed.
                    self.error(zero_offs, "illegal hexadecimal number");
                }
            } else {
                let mut seen_decimal_digit = false;
                self.scan_mantissa(8);
                if matches!(self.ch, Some('8' | '9')) {
                    // Not octal after all; accept the digits and decide
                    // below whether a float rescues the literal.
                    seen_decimal_digit = true;
                    self.scan_mantissa(10);
                }
                if matches!(self.ch, Some('.' | 'e' | 'E' | 'i')) {
                    check_fraction = true;
                    check_exponent = true;
                } else if seen_decimal_digit {
                    self.error(zero_offs, "illegal octal number");
                }
            }
        } else {
            self.scan_mantissa(10);
            check_fraction = true;
            check_exponent = true;
        }

        if check_fraction && self.ch == Some('.') {
            tok = Token::Float;
            self.next();
            self.scan_mantissa(10);
        }
        if check_exponent {
            if matches!(self.ch, Some('e' | 'E')) {
                tok = Token::Float;
                self.next();
                if matches!(self.ch, Some('-' | '+')) {
                    self.next();
                }
                if self.ch.is_some_and(|ch| digit_val(ch) < 10) {
                    self.scan_mantissa(10);
                } else {
                    self.error(offs, "illegal floating-point exponent");
                }
            }
            if self.ch == Some('i') {
                tok = Token::Imag;
                self.next();
            }
        }

        (tok, self.lit_from(offs))
    }

    /// Validate one escape sequence after a `\`. Returns `false` (after
    /// reporting) for malformed or out-of-range escapes.
    fn scan_escape(&mut self, quote: char) -> bool {
        let offs = self.offset;

        let (mut n, base, max): (u32, u32, u32) = match self.ch {
            Some('a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | '\\') => {
                self.next();
                return true;
            }
            Some(ch) if ch == quote => {
                self.next();
                return true;
            }
            Some('0'..='7') => (3, 8, 255),
            Some('x') => {
                self.next();
                (2, 16, 255)
            }
            Some('u') => {
                self.next();
                (4, 16, char::MAX as u32)
            }
            Some('U') => {
                self.next();
                (8, 16, char::MAX as u32)
            }
            Some(_) => {
                self.error(offs, "unknown escape sequence");
                return false;
            }
            None => {
                self.error(offs, "escape sequence not terminated");
                return false;
            }
        };

        let mut x: u32 = 0;
        while n > 0 {
            let digit = self.ch.map_or(16, digit_val);
            if digit >= base {
                let msg = match self.ch {
                    Some(ch) => format!("illegal character {ch:?} in escape sequence"),
                    None => "escape sequence not terminated".to_owned(),
                };
                self.error(self.offset, msg);
                return false;
            }
            x = x.wrapping_mul(base).wrapping_add(digit);
            self.next();
            n -= 1;
        }

        if x > max || (0xD800..0xE000).contains(&x) {
            self.error(offs, "escape sequence is invalid Unicode code point");
            return false;
        }
        true
    }

    fn scan_rune(&mut self) -> String {
        // Opening ' consumed.
        let offs = self.offset - 1;
        let mut valid = true;
        let mut n = 0;
        loop {
            let ch = self.ch;
            if ch == Some('\n') || ch.is_none() {
                if valid {
                    self.error(offs, "rune literal not terminated");
                    valid = false;
                }
                break;
            }
            self.next();
            if ch == Some('\'') {
                break;
            }
            n += 1;
            if ch == Some('\\') && !self.scan_escape('\'') {
                valid = false;
            }
        }
        if valid && n != 1 {
            self.error(offs, "illegal rune literal");
        }
        self.lit_from(offs)
    }

    fn scan_string(&mut self) -> String {
        // Opening " consumed.
        let offs = self.offset - 1;
        loop {
            let ch = self.ch;
            if ch == Some('\n') || ch.is_none() {
                self.error(offs, "string literal not terminated");
                break;
            }
            self.next();
            if ch == Some('"') {
                break;
            }
            if ch == Some('\\') {
                self.scan_escape('"');
            }
        }
        self.lit_from(offs)
    }

    fn scan_raw_string(&mut self) -> String {
        // Opening ` consumed.
        let offs = self.offset - 1;
        let mut has_cr = false;
        loop {
            let ch = self.ch;
            let Some(ch) = ch else {
                self.error(offs, "raw string literal not terminated");
                break;
            };
            self.next();
            if ch == '`' {
                break;
            }
            if ch == '\r' {
                has_cr = true;
            }
        }
        let mut lit = self.src[offs..self.offset].to_vec();
        if has_cr {
            // Carriage returns inside raw strings are discarded from the
            // literal value.
            lit.retain(|&b| b != b'\r');
        }
        String::from_utf8_lossy(&lit).into_owned()
    }

    fn scan_comment(&mut self) -> String {
        // Initial '/' consumed; ch is '/' or '*'.
        let offs = self.offset - 1;
        let mut has_cr = false;

        if self.ch == Some('/') {
            self.next();
            while self.ch.is_some() && self.ch != Some('\n') {
                if self.ch == Some('\r') {
                    has_cr = true;
                }
                self.next();
            }
            if offs == self.line_offset {
                // Comment starts in column 1: may be a line directive.
                let text = self.src[offs..self.offset].to_vec();
                self.interpret_line_comment(&text);
            }
        } else {
            self.next();
            let mut terminated = false;
            while let Some(ch) = self.ch {
                if ch == '\r' {
                    has_cr = true;
                }
                self.next();
                if ch == '*' && self.ch == Some('/') {
                    self.next();
                    terminated = true;
                    break;
                }
            }
            if !terminated {
                self.error(offs, "comment not terminated");
            }
        }

        let mut lit = self.src[offs..self.offset].to_vec();
        if has_cr {
            lit.retain(|&b| b != b'\r');
        }
        String::from_utf8_lossy(&lit).into_owned()
    }

    /// Apply a `//line filename:line` directive: the line following the
    /// comment reports the given filename and line number.
    fn interpret_line_comment(&mut self, text: &[u8]) {
        const PREFIX: &[u8] = b"//line ";
        if !text.starts_with(PREFIX) {
            return;
        }
        let Some(colon) = text.iter().rposition(|&b| b == b':') else {
            return;
        };
        if colon <= PREFIX.len() {
            return;
        }
        let Some(line) = std::str::from_utf8(&text[colon + 1..])
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
        else {
            return;
        };
        if line == 0 {
            return;
        }

        let raw = String::from_utf8_lossy(&text[PREFIX.len()..colon]);
        let trimmed = raw.trim();
        let filename = if trimmed.is_empty() {
            String::new()
        } else if Path::new(trimmed).is_absolute() || self.dir.is_empty() {
            trimmed.to_owned()
        } else {
            Path::new(&self.dir)
                .join(trimmed)
                .to_string_lossy()
                .into_owned()
        };
        self.file
            .add_line_info((self.line_offset + text.len() + 1) as u32, filename, line);
    }

    /// Lookahead from a just-opened comment: does the comment (possibly
    /// a chain of comments separated only by blanks) run into a newline
    /// or the end of input before any other token? Decides whether a
    /// semicolon must be inserted before the comment.
    fn comment_reaches_line_end(&self) -> bool {
        // Initial '/' consumed; self.offset is at the second comment
        // character. Pure lookahead over the raw bytes.
        let src = self.src;
        let mut pos = self.offset;
        loop {
            match src.get(pos) {
                // A line comment always runs to the line end.
                Some(b'/') => return true,
                Some(b'*') => {
                    let mut i = pos + 1;
                    let after = loop {
                        match memchr::memchr2(b'\n', b'*', &src[i..]) {
                            // Unterminated comment: reaches end of input.
                            None => return true,
                            Some(k) => {
                                let j = i + k;
                                if src[j] == b'\n' {
                                    return true;
                                }
                                if src.get(j + 1) == Some(&b'/') {
                                    break j + 2;
                                }
                                i = j + 1;
                            }
                        }
                    };
                    let mut i = after;
                    while matches!(src.get(i), Some(b' ' | b'\t' | b'\r')) {
                        i += 1;
                    }
                    match src.get(i) {
                        None | Some(b'\n') => return true,
                        Some(b'/') if matches!(src.get(i + 1), Some(b'/' | b'*')) => {
                            pos = i + 1;
                        }
                        _ => return false,
                    }
                }
                _ => return false,
            }
        }
    }

    fn switch2(&mut self, tok0: Token, tok1: Token) -> Token {
        if self.ch == Some('=') {
            self.next();
            tok1
        } else {
            tok0
        }
    }

    fn switch3(&mut self, tok0: Token, tok1: Token, ch2: char, tok2: Token) -> Token {
        if self.ch == Some('=') {
            self.next();
            tok1
        } else if self.ch == Some(ch2) {
            self.next();
            tok2
        } else {
            tok0
        }
    }

    fn switch4(&mut self, tok0: Token, tok1: Token, ch2: char, tok2: Token, tok3: Token) -> Token {
        if self.ch == Some('=') {
            self.next();
            tok1
        } else if self.ch == Some(ch2) {
            self.next();
            if self.ch == Some('=') {
                self.next();
                tok3
            } else {
                tok2
            }
        } else {
            tok0
        }
    }

    /// Produce the next token: its position, kind, and literal text.
    ///
    /// The literal is non-empty for identifiers, keywords, basic
    /// literals, comments, and semicolons (`";"` written, `"\n"`
    /// inserted); it is empty for operators and delimiters.
    pub fn scan(&mut self) -> (Pos, Token, String) {
        loop {
            self.skip_whitespace();

            let pos = self.file.pos(self.offset as u32);
            let mut insert_semi = false;
            let mut lit = String::new();
            let tok;

            match self.ch {
                Some(ch) if is_letter(ch) => {
                    lit = self.scan_identifier();
                    if lit.len() > 1 {
                        tok = Token::lookup(&lit);
                        if matches!(
                            tok,
                            Token::Ident
                                | Token::Break
                                | Token::Continue
                                | Token::Fallthrough
                                | Token::Return
                        ) {
                            insert_semi = true;
                        }
                    } else {
                        insert_semi = true;
                        tok = Token::Ident;
                    }
                }
                Some('0'..='9') => {
                    insert_semi = true;
                    let (t, l) = self.scan_number(false);
                    tok = t;
                    lit = l;
                }
                first => {
                    let start = self.offset;
                    self.next(); // always make progress
                    match first {
                        None => {
                            if self.insert_semi {
                                self.insert_semi = false;
                                return (pos, Token::Semicolon, "\n".to_owned());
                            }
                            tok = Token::Eof;
                        }
                        Some('\n') => {
                            // Only reached when insert_semi was set;
                            // skip_whitespace eats newlines otherwise.
                            self.insert_semi = false;
                            return (pos, Token::Semicolon, "\n".to_owned());
                        }
                        Some('"') => {
                            insert_semi = true;
                            tok = Token::String;
                            lit = self.scan_string();
                        }
                        Some('\'') => {
                            insert_semi = true;
                            tok = Token::Char;
                            lit = self.scan_rune();
                        }
                        Some('`') => {
                            insert_semi = true;
                            tok = Token::String;
                            lit = self.scan_raw_string();
                        }
                        Some(':') => tok = self.switch2(Token::Colon, Token::Define),
                        Some('.') => {
                            if matches!(self.ch, Some('0'..='9')) {
                                insert_semi = true;
                                let (t, l) = self.scan_number(true);
                                tok = t;
                                lit = l;
                            } else if self.ch == Some('.') {
                                self.next();
                                if self.ch == Some('.') {
                                    self.next();
                                    tok = Token::Ellipsis;
                                } else {
                                    self.error(start, "expected '...'");
                                    tok = Token::Illegal;
                                }
                            } else {
                                tok = Token::Period;
                            }
                        }
                        Some(',') => tok = Token::Comma,
                        Some(';') => {
                            tok = Token::Semicolon;
                            lit = ";".to_owned();
                        }
                        Some('(') => tok = Token::Lparen,
                        Some(')') => {
                            insert_semi = true;
                            tok = Token::Rparen;
                        }
                        Some('[') => tok = Token::Lbrack,
                        Some(']') => {
                            insert_semi = true;
                            tok = Token::Rbrack;
                        }
                        Some('{') => tok = Token::Lbrace,
                        Some('}') => {
                            insert_semi = true;
                            tok = Token::Rbrace;
                        }
                        Some('+') => {
                            tok = self.switch3(Token::Add, Token::AddAssign, '+', Token::Inc);
                            if tok == Token::Inc {
                                insert_semi = true;
                            }
                        }
                        Some('-') => {
                            tok = self.switch3(Token::Sub, Token::SubAssign, '-', Token::Dec);
                            if tok == Token::Dec {
                                insert_semi = true;
                            }
                        }
                        Some('*') => tok = self.switch2(Token::Mul, Token::MulAssign),
                        Some('/') => {
                            if matches!(self.ch, Some('/' | '*')) {
                                if self.insert_semi && self.comment_reaches_line_end() {
                                    // Rewind to the comment start; the
                                    // next scan sees it again.
                                    self.ch = Some('/');
                                    self.offset = start;
                                    self.rd_offset = start + 1;
                                    self.insert_semi = false;
                                    return (pos, Token::Semicolon, "\n".to_owned());
                                }
                                let comment = self.scan_comment();
                                if !self.mode.contains(Mode::SCAN_COMMENTS) {
                                    self.insert_semi = false;
                                    continue;
                                }
                                tok = Token::Comment;
                                lit = comment;
                            } else {
                                tok = self.switch2(Token::Quo, Token::QuoAssign);
                            }
                        }
                        Some('%') => tok = self.switch2(Token::Rem, Token::RemAssign),
                        Some('^') => tok = self.switch2(Token::Xor, Token::XorAssign),
                        Some('<') => {
                            if self.ch == Some('-') {
                                self.next();
                                tok = Token::Arrow;
                            } else {
                                tok = self.switch4(
                                    Token::Lss,
                                    Token::Leq,
                                    '<',
                                    Token::Shl,
                                    Token::ShlAssign,
                                );
                            }
                        }
                        Some('>') => {
                            tok = self.switch4(
                                Token::Gtr,
                                Token::Geq,
                                '>',
                                Token::Shr,
                                Token::ShrAssign,
                            );
                        }
                        Some('=') => tok = self.switch2(Token::Assign, Token::Eql),
                        Some('!') => tok = self.switch2(Token::Not, Token::Neq),
                        Some('&') => {
                            if self.ch == Some('^') {
                                self.next();
                                tok = self.switch2(Token::AndNot, Token::AndNotAssign);
                            } else {
                                tok = self.switch3(Token::And, Token::AndAssign, '&', Token::LAnd);
                            }
                        }
                        Some('|') => tok = self.switch3(Token::Or, Token::OrAssign, '|', Token::LOr),
                        Some(ch) => {
                            // next() already reported stray BOMs.
                            if ch != BOM {
                                self.error(start, format!("illegal character {ch:?}"));
                            }
                            insert_semi = self.insert_semi; // preserve
                            tok = Token::Illegal;
                            lit = ch.to_string();
                        }
                    }
                }
            }

            if !self.mode.contains(Mode::DONT_INSERT_SEMIS) {
                self.insert_semi = insert_semi;
            }
            return (pos, tok, lit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gox_ir::FileSet;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn scan_all(src: &str, mode: Mode) -> (Vec<(Token, String)>, Vec<String>) {
        let fset = FileSet::new();
        let file = fset.add_file("test.gox", None, src.len() as u32);
        let errors = Rc::new(RefCell::new(ErrorList::new()));
        let mut scanner = Scanner::new(
            file,
            src.as_bytes(),
            Some(error_list_handler(Rc::clone(&errors))),
            mode,
        );

        let mut tokens = Vec::new();
        loop {
            let (_, tok, lit) = scanner.scan();
            if tok == Token::Eof {
                break;
            }
            tokens.push((tok, lit));
        }
        let msgs = errors.borrow().iter().map(|e| e.msg.clone()).collect();
        (tokens, msgs)
    }

    fn kinds(src: &str) -> Vec<Token> {
        scan_all(src, Mode::empty()).0.into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn operators_and_keywords() {
        assert_eq!(
            kinds("a := b &^= c <<= 2"),
            vec![
                Token::Ident,
                Token::Define,
                Token::Ident,
                Token::AndNotAssign,
                Token::Ident,
                Token::ShlAssign,
                Token::Int,
                Token::Semicolon,
            ]
        );
        assert_eq!(
            kinds("go func() { ch <- 1 }()"),
            vec![
                Token::Go,
                Token::Func,
                Token::Lparen,
                Token::Rparen,
                Token::Lbrace,
                Token::Ident,
                Token::Arrow,
                Token::Int,
                Token::Rbrace,
                Token::Lparen,
                Token::Rparen,
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn semicolon_insertion_at_newline() {
        assert_eq!(
            kinds("x\ny++\nreturn"),
            vec![
                Token::Ident,
                Token::Semicolon,
                Token::Ident,
                Token::Inc,
                Token::Semicolon,
                Token::Return,
                Token::Semicolon,
            ]
        );
        // No insertion after tokens that cannot end a statement.
        assert_eq!(
            kinds("x +\ny"),
            vec![Token::Ident, Token::Add, Token::Ident, Token::Semicolon]
        );
    }

    #[test]
    fn inserted_and_written_semicolons_differ_by_literal() {
        let (tokens, _) = scan_all("x;y\n", Mode::empty());
        assert_eq!(
            tokens,
            vec![
                (Token::Ident, "x".to_owned()),
                (Token::Semicolon, ";".to_owned()),
                (Token::Ident, "y".to_owned()),
                (Token::Semicolon, "\n".to_owned()),
            ]
        );
    }

    #[test]
    fn comment_before_line_end_triggers_insertion() {
        // The block comment runs to the line end, so a semicolon is
        // inserted before it and the comment is rescanned.
        assert_eq!(
            kinds("x /* done */\ny"),
            vec![Token::Ident, Token::Semicolon, Token::Ident, Token::Semicolon]
        );
        // A comment in the middle of a line does not.
        assert_eq!(
            kinds("x /* mid */ + y\n"),
            vec![
                Token::Ident,
                Token::Add,
                Token::Ident,
                Token::Semicolon
            ]
        );
        // A comment containing a newline counts as a line end.
        assert_eq!(
            kinds("x /* a\nb */ y"),
            vec![Token::Ident, Token::Semicolon, Token::Ident, Token::Semicolon]
        );
    }

    #[test]
    fn comments_surface_in_scan_comments_mode() {
        let (tokens, _) = scan_all("// doc\nx", Mode::SCAN_COMMENTS);
        assert_eq!(
            tokens,
            vec![
                (Token::Comment, "// doc".to_owned()),
                (Token::Ident, "x".to_owned()),
                (Token::Semicolon, "\n".to_owned()),
            ]
        );
    }

    #[test]
    fn dont_insert_semis_mode() {
        assert_eq!(
            scan_all("x\ny", Mode::DONT_INSERT_SEMIS).0,
            vec![
                (Token::Ident, "x".to_owned()),
                (Token::Ident, "y".to_owned()),
            ]
        );
    }

    #[test]
    fn numbers() {
        let (tokens, errors) = scan_all("0 0755 0x1f 3.14 1e-9 .5 2i 0i", Mode::empty());
        let kinds: Vec<Token> = tokens.iter().map(|(t, _)| *t).collect();
        assert_eq!(
            kinds,
            vec![
                Token::Int,
                Token::Int,
                Token::Int,
                Token::Float,
                Token::Float,
                Token::Float,
                Token::Imag,
                Token::Imag,
                Token::Semicolon,
            ]
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn legacy_octal_with_decimal_digit() {
        let (tokens, errors) = scan_all("078\n", Mode::empty());
        assert_eq!(tokens[0], (Token::Int, "078".to_owned()));
        assert_eq!(errors, vec!["illegal octal number".to_owned()]);

        // A decimal digit is fine when the literal turns out to be a float.
        let (tokens, errors) = scan_all("078.5\n", Mode::empty());
        assert_eq!(tokens[0], (Token::Float, "078.5".to_owned()));
        assert!(errors.is_empty());
    }

    #[test]
    fn incomplete_hex_is_reported() {
        let (tokens, errors) = scan_all("0x\n", Mode::empty());
        assert_eq!(tokens[0].0, Token::Int);
        assert_eq!(errors, vec!["illegal hexadecimal number".to_owned()]);
    }

    #[test]
    fn string_escapes() {
        let (tokens, errors) = scan_all(r#""a\n\t\x41é""#, Mode::empty());
        assert_eq!(tokens[0].0, Token::String);
        assert!(errors.is_empty());

        let (_, errors) = scan_all(r#""bad \q escape""#, Mode::empty());
        assert_eq!(errors, vec!["unknown escape sequence".to_owned()]);

        let (_, errors) = scan_all(r#""surrogate \ud800""#, Mode::empty());
        assert_eq!(
            errors,
            vec!["escape sequence is invalid Unicode code point".to_owned()]
        );
    }

    #[test]
    fn unterminated_literals() {
        let (_, errors) = scan_all("\"abc\nx", Mode::empty());
        assert_eq!(errors[0], "string literal not terminated");

        let (_, errors) = scan_all("'a\nx", Mode::empty());
        assert_eq!(errors[0], "rune literal not terminated");

        let (_, errors) = scan_all("`abc", Mode::empty());
        assert_eq!(errors[0], "raw string literal not terminated");

        let (_, errors) = scan_all("/* abc", Mode::empty());
        assert_eq!(errors[0], "comment not terminated");
    }

    #[test]
    fn rune_literals() {
        let (tokens, errors) = scan_all(r"'a' 'ሴ' '\''", Mode::empty());
        let kinds: Vec<Token> = tokens.iter().map(|(t, _)| *t).collect();
        assert_eq!(
            kinds,
            vec![Token::Char, Token::Char, Token::Char, Token::Semicolon]
        );
        assert!(errors.is_empty());

        let (_, errors) = scan_all("'ab'", Mode::empty());
        assert_eq!(errors, vec!["illegal rune literal".to_owned()]);
    }

    #[test]
    fn raw_string_strips_carriage_returns() {
        let (tokens, _) = scan_all("`a\r\nb`", Mode::empty());
        assert_eq!(tokens[0], (Token::String, "`a\nb`".to_owned()));
    }

    #[test]
    fn line_directive_rebases_positions() {
        let src = "//line override.gox:100\nx\n";
        let fset = FileSet::new();
        let file = fset.add_file("test.gox", None, src.len() as u32);
        let mut scanner = Scanner::new(Arc::clone(&file), src.as_bytes(), None, Mode::empty());

        let x_pos = loop {
            let (pos, tok, lit) = scanner.scan();
            if tok == Token::Ident && lit == "x" {
                break pos;
            }
            assert_ne!(tok, Token::Eof, "identifier not found");
        };

        let position = file.position(x_pos);
        assert_eq!(position.filename, "override.gox");
        assert_eq!(position.line, 100);
        // The unadjusted position still reports the real file.
        let raw = file.position_for(x_pos, false);
        assert_eq!(raw.filename, "test.gox");
        assert_eq!(raw.line, 2);
    }

    #[test]
    fn leading_bom_skipped_interior_bom_reported() {
        let (tokens, errors) = scan_all("\u{feff}x", Mode::empty());
        assert_eq!(tokens[0], (Token::Ident, "x".to_owned()));
        assert!(errors.is_empty());

        let (_, errors) = scan_all("x\u{feff}y", Mode::empty());
        assert_eq!(errors, vec!["illegal byte order mark".to_owned()]);
    }

    #[test]
    fn nul_and_invalid_utf8_reported() {
        let fset = FileSet::new();
        let src: &[u8] = b"a\x00b\xffc";
        let file = fset.add_file("bin.gox", None, src.len() as u32);
        let errors = Rc::new(RefCell::new(ErrorList::new()));
        let mut scanner = Scanner::new(
            file,
            src,
            Some(error_list_handler(Rc::clone(&errors))),
            Mode::empty(),
        );
        loop {
            if scanner.scan().1 == Token::Eof {
                break;
            }
        }
        let msgs: Vec<String> = errors.borrow().iter().map(|e| e.msg.clone()).collect();
        assert!(msgs.contains(&"illegal character NUL".to_owned()));
        assert!(msgs.contains(&"illegal UTF-8 encoding".to_owned()));
    }

    #[test]
    fn unicode_identifiers() {
        let (tokens, errors) = scan_all("日本語 := 1", Mode::empty());
        assert_eq!(tokens[0], (Token::Ident, "日本語".to_owned()));
        assert!(errors.is_empty());
    }

    proptest! {
        /// The scanner terminates on arbitrary bytes and every token's
        /// position falls inside the file.
        #[test]
        fn scanning_arbitrary_bytes_terminates(src in proptest::collection::vec(any::<u8>(), 0..512)) {
            let fset = FileSet::new();
            let file = fset.add_file("fuzz.gox", None, src.len() as u32);
            let mut scanner = Scanner::new(Arc::clone(&file), &src, None, Mode::empty());
            for _ in 0..=src.len() + 2 {
                let (pos, tok, _) = scanner.scan();
                prop_assert!(pos.is_valid());
                let offset = file.offset(pos);
                prop_assert!(offset <= src.len() as u32);
                if tok == Token::Eof {
                    return Ok(());
                }
            }
            prop_assert!(false, "scanner failed to reach EOF");
        }

        /// Scanning source with newlines never produces two consecutive
        /// inserted semicolons.
        #[test]
        fn no_double_inserted_semicolons(words in proptest::collection::vec("[a-z]{1,4}", 1..20)) {
            let src = words.join("\n");
            let fset = FileSet::new();
            let file = fset.add_file("w.gox", None, src.len() as u32);
            let mut scanner = Scanner::new(file, src.as_bytes(), None, Mode::empty());
            let mut tokens = Vec::new();
            loop {
                let (_, tok, lit) = scanner.scan();
                if tok == Token::Eof {
                    break;
                }
                tokens.push((tok, lit));
            }
            for pair in tokens.windows(2) {
                prop_assert!(
                    !(pair[0].0 == Token::Semicolon && pair[1].0 == Token::Semicolon),
                    "double semicolon in {tokens:?}"
                );
            }
        }
    }
}
