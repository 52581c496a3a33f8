//! Token classification for the scanned language.
//!
//! One closed `#[repr(u8)]` enumeration with explicit discriminants laid
//! out in three contiguous ranges, so category checks compile to a pair
//! of integer comparisons:
//!
//! | Range | Category                |
//! |-------|-------------------------|
//! | 0-2   | Specials                |
//! | 3-8   | Literals                |
//! | 9-55  | Operators / delimiters  |
//! | 56-80 | Keywords                |

use std::fmt;

/// Lexical token kind.
///
/// Literal-carrying tokens (`Ident`, `Int`, ...) do not embed their text;
/// the scanner returns the literal alongside the token, and the parser
/// interns what it keeps.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(u8)]
pub enum Token {
    // === Specials (0-2) ===
    Illegal = 0,
    Eof = 1,
    Comment = 2,

    // === Literals (3-8) ===
    Ident = 3,
    Int = 4,
    Float = 5,
    Imag = 6,
    Char = 7,
    String = 8,

    // === Operators and delimiters (9-55) ===
    Add = 9,    // +
    Sub = 10,   // -
    Mul = 11,   // *
    Quo = 12,   // /
    Rem = 13,   // %
    And = 14,   // &
    Or = 15,    // |
    Xor = 16,   // ^
    Shl = 17,   // <<
    Shr = 18,   // >>
    AndNot = 19, // &^

    AddAssign = 20,    // +=
    SubAssign = 21,    // -=
    MulAssign = 22,    // *=
    QuoAssign = 23,    // /=
    RemAssign = 24,    // %=
    AndAssign = 25,    // &=
    OrAssign = 26,     // |=
    XorAssign = 27,    // ^=
    ShlAssign = 28,    // <<=
    ShrAssign = 29,    // >>=
    AndNotAssign = 30, // &^=

    LAnd = 31,  // &&
    LOr = 32,   // ||
    Arrow = 33, // <-
    Inc = 34,   // ++
    Dec = 35,   // --

    Eql = 36,    // ==
    Lss = 37,    // <
    Gtr = 38,    // >
    Assign = 39, // =
    Not = 40,    // !

    Neq = 41,      // !=
    Leq = 42,      // <=
    Geq = 43,      // >=
    Define = 44,   // :=
    Ellipsis = 45, // ...

    Lparen = 46, // (
    Lbrack = 47, // [
    Lbrace = 48, // {
    Comma = 49,  // ,
    Period = 50, // .

    Rparen = 51,    // )
    Rbrack = 52,    // ]
    Rbrace = 53,    // }
    Semicolon = 54, // ;
    Colon = 55,     // :

    // === Keywords (56-80) ===
    Break = 56,
    Case = 57,
    Chan = 58,
    Const = 59,
    Continue = 60,

    Default = 61,
    Defer = 62,
    Else = 63,
    Fallthrough = 64,
    For = 65,

    Func = 66,
    Go = 67,
    Goto = 68,
    If = 69,
    Import = 70,

    Interface = 71,
    Map = 72,
    Package = 73,
    Range = 74,
    Return = 75,

    Select = 76,
    Struct = 77,
    Switch = 78,
    Type = 79,
    Var = 80,
}

const LITERAL_BEG: u8 = Token::Ident as u8;
const LITERAL_END: u8 = Token::String as u8;
const OPERATOR_BEG: u8 = Token::Add as u8;
const OPERATOR_END: u8 = Token::Colon as u8;
const KEYWORD_BEG: u8 = Token::Break as u8;
const KEYWORD_END: u8 = Token::Var as u8;

impl Token {
    /// Precedence of a non-operator token.
    pub const LOWEST_PREC: u8 = 0;
    /// Precedence of unary operators.
    pub const UNARY_PREC: u8 = 6;
    /// Catch-all highest precedence.
    pub const HIGHEST_PREC: u8 = 7;

    /// Canonical spelling; literal categories yield their name
    /// (`"IDENT"`, `"INT"`, ...).
    pub const fn text(self) -> &'static str {
        match self {
            Token::Illegal => "ILLEGAL",
            Token::Eof => "EOF",
            Token::Comment => "COMMENT",

            Token::Ident => "IDENT",
            Token::Int => "INT",
            Token::Float => "FLOAT",
            Token::Imag => "IMAG",
            Token::Char => "CHAR",
            Token::String => "STRING",

            Token::Add => "+",
            Token::Sub => "-",
            Token::Mul => "*",
            Token::Quo => "/",
            Token::Rem => "%",
            Token::And => "&",
            Token::Or => "|",
            Token::Xor => "^",
            Token::Shl => "<<",
            Token::Shr => ">>",
            Token::AndNot => "&^",

            Token::AddAssign => "+=",
            Token::SubAssign => "-=",
            Token::MulAssign => "*=",
            Token::QuoAssign => "/=",
            Token::RemAssign => "%=",
            Token::AndAssign => "&=",
            Token::OrAssign => "|=",
            Token::XorAssign => "^=",
            Token::ShlAssign => "<<=",
            Token::ShrAssign => ">>=",
            Token::AndNotAssign => "&^=",

            Token::LAnd => "&&",
            Token::LOr => "||",
            Token::Arrow => "<-",
            Token::Inc => "++",
            Token::Dec => "--",

            Token::Eql => "==",
            Token::Lss => "<",
            Token::Gtr => ">",
            Token::Assign => "=",
            Token::Not => "!",

            Token::Neq => "!=",
            Token::Leq => "<=",
            Token::Geq => ">=",
            Token::Define => ":=",
            Token::Ellipsis => "...",

            Token::Lparen => "(",
            Token::Lbrack => "[",
            Token::Lbrace => "{",
            Token::Comma => ",",
            Token::Period => ".",

            Token::Rparen => ")",
            Token::Rbrack => "]",
            Token::Rbrace => "}",
            Token::Semicolon => ";",
            Token::Colon => ":",

            Token::Break => "break",
            Token::Case => "case",
            Token::Chan => "chan",
            Token::Const => "const",
            Token::Continue => "continue",
            Token::Default => "default",
            Token::Defer => "defer",
            Token::Else => "else",
            Token::Fallthrough => "fallthrough",
            Token::For => "for",
            Token::Func => "func",
            Token::Go => "go",
            Token::Goto => "goto",
            Token::If => "if",
            Token::Import => "import",
            Token::Interface => "interface",
            Token::Map => "map",
            Token::Package => "package",
            Token::Range => "range",
            Token::Return => "return",
            Token::Select => "select",
            Token::Struct => "struct",
            Token::Switch => "switch",
            Token::Type => "type",
            Token::Var => "var",
        }
    }

    /// Binary-operator precedence: 0 for non-operators, then
    /// `||` < `&&` < comparisons < additive < multiplicative.
    pub const fn precedence(self) -> u8 {
        match self {
            Token::LOr => 1,
            Token::LAnd => 2,
            Token::Eql | Token::Neq | Token::Lss | Token::Leq | Token::Gtr | Token::Geq => 3,
            Token::Add | Token::Sub | Token::Or | Token::Xor => 4,
            Token::Mul
            | Token::Quo
            | Token::Rem
            | Token::Shl
            | Token::Shr
            | Token::And
            | Token::AndNot => 5,
            _ => Self::LOWEST_PREC,
        }
    }

    /// `true` for identifiers and basic literals.
    #[inline]
    pub const fn is_literal(self) -> bool {
        let tag = self as u8;
        LITERAL_BEG <= tag && tag <= LITERAL_END
    }

    /// `true` for operators and delimiters.
    #[inline]
    pub const fn is_operator(self) -> bool {
        let tag = self as u8;
        OPERATOR_BEG <= tag && tag <= OPERATOR_END
    }

    /// `true` for keywords.
    #[inline]
    pub const fn is_keyword(self) -> bool {
        let tag = self as u8;
        KEYWORD_BEG <= tag && tag <= KEYWORD_END
    }

    /// Map an identifier spelling to its keyword token, or `Ident`.
    pub fn lookup(ident: &str) -> Token {
        match ident {
            "break" => Token::Break,
            "case" => Token::Case,
            "chan" => Token::Chan,
            "const" => Token::Const,
            "continue" => Token::Continue,
            "default" => Token::Default,
            "defer" => Token::Defer,
            "else" => Token::Else,
            "fallthrough" => Token::Fallthrough,
            "for" => Token::For,
            "func" => Token::Func,
            "go" => Token::Go,
            "goto" => Token::Goto,
            "if" => Token::If,
            "import" => Token::Import,
            "interface" => Token::Interface,
            "map" => Token::Map,
            "package" => Token::Package,
            "range" => Token::Range,
            "return" => Token::Return,
            "select" => Token::Select,
            "struct" => Token::Struct,
            "switch" => Token::Switch,
            "type" => Token::Type,
            "var" => Token::Var,
            _ => Token::Ident,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}
