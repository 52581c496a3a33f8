//! Synchronization sets for error recovery.
//!
//! Token discriminants fit in 0..=80, so a `u128` bitset gives O(1)
//! membership for the sets the parser skips to after a syntax error.

use gox_ir::Token;

/// A set of token kinds backed by a `u128` bitset.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) struct TokenSet(u128);

impl TokenSet {
    pub const fn new() -> Self {
        TokenSet(0)
    }

    /// Add a token (builder form, usable in const initializers).
    #[must_use]
    pub const fn with(self, tok: Token) -> Self {
        TokenSet(self.0 | 1u128 << tok as u8)
    }

    #[inline]
    pub const fn contains(self, tok: Token) -> bool {
        self.0 & (1u128 << tok as u8) != 0
    }
}

/// Tokens that can begin a statement; sync target inside blocks.
pub(crate) const STMT_START: TokenSet = TokenSet::new()
    .with(Token::Break)
    .with(Token::Const)
    .with(Token::Continue)
    .with(Token::Defer)
    .with(Token::Fallthrough)
    .with(Token::For)
    .with(Token::Go)
    .with(Token::Goto)
    .with(Token::If)
    .with(Token::Return)
    .with(Token::Select)
    .with(Token::Switch)
    .with(Token::Type)
    .with(Token::Var);

/// Tokens that can begin a top-level declaration; sync target at file
/// level.
pub(crate) const DECL_START: TokenSet = TokenSet::new()
    .with(Token::Const)
    .with(Token::Type)
    .with(Token::Var)
    .with(Token::Func)
    .with(Token::Import);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership() {
        assert!(STMT_START.contains(Token::For));
        assert!(!STMT_START.contains(Token::Func));
        assert!(DECL_START.contains(Token::Func));
        assert!(!DECL_START.contains(Token::If));
    }

    #[test]
    fn with_is_additive() {
        let set = TokenSet::new().with(Token::Comma);
        assert!(set.contains(Token::Comma));
        assert!(!set.contains(Token::Colon));
        let set = set.with(Token::Colon);
        assert!(set.contains(Token::Comma) && set.contains(Token::Colon));
    }
}
