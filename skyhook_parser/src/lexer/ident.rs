//! Identifier and keyword scanning.

use super::cursor::Cursor;
use crate::token::{Keyword, TokenKind};

/// Whether `c` can start an identifier.
#[inline]
#[must_use]
pub fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

/// Whether `c` can continue an identifier.
#[inline]
#[must_use]
pub fn is_ident_continue(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphanumeric()
}

/// Scan an identifier or keyword; the cursor sits on its first character.
pub fn scan_ident(cursor: &mut Cursor<'_>) -> TokenKind {
    let start = cursor.pos();
    cursor.bump();
    cursor.eat_while(is_ident_continue);
    let text = cursor.slice_from(start);
    match Keyword::from_str(text) {
        Some(kw) => TokenKind::Keyword(kw),
        None => TokenKind::Ident(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(src: &str) -> TokenKind {
        scan_ident(&mut Cursor::new(src))
    }

    #[test]
    fn test_plain_identifier() {
        assert_eq!(scan("foo_bar1 rest"), TokenKind::Ident("foo_bar1".into()));
        assert_eq!(scan("$x"), TokenKind::Ident("$x".into()));
        assert_eq!(scan("_self"), TokenKind::Ident("_self".into()));
    }

    #[test]
    fn test_keyword() {
        assert_eq!(scan("function"), TokenKind::Keyword(Keyword::Function));
        assert_eq!(scan("instanceof"), TokenKind::Keyword(Keyword::Instanceof));
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        assert_eq!(scan("classy"), TokenKind::Ident("classy".into()));
        assert_eq!(scan("newish"), TokenKind::Ident("newish".into()));
    }
}
