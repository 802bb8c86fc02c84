//! Numeric literal scanning.

use super::cursor::Cursor;
use crate::token::TokenKind;
use skyhook_core::{SkyhookError, SkyhookResult};

/// Scan a numeric literal; the cursor sits on its first digit (or a `.`
/// followed by a digit).
///
/// Handles decimal (with fraction and exponent), hex, octal and binary
/// forms, numeric separators, and the bigint `n` suffix (decimal only).
pub fn scan_number(cursor: &mut Cursor<'_>) -> SkyhookResult<TokenKind> {
    let start = cursor.pos();

    if cursor.first() == '0' && matches!(cursor.second(), 'x' | 'X' | 'o' | 'O' | 'b' | 'B') {
        cursor.bump();
        let radix = match cursor.bump() {
            Some('x' | 'X') => 16,
            Some('o' | 'O') => 8,
            _ => 2,
        };
        let digits_start = cursor.pos();
        cursor.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let digits: String = cursor
            .slice_from(digits_start)
            .chars()
            .filter(|c| *c != '_')
            .collect();
        if cursor.first() == 'n' {
            return Err(SkyhookError::lex(
                "non-decimal bigint literals are not supported",
                cursor.span_from(start),
            ));
        }
        let value = u64::from_str_radix(&digits, radix).map_err(|_| {
            SkyhookError::lex(
                format!("invalid radix-{radix} literal"),
                cursor.span_from(start),
            )
        })?;
        return Ok(TokenKind::Number(value as f64));
    }

    cursor.eat_while(|c| c.is_ascii_digit() || c == '_');

    // Bigint: integer digits followed by `n`.
    if cursor.first() == 'n' {
        let digits: String = cursor
            .slice_from(start)
            .chars()
            .filter(|c| *c != '_')
            .collect();
        cursor.bump();
        return Ok(TokenKind::BigInt(digits));
    }

    if cursor.first() == '.' && cursor.second().is_ascii_digit() {
        cursor.bump();
        cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
    } else if cursor.first() == '.' && cursor.pos() > start {
        // Trailing dot form: `1.`
        cursor.bump();
    }

    if matches!(cursor.first(), 'e' | 'E') {
        let mut probe = cursor.clone();
        probe.bump();
        if matches!(probe.first(), '+' | '-') {
            probe.bump();
        }
        if probe.first().is_ascii_digit() {
            cursor.bump();
            if matches!(cursor.first(), '+' | '-') {
                cursor.bump();
            }
            cursor.eat_while(|c| c.is_ascii_digit());
        }
    }

    let text: String = cursor
        .slice_from(start)
        .chars()
        .filter(|c| *c != '_')
        .collect();
    let value: f64 = text.parse().map_err(|_| {
        SkyhookError::lex(
            format!("invalid numeric literal `{text}`"),
            cursor.span_from(start),
        )
    })?;
    Ok(TokenKind::Number(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(src: &str) -> TokenKind {
        scan_number(&mut Cursor::new(src)).expect("scan failed")
    }

    #[test]
    fn test_integers_and_floats() {
        assert_eq!(scan("42"), TokenKind::Number(42.0));
        assert_eq!(scan("3.25"), TokenKind::Number(3.25));
        assert_eq!(scan("1."), TokenKind::Number(1.0));
    }

    #[test]
    fn test_exponents() {
        assert_eq!(scan("1e3"), TokenKind::Number(1000.0));
        assert_eq!(scan("2.5e-1"), TokenKind::Number(0.25));
    }

    #[test]
    fn test_radix_forms() {
        assert_eq!(scan("0xff"), TokenKind::Number(255.0));
        assert_eq!(scan("0b101"), TokenKind::Number(5.0));
        assert_eq!(scan("0o17"), TokenKind::Number(15.0));
    }

    #[test]
    fn test_separators() {
        assert_eq!(scan("1_000_000"), TokenKind::Number(1_000_000.0));
    }

    #[test]
    fn test_bigint() {
        assert_eq!(scan("123n"), TokenKind::BigInt("123".into()));
    }

    #[test]
    fn test_hex_bigint_rejected() {
        assert!(scan_number(&mut Cursor::new("0xffn")).is_err());
    }
}
