//! String and template literal scanning.

use super::cursor::Cursor;
use crate::token::{TemplateRaw, TokenKind};
use skyhook_core::{SkyhookError, SkyhookResult};

/// Scan a quoted string literal; the cursor sits on the opening quote.
pub fn scan_string(cursor: &mut Cursor<'_>) -> SkyhookResult<TokenKind> {
    let start = cursor.pos();
    let quote = cursor.bump().unwrap_or('"');
    let mut value = String::new();

    loop {
        match cursor.bump() {
            None => {
                return Err(SkyhookError::lex(
                    "unterminated string literal",
                    cursor.span_from(start),
                ));
            }
            Some(c) if c == quote => break,
            Some('\\') => {
                if let Some(c) = scan_escape(cursor, start)? {
                    value.push(c);
                }
            }
            Some('\n' | '\r') => {
                return Err(SkyhookError::lex(
                    "unterminated string literal",
                    cursor.span_from(start),
                ));
            }
            Some(c) => value.push(c),
        }
    }

    Ok(TokenKind::String(value))
}

/// Scan one escape sequence after a consumed `\`.
///
/// Returns `None` for a line continuation (backslash-newline).
fn scan_escape(cursor: &mut Cursor<'_>, start: usize) -> SkyhookResult<Option<char>> {
    let c = match cursor.bump() {
        Some(c) => c,
        None => {
            return Err(SkyhookError::lex(
                "unterminated escape sequence",
                cursor.span_from(start),
            ));
        }
    };
    Ok(Some(match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        'b' => '\u{8}',
        'f' => '\u{c}',
        'v' => '\u{b}',
        '0' => '\0',
        '\n' => return Ok(None),
        '\r' => {
            cursor.eat('\n');
            return Ok(None);
        }
        'x' => {
            let hi = hex_digit(cursor, start)?;
            let lo = hex_digit(cursor, start)?;
            char::from_u32(hi * 16 + lo).unwrap_or('\u{fffd}')
        }
        'u' => {
            if cursor.eat('{') {
                let mut code = 0u32;
                while !cursor.eat('}') {
                    code = code * 16 + hex_digit(cursor, start)?;
                    if code > 0x0010_ffff {
                        return Err(SkyhookError::lex(
                            "code point out of range",
                            cursor.span_from(start),
                        ));
                    }
                }
                char::from_u32(code).unwrap_or('\u{fffd}')
            } else {
                let mut code = 0u32;
                for _ in 0..4 {
                    code = code * 16 + hex_digit(cursor, start)?;
                }
                char::from_u32(code).unwrap_or('\u{fffd}')
            }
        }
        other => other,
    }))
}

fn hex_digit(cursor: &mut Cursor<'_>, start: usize) -> SkyhookResult<u32> {
    cursor
        .bump()
        .and_then(|c| c.to_digit(16))
        .ok_or_else(|| SkyhookError::lex("invalid hex escape", cursor.span_from(start)))
}

/// Scan a template literal; the cursor sits on the opening backtick.
///
/// Quasis are cooked in place; each `${...}` substitution is collected as
/// raw source text (brace-balanced, quote-aware) for the parser to re-parse.
pub fn scan_template(cursor: &mut Cursor<'_>) -> SkyhookResult<TokenKind> {
    let start = cursor.pos();
    cursor.bump(); // `

    let mut quasis = Vec::new();
    let mut exprs = Vec::new();
    let mut current = String::new();

    loop {
        match cursor.bump() {
            None => {
                return Err(SkyhookError::lex(
                    "unterminated template literal",
                    cursor.span_from(start),
                ));
            }
            Some('`') => break,
            Some('\\') => {
                if let Some(c) = scan_escape(cursor, start)? {
                    current.push(c);
                }
            }
            Some('$') if cursor.first() == '{' => {
                cursor.bump(); // {
                quasis.push(std::mem::take(&mut current));
                exprs.push(scan_substitution(cursor, start)?);
            }
            Some(c) => current.push(c),
        }
    }

    quasis.push(current);
    Ok(TokenKind::Template(TemplateRaw { quasis, exprs }))
}

/// Collect the raw source of one `${...}` substitution up to its balancing
/// `}`, skipping over nested strings, templates and braces.
fn scan_substitution(cursor: &mut Cursor<'_>, start: usize) -> SkyhookResult<String> {
    let expr_start = cursor.pos();
    let mut depth = 1usize;

    loop {
        let c = match cursor.bump() {
            Some(c) => c,
            None => {
                return Err(SkyhookError::lex(
                    "unterminated template substitution",
                    cursor.span_from(start),
                ));
            }
        };
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = cursor.pos() - 1;
                    let text = cursor.slice_from(expr_start);
                    return Ok(text[..end - expr_start].to_string());
                }
            }
            '\'' | '"' => skip_quoted(cursor, c, start)?,
            '`' => skip_nested_template(cursor, start)?,
            _ => {}
        }
    }
}

fn skip_quoted(cursor: &mut Cursor<'_>, quote: char, start: usize) -> SkyhookResult<()> {
    loop {
        match cursor.bump() {
            None => {
                return Err(SkyhookError::lex(
                    "unterminated string in template substitution",
                    cursor.span_from(start),
                ));
            }
            Some('\\') => {
                cursor.bump();
            }
            Some(c) if c == quote => return Ok(()),
            Some(_) => {}
        }
    }
}

fn skip_nested_template(cursor: &mut Cursor<'_>, start: usize) -> SkyhookResult<()> {
    loop {
        match cursor.bump() {
            None => {
                return Err(SkyhookError::lex(
                    "unterminated nested template",
                    cursor.span_from(start),
                ));
            }
            Some('\\') => {
                cursor.bump();
            }
            Some('$') if cursor.first() == '{' => {
                cursor.bump();
                scan_substitution(cursor, start)?;
            }
            Some('`') => return Ok(()),
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(src: &str) -> TokenKind {
        scan_string(&mut Cursor::new(src)).expect("scan failed")
    }

    #[test]
    fn test_simple_strings() {
        assert_eq!(scan("\"hi\""), TokenKind::String("hi".into()));
        assert_eq!(scan("'it'"), TokenKind::String("it".into()));
    }

    #[test]
    fn test_escapes() {
        assert_eq!(scan(r#""a\nb\t\\""#), TokenKind::String("a\nb\t\\".into()));
        assert_eq!(scan(r#""\x41B\u{43}""#), TokenKind::String("ABC".into()));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(scan_string(&mut Cursor::new("\"oops")).is_err());
    }

    #[test]
    fn test_template_plain() {
        let kind = scan_template(&mut Cursor::new("`hello`")).unwrap();
        let TokenKind::Template(raw) = kind else {
            panic!("expected template");
        };
        assert_eq!(raw.quasis, vec!["hello".to_string()]);
        assert!(raw.exprs.is_empty());
    }

    #[test]
    fn test_template_substitutions() {
        let kind = scan_template(&mut Cursor::new("`a${x + 1}b${f({k: 1})}c`")).unwrap();
        let TokenKind::Template(raw) = kind else {
            panic!("expected template");
        };
        assert_eq!(raw.quasis, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        assert_eq!(raw.exprs, vec!["x + 1".to_string(), "f({k: 1})".to_string()]);
    }

    #[test]
    fn test_template_nested_string_with_brace() {
        let kind = scan_template(&mut Cursor::new("`v${s + \"}\"}w`")).unwrap();
        let TokenKind::Template(raw) = kind else {
            panic!("expected template");
        };
        assert_eq!(raw.exprs, vec!["s + \"}\"".to_string()]);
        assert_eq!(raw.quasis, vec!["v".to_string(), "w".to_string()]);
    }
}
