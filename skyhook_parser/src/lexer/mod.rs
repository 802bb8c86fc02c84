//! Hand-written lexer for the JavaScript subset.

pub mod cursor;
mod ident;
mod number;
mod string;

use crate::token::{Token, TokenKind};
use cursor::Cursor;
use skyhook_core::{SkyhookError, SkyhookResult};

/// The lexer. Cloning it captures the full lexing state, which the parser
/// uses for speculative lookahead (arrow-parameter disambiguation).
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
}

impl<'src> Lexer<'src> {
    /// Create a lexer over the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    /// Produce the next token, or a lex error.
    pub fn next_token(&mut self) -> SkyhookResult<Token> {
        let newline_before = self.skip_trivia()?;
        let start = self.cursor.pos();

        let kind = match self.cursor.first() {
            cursor::EOF_CHAR if self.cursor.is_eof() => TokenKind::Eof,
            c if ident::is_ident_start(c) => ident::scan_ident(&mut self.cursor),
            c if c.is_ascii_digit() => number::scan_number(&mut self.cursor)?,
            '.' if self.cursor.second().is_ascii_digit() => {
                number::scan_number(&mut self.cursor)?
            }
            '"' | '\'' => string::scan_string(&mut self.cursor)?,
            '`' => string::scan_template(&mut self.cursor)?,
            _ => self.scan_punct()?,
        };

        let mut token = Token::new(kind, self.cursor.span_from(start));
        token.newline_before = newline_before;
        Ok(token)
    }

    /// Skip whitespace and comments; report whether a line terminator was
    /// crossed.
    fn skip_trivia(&mut self) -> SkyhookResult<bool> {
        let mut newline = false;
        loop {
            match self.cursor.first() {
                '\n' | '\r' | '\u{2028}' | '\u{2029}' => {
                    newline = true;
                    self.cursor.bump();
                }
                c if c.is_whitespace() => {
                    self.cursor.bump();
                }
                '/' if self.cursor.second() == '/' => {
                    self.cursor.eat_while(|c| c != '\n');
                }
                '/' if self.cursor.second() == '*' => {
                    let start = self.cursor.pos();
                    self.cursor.bump();
                    self.cursor.bump();
                    loop {
                        match self.cursor.bump() {
                            None => {
                                return Err(SkyhookError::lex(
                                    "unterminated block comment",
                                    self.cursor.span_from(start),
                                ));
                            }
                            Some('\n') => newline = true,
                            Some('*') if self.cursor.first() == '/' => {
                                self.cursor.bump();
                                break;
                            }
                            Some(_) => {}
                        }
                    }
                }
                _ => return Ok(newline),
            }
        }
    }

    /// Scan a punctuation or operator token.
    fn scan_punct(&mut self) -> SkyhookResult<TokenKind> {
        let start = self.cursor.pos();
        let c = self.cursor.bump().unwrap_or(cursor::EOF_CHAR);
        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semi,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '~' => TokenKind::Tilde,
            '.' => {
                if self.cursor.first() == '.' && self.cursor.second() == '.' {
                    self.cursor.bump();
                    self.cursor.bump();
                    TokenKind::DotDotDot
                } else {
                    TokenKind::Dot
                }
            }
            '?' => {
                if self.cursor.eat('?') {
                    TokenKind::QuestionQuestion
                } else {
                    TokenKind::Question
                }
            }
            '=' => {
                if self.cursor.eat('>') {
                    TokenKind::Arrow
                } else if self.cursor.eat('=') {
                    if self.cursor.eat('=') {
                        TokenKind::EqEqEq
                    } else {
                        TokenKind::EqEq
                    }
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.cursor.eat('=') {
                    if self.cursor.eat('=') {
                        TokenKind::NotEqEq
                    } else {
                        TokenKind::NotEq
                    }
                } else {
                    TokenKind::Bang
                }
            }
            '+' => {
                if self.cursor.eat('+') {
                    TokenKind::PlusPlus
                } else if self.cursor.eat('=') {
                    TokenKind::PlusEq
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.cursor.eat('-') {
                    TokenKind::MinusMinus
                } else if self.cursor.eat('=') {
                    TokenKind::MinusEq
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.cursor.eat('*') {
                    if self.cursor.eat('=') {
                        TokenKind::StarStarEq
                    } else {
                        TokenKind::StarStar
                    }
                } else if self.cursor.eat('=') {
                    TokenKind::StarEq
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.cursor.eat('=') {
                    TokenKind::SlashEq
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.cursor.eat('=') {
                    TokenKind::PercentEq
                } else {
                    TokenKind::Percent
                }
            }
            '&' => {
                if self.cursor.eat('&') {
                    TokenKind::AmpAmp
                } else if self.cursor.eat('=') {
                    TokenKind::AmpEq
                } else {
                    TokenKind::Amp
                }
            }
            '|' => {
                if self.cursor.eat('|') {
                    TokenKind::PipePipe
                } else if self.cursor.eat('=') {
                    TokenKind::PipeEq
                } else {
                    TokenKind::Pipe
                }
            }
            '^' => {
                if self.cursor.eat('=') {
                    TokenKind::CaretEq
                } else {
                    TokenKind::Caret
                }
            }
            '<' => {
                if self.cursor.eat('<') {
                    if self.cursor.eat('=') {
                        TokenKind::ShlEq
                    } else {
                        TokenKind::Shl
                    }
                } else if self.cursor.eat('=') {
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.cursor.eat('>') {
                    if self.cursor.eat('>') {
                        if self.cursor.eat('=') {
                            TokenKind::UShrEq
                        } else {
                            TokenKind::UShr
                        }
                    } else if self.cursor.eat('=') {
                        TokenKind::ShrEq
                    } else {
                        TokenKind::Shr
                    }
                } else if self.cursor.eat('=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            other => {
                return Err(SkyhookError::lex(
                    format!("unexpected character `{other}`"),
                    self.cursor.span_from(start),
                ));
            }
        };
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Keyword;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().expect("lex failed");
            let done = token.kind == TokenKind::Eof;
            out.push(token.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn test_arrow_and_operators() {
        assert_eq!(
            kinds("(a) => a ** 2"),
            vec![
                TokenKind::LParen,
                TokenKind::Ident("a".into()),
                TokenKind::RParen,
                TokenKind::Arrow,
                TokenKind::Ident("a".into()),
                TokenKind::StarStar,
                TokenKind::Number(2.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_equality_family() {
        assert_eq!(
            kinds("== === != !== ="),
            vec![
                TokenKind::EqEq,
                TokenKind::EqEqEq,
                TokenKind::NotEq,
                TokenKind::NotEqEq,
                TokenKind::Assign,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_shift_family() {
        assert_eq!(
            kinds("<< >> >>> >>>="),
            vec![
                TokenKind::Shl,
                TokenKind::Shr,
                TokenKind::UShr,
                TokenKind::UShrEq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_newline_tracking() {
        let mut lexer = Lexer::new("a\nb c");
        assert!(!lexer.next_token().unwrap().newline_before);
        assert!(lexer.next_token().unwrap().newline_before);
        assert!(!lexer.next_token().unwrap().newline_before);
    }

    #[test]
    fn test_comments_are_trivia() {
        let mut lexer = Lexer::new("a // line\n/* block\n */ b");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Ident("a".into()));
        let b = lexer.next_token().unwrap();
        assert_eq!(b.kind, TokenKind::Ident("b".into()));
        assert!(b.newline_before);
    }

    #[test]
    fn test_keywords_and_spread() {
        assert_eq!(
            kinds("function ...rest"),
            vec![
                TokenKind::Keyword(Keyword::Function),
                TokenKind::DotDotDot,
                TokenKind::Ident("rest".into()),
                TokenKind::Eof,
            ]
        );
    }
}
