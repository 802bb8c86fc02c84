//! Statement parsing.

use super::{ExprParser, Parser};
use crate::ast::{
    CatchClause, Declarator, ForInit, ForTarget, Stmt, StmtKind, VarDecl, VarKind,
};
use crate::token::{Keyword, TokenKind};
use skyhook_core::SkyhookResult;

/// Statement parser. All methods are associated functions over the shared
/// [`Parser`] state.
pub struct StmtParser;

impl StmtParser {
    /// Parse a single statement.
    pub fn parse(parser: &mut Parser<'_>) -> SkyhookResult<Stmt> {
        let start = parser.start_span();

        match &parser.current().kind {
            TokenKind::LBrace => {
                let body = Self::parse_block_body(parser)?;
                Ok(Stmt::new(StmtKind::Block(body), parser.span_from(start)))
            }
            TokenKind::Semi => {
                parser.advance()?;
                Ok(Stmt::new(StmtKind::Empty, parser.span_from(start)))
            }
            TokenKind::Keyword(Keyword::Var) => Self::parse_var_stmt(parser, VarKind::Var),
            TokenKind::Keyword(Keyword::Let) => Self::parse_var_stmt(parser, VarKind::Let),
            TokenKind::Keyword(Keyword::Const) => Self::parse_var_stmt(parser, VarKind::Const),
            TokenKind::Keyword(Keyword::Function) => {
                parser.advance()?;
                let func = ExprParser::parse_function_tail(parser, false, true)?;
                Ok(Stmt::new(
                    StmtKind::FunctionDecl(Box::new(func)),
                    parser.span_from(start),
                ))
            }
            TokenKind::Keyword(Keyword::Class) => {
                parser.advance()?;
                let class = ExprParser::parse_class_tail(parser, true)?;
                Ok(Stmt::new(
                    StmtKind::ClassDecl(Box::new(class)),
                    parser.span_from(start),
                ))
            }
            TokenKind::Keyword(Keyword::Return) => {
                parser.advance()?;
                // Restricted production: the argument must start on the
                // same line.
                let value = if parser.current().newline_before
                    || parser.current().kind.terminates_statement()
                {
                    None
                } else {
                    Some(Box::new(ExprParser::parse_sequence(parser, true)?))
                };
                parser.expect_semi()?;
                Ok(Stmt::new(StmtKind::Return(value), parser.span_from(start)))
            }
            TokenKind::Keyword(Keyword::If) => Self::parse_if(parser),
            TokenKind::Keyword(Keyword::For) => Self::parse_for(parser),
            TokenKind::Keyword(Keyword::While) => {
                parser.advance()?;
                parser.expect(&TokenKind::LParen, "expected `(` after `while`")?;
                let test = ExprParser::parse_sequence(parser, true)?;
                parser.expect(&TokenKind::RParen, "expected `)`")?;
                let body = Self::parse(parser)?;
                Ok(Stmt::new(
                    StmtKind::While {
                        test: Box::new(test),
                        body: Box::new(body),
                    },
                    parser.span_from(start),
                ))
            }
            TokenKind::Keyword(Keyword::Do) => {
                parser.advance()?;
                let body = Self::parse(parser)?;
                if !parser.match_keyword(Keyword::While)? {
                    return Err(parser.error_at_current("expected `while` after do body"));
                }
                parser.expect(&TokenKind::LParen, "expected `(`")?;
                let test = ExprParser::parse_sequence(parser, true)?;
                parser.expect(&TokenKind::RParen, "expected `)`")?;
                parser.match_token(&TokenKind::Semi)?;
                Ok(Stmt::new(
                    StmtKind::DoWhile {
                        body: Box::new(body),
                        test: Box::new(test),
                    },
                    parser.span_from(start),
                ))
            }
            TokenKind::Keyword(Keyword::Try) => Self::parse_try(parser),
            TokenKind::Keyword(Keyword::Throw) => {
                parser.advance()?;
                if parser.current().newline_before {
                    return Err(parser.error_at_current("expected expression after `throw`"));
                }
                let value = ExprParser::parse_sequence(parser, true)?;
                parser.expect_semi()?;
                Ok(Stmt::new(
                    StmtKind::Throw(Box::new(value)),
                    parser.span_from(start),
                ))
            }
            TokenKind::Keyword(Keyword::Break) => {
                parser.advance()?;
                parser.expect_semi()?;
                Ok(Stmt::new(StmtKind::Break, parser.span_from(start)))
            }
            TokenKind::Keyword(Keyword::Continue) => {
                parser.advance()?;
                parser.expect_semi()?;
                Ok(Stmt::new(StmtKind::Continue, parser.span_from(start)))
            }
            TokenKind::Ident(name) if name == "async" => {
                // `async function` declaration; any other `async` use is an
                // expression statement.
                let mut probe = parser.fork();
                probe.advance()?;
                if probe.check_keyword(Keyword::Function) && !probe.current().newline_before {
                    parser.advance()?; // async
                    parser.advance()?; // function
                    let func = ExprParser::parse_function_tail(parser, true, true)?;
                    return Ok(Stmt::new(
                        StmtKind::FunctionDecl(Box::new(func)),
                        parser.span_from(start),
                    ));
                }
                Self::parse_expr_stmt(parser)
            }
            _ => Self::parse_expr_stmt(parser),
        }
    }

    /// Parse `{ stmts }`, returning the inner statements.
    pub fn parse_block_body(parser: &mut Parser<'_>) -> SkyhookResult<Vec<Stmt>> {
        parser.expect(&TokenKind::LBrace, "expected `{`")?;
        let mut body = Vec::new();
        while !parser.check(&TokenKind::RBrace) && !parser.is_at_end() {
            body.push(Self::parse(parser)?);
        }
        parser.expect(&TokenKind::RBrace, "expected `}`")?;
        Ok(body)
    }

    fn parse_expr_stmt(parser: &mut Parser<'_>) -> SkyhookResult<Stmt> {
        let start = parser.start_span();
        let expr = ExprParser::parse_sequence(parser, true)?;
        parser.expect_semi()?;
        Ok(Stmt::new(
            StmtKind::Expr(Box::new(expr)),
            parser.span_from(start),
        ))
    }

    fn parse_var_stmt(parser: &mut Parser<'_>, kind: VarKind) -> SkyhookResult<Stmt> {
        let start = parser.start_span();
        parser.advance()?; // var/let/const
        let decl = Self::parse_var_decl_body(parser, kind, true)?;
        parser.expect_semi()?;
        Ok(Stmt::new(StmtKind::VarDecl(decl), parser.span_from(start)))
    }

    /// Parse the declarator list after the declaration keyword.
    fn parse_var_decl_body(
        parser: &mut Parser<'_>,
        kind: VarKind,
        allow_in: bool,
    ) -> SkyhookResult<VarDecl> {
        let mut decls = Vec::new();
        loop {
            let start = parser.start_span();
            let pattern = ExprParser::parse_pattern(parser)?;
            let init = if parser.match_token(&TokenKind::Assign)? {
                Some(ExprParser::parse_assign(parser, allow_in)?)
            } else {
                None
            };
            decls.push(Declarator {
                pattern,
                init,
                span: parser.span_from(start),
            });
            if !parser.match_token(&TokenKind::Comma)? {
                break;
            }
        }
        Ok(VarDecl { kind, decls })
    }

    fn parse_if(parser: &mut Parser<'_>) -> SkyhookResult<Stmt> {
        let start = parser.start_span();
        parser.advance()?; // if
        parser.expect(&TokenKind::LParen, "expected `(` after `if`")?;
        let test = ExprParser::parse_sequence(parser, true)?;
        parser.expect(&TokenKind::RParen, "expected `)`")?;
        let consequent = Self::parse(parser)?;
        let alternate = if parser.match_keyword(Keyword::Else)? {
            Some(Box::new(Self::parse(parser)?))
        } else {
            None
        };
        Ok(Stmt::new(
            StmtKind::If {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate,
            },
            parser.span_from(start),
        ))
    }

    fn parse_for(parser: &mut Parser<'_>) -> SkyhookResult<Stmt> {
        let start = parser.start_span();
        parser.advance()?; // for
        parser.expect(&TokenKind::LParen, "expected `(` after `for`")?;

        // Empty initializer.
        if parser.match_token(&TokenKind::Semi)? {
            return Self::parse_for_rest(parser, start, None);
        }

        let decl_kind = match &parser.current().kind {
            TokenKind::Keyword(Keyword::Var) => Some(VarKind::Var),
            TokenKind::Keyword(Keyword::Let) => Some(VarKind::Let),
            TokenKind::Keyword(Keyword::Const) => Some(VarKind::Const),
            _ => None,
        };

        if let Some(kind) = decl_kind {
            parser.advance()?;
            let pattern = ExprParser::parse_pattern(parser)?;

            if parser.match_keyword(Keyword::In)? {
                let right = ExprParser::parse_sequence(parser, true)?;
                parser.expect(&TokenKind::RParen, "expected `)`")?;
                let body = Self::parse(parser)?;
                return Ok(Stmt::new(
                    StmtKind::ForIn {
                        left: ForTarget::Decl(kind, pattern),
                        right: Box::new(right),
                        body: Box::new(body),
                    },
                    parser.span_from(start),
                ));
            }
            if parser.match_ident("of")? {
                let right = ExprParser::parse_assign(parser, true)?;
                parser.expect(&TokenKind::RParen, "expected `)`")?;
                let body = Self::parse(parser)?;
                return Ok(Stmt::new(
                    StmtKind::ForOf {
                        left: ForTarget::Decl(kind, pattern),
                        right: Box::new(right),
                        body: Box::new(body),
                    },
                    parser.span_from(start),
                ));
            }

            // Classic for with declaration initializer: finish the first
            // declarator, then any further ones.
            let first_start = parser.previous().span.start;
            let init = if parser.match_token(&TokenKind::Assign)? {
                Some(ExprParser::parse_assign(parser, false)?)
            } else {
                None
            };
            let mut decls = vec![Declarator {
                pattern,
                init,
                span: parser.span_from(first_start),
            }];
            while parser.match_token(&TokenKind::Comma)? {
                let rest = Self::parse_var_decl_body(parser, kind, false)?;
                decls.extend(rest.decls);
                break;
            }
            parser.expect(&TokenKind::Semi, "expected `;` in for loop")?;
            return Self::parse_for_rest(parser, start, Some(ForInit::Decl(VarDecl { kind, decls })));
        }

        // Expression initializer (or for-in/of over an existing target).
        let expr = ExprParser::parse_sequence(parser, false)?;

        if parser.match_keyword(Keyword::In)? {
            let right = ExprParser::parse_sequence(parser, true)?;
            parser.expect(&TokenKind::RParen, "expected `)`")?;
            let body = Self::parse(parser)?;
            return Ok(Stmt::new(
                StmtKind::ForIn {
                    left: ForTarget::Expr(Box::new(expr)),
                    right: Box::new(right),
                    body: Box::new(body),
                },
                parser.span_from(start),
            ));
        }
        if parser.match_ident("of")? {
            let right = ExprParser::parse_assign(parser, true)?;
            parser.expect(&TokenKind::RParen, "expected `)`")?;
            let body = Self::parse(parser)?;
            return Ok(Stmt::new(
                StmtKind::ForOf {
                    left: ForTarget::Expr(Box::new(expr)),
                    right: Box::new(right),
                    body: Box::new(body),
                },
                parser.span_from(start),
            ));
        }

        parser.expect(&TokenKind::Semi, "expected `;` in for loop")?;
        Self::parse_for_rest(parser, start, Some(ForInit::Expr(Box::new(expr))))
    }

    /// Parse `test ; update ) body` of a classic for loop.
    fn parse_for_rest(
        parser: &mut Parser<'_>,
        start: u32,
        init: Option<ForInit>,
    ) -> SkyhookResult<Stmt> {
        let test = if parser.check(&TokenKind::Semi) {
            None
        } else {
            Some(Box::new(ExprParser::parse_sequence(parser, true)?))
        };
        parser.expect(&TokenKind::Semi, "expected `;` in for loop")?;

        let update = if parser.check(&TokenKind::RParen) {
            None
        } else {
            Some(Box::new(ExprParser::parse_sequence(parser, true)?))
        };
        parser.expect(&TokenKind::RParen, "expected `)`")?;

        let body = Self::parse(parser)?;
        Ok(Stmt::new(
            StmtKind::For {
                init,
                test,
                update,
                body: Box::new(body),
            },
            parser.span_from(start),
        ))
    }

    fn parse_try(parser: &mut Parser<'_>) -> SkyhookResult<Stmt> {
        let start = parser.start_span();
        parser.advance()?; // try
        let block = Self::parse_block_body(parser)?;

        let handler = if parser.match_keyword(Keyword::Catch)? {
            let catch_start = parser.previous().span.start;
            let param = if parser.match_token(&TokenKind::LParen)? {
                let pattern = ExprParser::parse_pattern(parser)?;
                parser.expect(&TokenKind::RParen, "expected `)` after catch parameter")?;
                Some(pattern)
            } else {
                None
            };
            let body = Self::parse_block_body(parser)?;
            Some(CatchClause {
                param,
                body,
                span: parser.span_from(catch_start),
            })
        } else {
            None
        };

        let finalizer = if parser.match_keyword(Keyword::Finally)? {
            Some(Self::parse_block_body(parser)?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(parser.error_at_current("expected `catch` or `finally` after try block"));
        }

        Ok(Stmt::new(
            StmtKind::Try {
                block,
                handler,
                finalizer,
            },
            parser.span_from(start),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprKind, Pattern};
    use crate::parser::parse;

    #[test]
    fn test_var_declarations() {
        let program = parse("var a; let b = 1; const {c, d} = o;").unwrap();
        assert_eq!(program.body.len(), 3);
        let StmtKind::VarDecl(decl) = &program.body[2].kind else {
            panic!("expected var decl");
        };
        assert_eq!(decl.kind, VarKind::Const);
        assert!(matches!(decl.decls[0].pattern, Pattern::Object { .. }));
    }

    #[test]
    fn test_function_declaration() {
        let program = parse("function add(a, b) { return a + b; }").unwrap();
        let StmtKind::FunctionDecl(func) = &program.body[0].kind else {
            panic!("expected function decl");
        };
        assert_eq!(func.name.as_deref(), Some("add"));
        assert_eq!(func.params.len(), 2);
    }

    #[test]
    fn test_async_function_declaration() {
        let program = parse("async function go() { await x; }").unwrap();
        let StmtKind::FunctionDecl(func) = &program.body[0].kind else {
            panic!("expected function decl");
        };
        assert!(func.is_async);
    }

    #[test]
    fn test_if_else_chain() {
        let program = parse("if (a) b; else if (c) d; else e;").unwrap();
        let StmtKind::If { alternate, .. } = &program.body[0].kind else {
            panic!("expected if");
        };
        assert!(matches!(
            alternate.as_deref().map(|s| &s.kind),
            Some(StmtKind::If { .. })
        ));
    }

    #[test]
    fn test_for_classic() {
        let program = parse("for (let i = 0; i < 10; i++) { work(i); }").unwrap();
        let StmtKind::For { init, test, update, .. } = &program.body[0].kind else {
            panic!("expected for");
        };
        assert!(matches!(init, Some(ForInit::Decl(_))));
        assert!(test.is_some());
        assert!(update.is_some());
    }

    #[test]
    fn test_for_in_and_of() {
        let program = parse("for (const k in o) f(k);\nfor (const v of xs) g(v);").unwrap();
        assert!(matches!(program.body[0].kind, StmtKind::ForIn { .. }));
        assert!(matches!(program.body[1].kind, StmtKind::ForOf { .. }));
    }

    #[test]
    fn test_for_in_over_existing_binding() {
        let program = parse("for (k in o) f(k);").unwrap();
        let StmtKind::ForIn { left, .. } = &program.body[0].kind else {
            panic!("expected for-in");
        };
        assert!(matches!(left, ForTarget::Expr(_)));
    }

    #[test]
    fn test_try_catch_finally() {
        let program = parse("try { f(); } catch (e) { g(e); } finally { h(); }").unwrap();
        let StmtKind::Try { handler, finalizer, .. } = &program.body[0].kind else {
            panic!("expected try");
        };
        assert!(handler.is_some());
        assert!(finalizer.is_some());
    }

    #[test]
    fn test_catch_without_binding() {
        let program = parse("try { f(); } catch { g(); }").unwrap();
        let StmtKind::Try { handler, .. } = &program.body[0].kind else {
            panic!("expected try");
        };
        assert!(handler.as_ref().unwrap().param.is_none());
    }

    #[test]
    fn test_bare_try_rejected() {
        assert!(parse("try { f(); }").is_err());
    }

    #[test]
    fn test_class_declaration() {
        let program = parse("class A { constructor(x) { this.x = x; } get() { return this.x; } }")
            .unwrap();
        let StmtKind::ClassDecl(class) = &program.body[0].kind else {
            panic!("expected class decl");
        };
        assert_eq!(class.name.as_deref(), Some("A"));
        assert_eq!(class.members.len(), 2);
    }

    #[test]
    fn test_expression_statement_sequence() {
        let program = parse("a = 1, b = 2;").unwrap();
        let StmtKind::Expr(expr) = &program.body[0].kind else {
            panic!("expected expression statement");
        };
        assert!(matches!(expr.kind, ExprKind::Sequence(_)));
    }
}
