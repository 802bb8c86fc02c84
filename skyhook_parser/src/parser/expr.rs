//! Pratt expression parsing.

use super::Parser;
use crate::ast::{
    Arg, Arrow, ArrowBody, ArrayItem, AssignOp, BinaryOp, Class, ClassMember, Expr, ExprKind,
    Function, LogicalOp, MemberProp, MethodKind, ObjectPatProp, ObjectProp, Pattern, PropKey,
    UnaryOp, UpdateOp,
};
use crate::token::{Keyword, TemplateRaw, TokenKind};
use skyhook_core::SkyhookResult;

/// Expression parser. All methods are associated functions over the shared
/// [`Parser`] state.
pub struct ExprParser;

// Binding powers for the binary/logical operator ladder. Higher binds
// tighter; exponentiation is right-associative.
const PREC_COALESCE: u8 = 1;
const PREC_OR: u8 = 2;
const PREC_AND: u8 = 3;
const PREC_BIT_OR: u8 = 4;
const PREC_BIT_XOR: u8 = 5;
const PREC_BIT_AND: u8 = 6;
const PREC_EQUALITY: u8 = 7;
const PREC_RELATIONAL: u8 = 8;
const PREC_SHIFT: u8 = 9;
const PREC_ADDITIVE: u8 = 10;
const PREC_MULTIPLICATIVE: u8 = 11;
const PREC_EXPONENT: u8 = 12;

/// A binary-ladder operator: either strict binary or short-circuit logical.
enum LadderOp {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

/// Map the current token to a ladder operator and its binding power.
fn ladder_op(kind: &TokenKind, allow_in: bool) -> Option<(u8, LadderOp)> {
    Some(match kind {
        TokenKind::QuestionQuestion => (PREC_COALESCE, LadderOp::Logical(LogicalOp::Coalesce)),
        TokenKind::PipePipe => (PREC_OR, LadderOp::Logical(LogicalOp::Or)),
        TokenKind::AmpAmp => (PREC_AND, LadderOp::Logical(LogicalOp::And)),
        TokenKind::Pipe => (PREC_BIT_OR, LadderOp::Binary(BinaryOp::BitOr)),
        TokenKind::Caret => (PREC_BIT_XOR, LadderOp::Binary(BinaryOp::BitXor)),
        TokenKind::Amp => (PREC_BIT_AND, LadderOp::Binary(BinaryOp::BitAnd)),
        TokenKind::EqEq => (PREC_EQUALITY, LadderOp::Binary(BinaryOp::Eq)),
        TokenKind::NotEq => (PREC_EQUALITY, LadderOp::Binary(BinaryOp::NotEq)),
        TokenKind::EqEqEq => (PREC_EQUALITY, LadderOp::Binary(BinaryOp::StrictEq)),
        TokenKind::NotEqEq => (PREC_EQUALITY, LadderOp::Binary(BinaryOp::StrictNotEq)),
        TokenKind::Lt => (PREC_RELATIONAL, LadderOp::Binary(BinaryOp::Lt)),
        TokenKind::LtEq => (PREC_RELATIONAL, LadderOp::Binary(BinaryOp::LtEq)),
        TokenKind::Gt => (PREC_RELATIONAL, LadderOp::Binary(BinaryOp::Gt)),
        TokenKind::GtEq => (PREC_RELATIONAL, LadderOp::Binary(BinaryOp::GtEq)),
        TokenKind::Keyword(Keyword::Instanceof) => {
            (PREC_RELATIONAL, LadderOp::Binary(BinaryOp::Instanceof))
        }
        TokenKind::Keyword(Keyword::In) if allow_in => {
            (PREC_RELATIONAL, LadderOp::Binary(BinaryOp::In))
        }
        TokenKind::Shl => (PREC_SHIFT, LadderOp::Binary(BinaryOp::Shl)),
        TokenKind::Shr => (PREC_SHIFT, LadderOp::Binary(BinaryOp::Shr)),
        TokenKind::UShr => (PREC_SHIFT, LadderOp::Binary(BinaryOp::UShr)),
        TokenKind::Plus => (PREC_ADDITIVE, LadderOp::Binary(BinaryOp::Add)),
        TokenKind::Minus => (PREC_ADDITIVE, LadderOp::Binary(BinaryOp::Sub)),
        TokenKind::Star => (PREC_MULTIPLICATIVE, LadderOp::Binary(BinaryOp::Mul)),
        TokenKind::Slash => (PREC_MULTIPLICATIVE, LadderOp::Binary(BinaryOp::Div)),
        TokenKind::Percent => (PREC_MULTIPLICATIVE, LadderOp::Binary(BinaryOp::Mod)),
        TokenKind::StarStar => (PREC_EXPONENT, LadderOp::Binary(BinaryOp::Exp)),
        _ => return None,
    })
}

/// Map the current token to an assignment operator.
fn assign_op(kind: &TokenKind) -> Option<AssignOp> {
    Some(match kind {
        TokenKind::Assign => AssignOp::Assign,
        TokenKind::PlusEq => AssignOp::Add,
        TokenKind::MinusEq => AssignOp::Sub,
        TokenKind::StarEq => AssignOp::Mul,
        TokenKind::SlashEq => AssignOp::Div,
        TokenKind::PercentEq => AssignOp::Mod,
        TokenKind::StarStarEq => AssignOp::Exp,
        TokenKind::ShlEq => AssignOp::Shl,
        TokenKind::ShrEq => AssignOp::Shr,
        TokenKind::UShrEq => AssignOp::UShr,
        TokenKind::AmpEq => AssignOp::BitAnd,
        TokenKind::PipeEq => AssignOp::BitOr,
        TokenKind::CaretEq => AssignOp::BitXor,
        _ => None?,
    })
}

impl ExprParser {
    // =========================================================================
    // Assignment Level
    // =========================================================================

    /// Parse an assignment-level expression. `allow_in` is false only inside
    /// the initializer slot of a classic for loop.
    pub fn parse_assign(parser: &mut Parser<'_>, allow_in: bool) -> SkyhookResult<Expr> {
        let start = parser.start_span();

        if parser.check_keyword(Keyword::Yield) {
            return Self::parse_yield(parser);
        }

        // Arrow functions need lookahead: `x =>`, `(a, b) =>`, and the
        // async-prefixed forms are decided before ordinary expression
        // parsing ever begins.
        if Self::arrow_ahead(parser)? {
            return Self::parse_arrow(parser, false);
        }
        if Self::async_arrow_ahead(parser)? {
            parser.advance()?; // async
            return Self::parse_arrow(parser, true);
        }

        let expr = Self::parse_conditional(parser, allow_in)?;

        if let Some(op) = assign_op(&parser.current().kind) {
            Self::check_assign_target(parser, &expr)?;
            parser.advance()?;
            let value = Self::parse_assign(parser, allow_in)?;
            return Ok(Expr::new(
                ExprKind::Assign {
                    op,
                    target: Box::new(expr),
                    value: Box::new(value),
                },
                parser.span_from(start),
            ));
        }

        Ok(expr)
    }

    /// Parse a comma sequence (`a, b, c`).
    pub fn parse_sequence(parser: &mut Parser<'_>, allow_in: bool) -> SkyhookResult<Expr> {
        let start = parser.start_span();
        let first = Self::parse_assign(parser, allow_in)?;
        if !parser.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut exprs = vec![first];
        while parser.match_token(&TokenKind::Comma)? {
            exprs.push(Self::parse_assign(parser, allow_in)?);
        }
        Ok(Expr::new(ExprKind::Sequence(exprs), parser.span_from(start)))
    }

    fn parse_yield(parser: &mut Parser<'_>) -> SkyhookResult<Expr> {
        let start = parser.start_span();
        parser.advance()?; // yield
        let delegate = parser.match_token(&TokenKind::Star)?;
        let argument = if parser.current().newline_before
            || parser.current().kind.terminates_statement()
            || parser.check(&TokenKind::RParen)
            || parser.check(&TokenKind::RBracket)
            || parser.check(&TokenKind::Comma)
            || parser.check(&TokenKind::Colon)
        {
            None
        } else {
            Some(Box::new(Self::parse_assign(parser, true)?))
        };
        Ok(Expr::new(
            ExprKind::Yield { argument, delegate },
            parser.span_from(start),
        ))
    }

    /// Reject assignment targets that could never be assigned to.
    fn check_assign_target(parser: &Parser<'_>, target: &Expr) -> SkyhookResult<()> {
        match &target.kind {
            ExprKind::Ident(_)
            | ExprKind::Member { .. }
            | ExprKind::Array(_)
            | ExprKind::Object(_) => Ok(()),
            _ => Err(parser.error_at_current("invalid assignment target")),
        }
    }

    // =========================================================================
    // Conditional and Binary Ladder
    // =========================================================================

    fn parse_conditional(parser: &mut Parser<'_>, allow_in: bool) -> SkyhookResult<Expr> {
        let start = parser.start_span();
        let test = Self::parse_binary(parser, 0, allow_in)?;
        if !parser.match_token(&TokenKind::Question)? {
            return Ok(test);
        }
        let consequent = Self::parse_assign(parser, true)?;
        parser.expect(&TokenKind::Colon, "expected `:` in conditional")?;
        let alternate = Self::parse_assign(parser, allow_in)?;
        Ok(Expr::new(
            ExprKind::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            parser.span_from(start),
        ))
    }

    fn parse_binary(
        parser: &mut Parser<'_>,
        min_bp: u8,
        allow_in: bool,
    ) -> SkyhookResult<Expr> {
        let start = parser.start_span();
        let mut left = Self::parse_unary(parser)?;

        while let Some((bp, op)) = ladder_op(&parser.current().kind, allow_in) {
            if bp < min_bp {
                break;
            }
            parser.advance()?;
            // Exponentiation is right-associative; everything else left.
            let next_bp = if bp == PREC_EXPONENT { bp } else { bp + 1 };
            let right = Self::parse_binary(parser, next_bp, allow_in)?;
            let kind = match op {
                LadderOp::Binary(op) => ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                LadderOp::Logical(op) => ExprKind::Logical {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            };
            left = Expr::new(kind, parser.span_from(start));
        }

        Ok(left)
    }

    // =========================================================================
    // Unary, Update, Postfix
    // =========================================================================

    fn parse_unary(parser: &mut Parser<'_>) -> SkyhookResult<Expr> {
        let start = parser.start_span();

        let unary = match &parser.current().kind {
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Keyword(Keyword::Typeof) => Some(UnaryOp::Typeof),
            TokenKind::Keyword(Keyword::Void) => Some(UnaryOp::Void),
            TokenKind::Keyword(Keyword::Delete) => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = unary {
            parser.advance()?;
            let operand = Self::parse_unary(parser)?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                parser.span_from(start),
            ));
        }

        let update = match &parser.current().kind {
            TokenKind::PlusPlus => Some(UpdateOp::Inc),
            TokenKind::MinusMinus => Some(UpdateOp::Dec),
            _ => None,
        };
        if let Some(op) = update {
            parser.advance()?;
            let operand = Self::parse_unary(parser)?;
            return Ok(Expr::new(
                ExprKind::Update {
                    op,
                    prefix: true,
                    operand: Box::new(operand),
                },
                parser.span_from(start),
            ));
        }

        if parser.check_keyword(Keyword::Await) {
            parser.advance()?;
            let operand = Self::parse_unary(parser)?;
            return Ok(Expr::new(
                ExprKind::Await(Box::new(operand)),
                parser.span_from(start),
            ));
        }

        let mut expr = Self::parse_lhs(parser)?;

        // Postfix update: no line terminator allowed before the operator.
        if !parser.current().newline_before {
            let op = match &parser.current().kind {
                TokenKind::PlusPlus => Some(UpdateOp::Inc),
                TokenKind::MinusMinus => Some(UpdateOp::Dec),
                _ => None,
            };
            if let Some(op) = op {
                parser.advance()?;
                expr = Expr::new(
                    ExprKind::Update {
                        op,
                        prefix: false,
                        operand: Box::new(expr),
                    },
                    parser.span_from(start),
                );
            }
        }

        Ok(expr)
    }

    /// Parse a left-hand-side expression: primary plus call/member chain
    /// (also used for class heritage clauses).
    pub(crate) fn parse_lhs(parser: &mut Parser<'_>) -> SkyhookResult<Expr> {
        let base = if parser.check_keyword(Keyword::New) {
            Self::parse_new(parser)?
        } else {
            Self::parse_primary(parser)?
        };
        Self::parse_call_member(parser, base, true)
    }

    fn parse_new(parser: &mut Parser<'_>) -> SkyhookResult<Expr> {
        let start = parser.start_span();
        parser.advance()?; // new
        let callee = if parser.check_keyword(Keyword::New) {
            Self::parse_new(parser)?
        } else {
            let primary = Self::parse_primary(parser)?;
            Self::parse_call_member(parser, primary, false)?
        };
        let args = if parser.check(&TokenKind::LParen) {
            Self::parse_args(parser)?
        } else {
            Vec::new()
        };
        Ok(Expr::new(
            ExprKind::New {
                callee: Box::new(callee),
                args,
            },
            parser.span_from(start),
        ))
    }

    /// Extend `base` with `.name`, `[expr]` and (when `allow_call`) `(args)`.
    fn parse_call_member(
        parser: &mut Parser<'_>,
        mut base: Expr,
        allow_call: bool,
    ) -> SkyhookResult<Expr> {
        let start = base.span.start;
        loop {
            if parser.match_token(&TokenKind::Dot)? {
                let name = Self::parse_property_name(parser)?;
                base = Expr::new(
                    ExprKind::Member {
                        object: Box::new(base),
                        property: MemberProp::Ident(name),
                    },
                    parser.span_from(start),
                );
            } else if parser.match_token(&TokenKind::LBracket)? {
                let index = Self::parse_sequence(parser, true)?;
                parser.expect(&TokenKind::RBracket, "expected `]`")?;
                base = Expr::new(
                    ExprKind::Member {
                        object: Box::new(base),
                        property: MemberProp::Computed(Box::new(index)),
                    },
                    parser.span_from(start),
                );
            } else if allow_call && parser.check(&TokenKind::LParen) {
                let args = Self::parse_args(parser)?;
                base = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(base),
                        args,
                    },
                    parser.span_from(start),
                );
            } else if parser.check(&TokenKind::Template(TemplateRaw {
                quasis: Vec::new(),
                exprs: Vec::new(),
            })) {
                return Err(parser.error_at_current("tagged templates are not supported"));
            } else {
                return Ok(base);
            }
        }
    }

    /// A property name after `.`; keywords are allowed there.
    fn parse_property_name(parser: &mut Parser<'_>) -> SkyhookResult<String> {
        match &parser.current().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                parser.advance()?;
                Ok(name)
            }
            TokenKind::Keyword(kw) => {
                let name = kw.to_string();
                parser.advance()?;
                Ok(name)
            }
            _ => Err(parser.error_at_current("expected property name")),
        }
    }

    /// Parse a parenthesized argument list.
    fn parse_args(parser: &mut Parser<'_>) -> SkyhookResult<Vec<Arg>> {
        parser.expect(&TokenKind::LParen, "expected `(`")?;
        let mut args = Vec::new();
        while !parser.check(&TokenKind::RParen) {
            if parser.match_token(&TokenKind::DotDotDot)? {
                args.push(Arg::Spread(Self::parse_assign(parser, true)?));
            } else {
                args.push(Arg::Expr(Self::parse_assign(parser, true)?));
            }
            if !parser.match_token(&TokenKind::Comma)? {
                break;
            }
        }
        parser.expect(&TokenKind::RParen, "expected `)`")?;
        Ok(args)
    }

    // =========================================================================
    // Primary Expressions
    // =========================================================================

    fn parse_primary(parser: &mut Parser<'_>) -> SkyhookResult<Expr> {
        let start = parser.start_span();
        let kind = match &parser.current().kind {
            TokenKind::Number(n) => {
                let n = *n;
                parser.advance()?;
                ExprKind::Number(n)
            }
            TokenKind::BigInt(digits) => {
                let digits = digits.clone();
                parser.advance()?;
                ExprKind::BigInt(digits)
            }
            TokenKind::String(s) => {
                let s = s.clone();
                parser.advance()?;
                ExprKind::String(s)
            }
            TokenKind::Template(raw) => {
                let raw = raw.clone();
                parser.advance()?;
                Self::build_template(parser, raw)?
            }
            TokenKind::Keyword(Keyword::True) => {
                parser.advance()?;
                ExprKind::Bool(true)
            }
            TokenKind::Keyword(Keyword::False) => {
                parser.advance()?;
                ExprKind::Bool(false)
            }
            TokenKind::Keyword(Keyword::Null) => {
                parser.advance()?;
                ExprKind::Null
            }
            TokenKind::Keyword(Keyword::This) => {
                parser.advance()?;
                ExprKind::This
            }
            TokenKind::Keyword(Keyword::Super) => {
                parser.advance()?;
                ExprKind::Super
            }
            TokenKind::Keyword(Keyword::Function) => {
                parser.advance()?;
                let func = Self::parse_function_tail(parser, false, false)?;
                ExprKind::Function(Box::new(func))
            }
            TokenKind::Keyword(Keyword::Class) => {
                parser.advance()?;
                let class = Self::parse_class_tail(parser, false)?;
                ExprKind::Class(Box::new(class))
            }
            TokenKind::Ident(name) => {
                // `async function` expression; a bare `async` is an
                // ordinary identifier (async arrows are handled earlier).
                if name == "async" {
                    let mut probe = parser.fork();
                    probe.advance()?;
                    if probe.check_keyword(Keyword::Function) && !probe.current().newline_before {
                        parser.advance()?; // async
                        parser.advance()?; // function
                        let func = Self::parse_function_tail(parser, true, false)?;
                        return Ok(Expr::new(
                            ExprKind::Function(Box::new(func)),
                            parser.span_from(start),
                        ));
                    }
                }
                let name = name.clone();
                parser.advance()?;
                ExprKind::Ident(name)
            }
            TokenKind::LParen => {
                parser.advance()?;
                let expr = Self::parse_sequence(parser, true)?;
                parser.expect(&TokenKind::RParen, "expected `)`")?;
                return Ok(expr);
            }
            TokenKind::LBracket => return Self::parse_array(parser),
            TokenKind::LBrace => return Self::parse_object(parser),
            _ => return Err(parser.error_at_current("expected expression")),
        };
        Ok(Expr::new(kind, parser.span_from(start)))
    }

    /// Re-parse the raw substitution sources of a template literal.
    fn build_template(parser: &Parser<'_>, raw: TemplateRaw) -> SkyhookResult<ExprKind> {
        let mut exprs = Vec::with_capacity(raw.exprs.len());
        for source in &raw.exprs {
            let expr = super::parse_expression(source)
                .map_err(|_| parser.error_at_current("invalid template substitution"))?;
            exprs.push(expr);
        }
        Ok(ExprKind::Template {
            quasis: raw.quasis,
            exprs,
        })
    }

    fn parse_array(parser: &mut Parser<'_>) -> SkyhookResult<Expr> {
        let start = parser.start_span();
        parser.expect(&TokenKind::LBracket, "expected `[`")?;
        let mut items = Vec::new();
        loop {
            if parser.check(&TokenKind::RBracket) {
                break;
            }
            if parser.match_token(&TokenKind::Comma)? {
                items.push(ArrayItem::Hole);
                continue;
            }
            if parser.match_token(&TokenKind::DotDotDot)? {
                items.push(ArrayItem::Spread(Self::parse_assign(parser, true)?));
            } else {
                items.push(ArrayItem::Expr(Self::parse_assign(parser, true)?));
            }
            if !parser.match_token(&TokenKind::Comma)? {
                break;
            }
        }
        parser.expect(&TokenKind::RBracket, "expected `]`")?;
        Ok(Expr::new(ExprKind::Array(items), parser.span_from(start)))
    }

    fn parse_object(parser: &mut Parser<'_>) -> SkyhookResult<Expr> {
        let start = parser.start_span();
        parser.expect(&TokenKind::LBrace, "expected `{`")?;
        let mut props = Vec::new();

        while !parser.check(&TokenKind::RBrace) {
            if parser.match_token(&TokenKind::DotDotDot)? {
                props.push(ObjectProp::Spread(Self::parse_assign(parser, true)?));
            } else {
                props.push(Self::parse_object_prop(parser)?);
            }
            if !parser.match_token(&TokenKind::Comma)? {
                break;
            }
        }

        parser.expect(&TokenKind::RBrace, "expected `}`")?;
        Ok(Expr::new(ExprKind::Object(props), parser.span_from(start)))
    }

    fn parse_object_prop(parser: &mut Parser<'_>) -> SkyhookResult<ObjectProp> {
        // Getter/setter: `get key() {}` where `get` is not itself the key.
        for (word, kind) in [("get", MethodKind::Getter), ("set", MethodKind::Setter)] {
            if parser.check_ident(word) {
                let mut probe = parser.fork();
                probe.advance()?;
                if Self::at_property_key(&probe) {
                    parser.advance()?;
                    let key = Self::parse_prop_key(parser)?;
                    let func = Self::parse_method_body(parser, false, false)?;
                    return Ok(ObjectProp::Method { key, kind, func });
                }
            }
        }

        // Async method: `async key() {}` / `async *key() {}`.
        if parser.check_ident("async") {
            let mut probe = parser.fork();
            probe.advance()?;
            if !probe.current().newline_before
                && (Self::at_property_key(&probe) || probe.check(&TokenKind::Star))
            {
                parser.advance()?;
                let is_generator = parser.match_token(&TokenKind::Star)?;
                let key = Self::parse_prop_key(parser)?;
                let func = Self::parse_method_body(parser, true, is_generator)?;
                return Ok(ObjectProp::Method {
                    key,
                    kind: MethodKind::Method,
                    func,
                });
            }
        }

        // Generator method: `*key() {}`.
        if parser.match_token(&TokenKind::Star)? {
            let key = Self::parse_prop_key(parser)?;
            let func = Self::parse_method_body(parser, false, true)?;
            return Ok(ObjectProp::Method {
                key,
                kind: MethodKind::Method,
                func,
            });
        }

        let key = Self::parse_prop_key(parser)?;

        if parser.check(&TokenKind::LParen) {
            let func = Self::parse_method_body(parser, false, false)?;
            return Ok(ObjectProp::Method {
                key,
                kind: MethodKind::Method,
                func,
            });
        }

        if parser.match_token(&TokenKind::Colon)? {
            let value = Self::parse_assign(parser, true)?;
            return Ok(ObjectProp::KeyValue { key, value });
        }

        // Shorthand: the key must be a plain identifier reference.
        match key {
            PropKey::Ident(name) => Ok(ObjectProp::Shorthand(name)),
            _ => Err(parser.error_at_current("expected `:` after property key")),
        }
    }

    /// Whether the parser sits on something that can open a property key.
    fn at_property_key(parser: &Parser<'_>) -> bool {
        matches!(
            parser.current().kind,
            TokenKind::Ident(_)
                | TokenKind::Keyword(_)
                | TokenKind::String(_)
                | TokenKind::Number(_)
                | TokenKind::LBracket
        )
    }

    /// Parse a property key (identifier, keyword-as-name, string, number,
    /// or computed).
    pub(crate) fn parse_prop_key(parser: &mut Parser<'_>) -> SkyhookResult<PropKey> {
        match &parser.current().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                parser.advance()?;
                Ok(PropKey::Ident(name))
            }
            TokenKind::Keyword(kw) => {
                let name = kw.to_string();
                parser.advance()?;
                Ok(PropKey::Ident(name))
            }
            TokenKind::String(s) => {
                let s = s.clone();
                parser.advance()?;
                Ok(PropKey::String(s))
            }
            TokenKind::Number(n) => {
                let n = *n;
                parser.advance()?;
                Ok(PropKey::Number(n))
            }
            TokenKind::LBracket => {
                parser.advance()?;
                let expr = Self::parse_assign(parser, true)?;
                parser.expect(&TokenKind::RBracket, "expected `]`")?;
                Ok(PropKey::Computed(Box::new(expr)))
            }
            _ => Err(parser.error_at_current("expected property key")),
        }
    }

    /// Parse `(params) { body }` after a method key.
    pub(crate) fn parse_method_body(
        parser: &mut Parser<'_>,
        is_async: bool,
        is_generator: bool,
    ) -> SkyhookResult<Function> {
        let start = parser.start_span();
        let params = Self::parse_param_list(parser)?;
        let body = super::StmtParser::parse_block_body(parser)?;
        Ok(Function {
            name: None,
            params,
            body,
            is_async,
            is_generator,
            span: parser.span_from(start),
        })
    }

    // =========================================================================
    // Functions, Classes
    // =========================================================================

    /// Parse the rest of a function after the `function` keyword.
    pub(crate) fn parse_function_tail(
        parser: &mut Parser<'_>,
        is_async: bool,
        require_name: bool,
    ) -> SkyhookResult<Function> {
        let start = parser.previous().span.start;
        let is_generator = parser.match_token(&TokenKind::Star)?;
        let name = if let TokenKind::Ident(name) = &parser.current().kind {
            let name = name.clone();
            parser.advance()?;
            Some(name)
        } else if require_name {
            return Err(parser.error_at_current("expected function name"));
        } else {
            None
        };
        let params = Self::parse_param_list(parser)?;
        let body = super::StmtParser::parse_block_body(parser)?;
        Ok(Function {
            name,
            params,
            body,
            is_async,
            is_generator,
            span: parser.span_from(start),
        })
    }

    /// Parse the rest of a class after the `class` keyword.
    pub(crate) fn parse_class_tail(
        parser: &mut Parser<'_>,
        require_name: bool,
    ) -> SkyhookResult<Class> {
        let start = parser.previous().span.start;
        let name = if let TokenKind::Ident(name) = &parser.current().kind {
            let name = name.clone();
            parser.advance()?;
            Some(name)
        } else if require_name {
            return Err(parser.error_at_current("expected class name"));
        } else {
            None
        };

        let superclass = if parser.match_keyword(Keyword::Extends)? {
            Some(Box::new(Self::parse_lhs(parser)?))
        } else {
            None
        };

        parser.expect(&TokenKind::LBrace, "expected `{` in class body")?;
        let mut members = Vec::new();
        while !parser.check(&TokenKind::RBrace) {
            if parser.match_token(&TokenKind::Semi)? {
                continue;
            }
            members.push(Self::parse_class_member(parser)?);
        }
        parser.expect(&TokenKind::RBrace, "expected `}` after class body")?;

        Ok(Class {
            name,
            superclass,
            members,
            span: parser.span_from(start),
        })
    }

    fn parse_class_member(parser: &mut Parser<'_>) -> SkyhookResult<ClassMember> {
        let start = parser.start_span();

        let mut is_static = false;
        if parser.check_ident("static") {
            let mut probe = parser.fork();
            probe.advance()?;
            if !probe.check(&TokenKind::LParen) {
                parser.advance()?;
                is_static = true;
            }
        }

        let mut kind = MethodKind::Method;
        for (word, accessor) in [("get", MethodKind::Getter), ("set", MethodKind::Setter)] {
            if parser.check_ident(word) {
                let mut probe = parser.fork();
                probe.advance()?;
                if Self::at_property_key(&probe) {
                    parser.advance()?;
                    kind = accessor;
                    break;
                }
            }
        }

        let mut is_async = false;
        if kind == MethodKind::Method && parser.check_ident("async") {
            let mut probe = parser.fork();
            probe.advance()?;
            if !probe.current().newline_before
                && (Self::at_property_key(&probe) || probe.check(&TokenKind::Star))
            {
                parser.advance()?;
                is_async = true;
            }
        }

        let is_generator = kind == MethodKind::Method && parser.match_token(&TokenKind::Star)?;

        let key = Self::parse_prop_key(parser)?;
        if kind == MethodKind::Method
            && !is_static
            && !is_async
            && !is_generator
            && matches!(&key, PropKey::Ident(name) if name == "constructor")
        {
            kind = MethodKind::Constructor;
        }

        let func = Self::parse_method_body(parser, is_async, is_generator)?;
        Ok(ClassMember {
            kind,
            key,
            func,
            is_static,
            span: parser.span_from(start),
        })
    }

    // =========================================================================
    // Arrow Functions
    // =========================================================================

    /// Whether the tokens ahead form an arrow function starting at the
    /// current token (`x =>` or `( … ) =>`).
    fn arrow_ahead(parser: &Parser<'_>) -> SkyhookResult<bool> {
        match &parser.current().kind {
            TokenKind::Ident(_) => {
                let mut probe = parser.fork();
                probe.advance()?;
                Ok(probe.check(&TokenKind::Arrow) && !probe.current().newline_before)
            }
            TokenKind::LParen => Self::paren_closes_into_arrow(parser),
            _ => Ok(false),
        }
    }

    /// Whether the tokens ahead form an async arrow (`async x =>` or
    /// `async ( … ) =>`). No line terminator may follow `async`.
    fn async_arrow_ahead(parser: &Parser<'_>) -> SkyhookResult<bool> {
        if !parser.check_ident("async") {
            return Ok(false);
        }
        let mut probe = parser.fork();
        probe.advance()?;
        if probe.current().newline_before {
            return Ok(false);
        }
        Self::arrow_ahead(&probe)
    }

    /// Speculatively scan past the balanced `( … )` at the current token
    /// and report whether `=>` follows.
    fn paren_closes_into_arrow(parser: &Parser<'_>) -> SkyhookResult<bool> {
        let mut probe = parser.fork();
        probe.advance()?; // (
        let mut depth = 1usize;
        loop {
            match &probe.current().kind {
                TokenKind::Eof => return Ok(false),
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        probe.advance()?;
                        return Ok(
                            probe.check(&TokenKind::Arrow) && !probe.current().newline_before
                        );
                    }
                }
                _ => {}
            }
            probe.advance()?;
        }
    }

    /// Parse an arrow function; the parser sits on the parameter list.
    fn parse_arrow(parser: &mut Parser<'_>, is_async: bool) -> SkyhookResult<Expr> {
        let start = parser.start_span();

        let params = if let TokenKind::Ident(name) = &parser.current().kind {
            let name = name.clone();
            parser.advance()?;
            vec![Pattern::Ident(name)]
        } else {
            Self::parse_param_list(parser)?
        };

        parser.expect(&TokenKind::Arrow, "expected `=>`")?;

        let body = if parser.check(&TokenKind::LBrace) {
            ArrowBody::Block(super::StmtParser::parse_block_body(parser)?)
        } else {
            ArrowBody::Expr(Box::new(Self::parse_assign(parser, true)?))
        };

        Ok(Expr::new(
            ExprKind::Arrow(Box::new(Arrow {
                params,
                body,
                is_async,
                span: parser.span_from(start),
            })),
            parser.span_from(start),
        ))
    }

    // =========================================================================
    // Parameters and Patterns
    // =========================================================================

    /// Parse a parenthesized parameter list.
    pub(crate) fn parse_param_list(parser: &mut Parser<'_>) -> SkyhookResult<Vec<Pattern>> {
        parser.expect(&TokenKind::LParen, "expected `(`")?;
        let mut params = Vec::new();
        while !parser.check(&TokenKind::RParen) {
            if parser.match_token(&TokenKind::DotDotDot)? {
                let inner = Self::parse_pattern(parser)?;
                params.push(Pattern::Rest(Box::new(inner)));
                break;
            }
            params.push(Self::parse_binding_element(parser)?);
            if !parser.match_token(&TokenKind::Comma)? {
                break;
            }
        }
        parser.expect(&TokenKind::RParen, "expected `)` after parameters")?;
        Ok(params)
    }

    /// A pattern with an optional `= default`.
    pub(crate) fn parse_binding_element(parser: &mut Parser<'_>) -> SkyhookResult<Pattern> {
        let pattern = Self::parse_pattern(parser)?;
        if parser.match_token(&TokenKind::Assign)? {
            let default = Self::parse_assign(parser, true)?;
            Ok(Pattern::Assign {
                target: Box::new(pattern),
                default: Box::new(default),
            })
        } else {
            Ok(pattern)
        }
    }

    /// Parse a binding pattern.
    pub(crate) fn parse_pattern(parser: &mut Parser<'_>) -> SkyhookResult<Pattern> {
        match &parser.current().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                parser.advance()?;
                Ok(Pattern::Ident(name))
            }
            TokenKind::LBracket => {
                parser.advance()?;
                let mut elements = Vec::new();
                let mut rest = None;
                loop {
                    if parser.check(&TokenKind::RBracket) {
                        break;
                    }
                    if parser.match_token(&TokenKind::Comma)? {
                        elements.push(None);
                        continue;
                    }
                    if parser.match_token(&TokenKind::DotDotDot)? {
                        rest = Some(Box::new(Self::parse_pattern(parser)?));
                        break;
                    }
                    elements.push(Some(Self::parse_binding_element(parser)?));
                    if !parser.match_token(&TokenKind::Comma)? {
                        break;
                    }
                }
                parser.expect(&TokenKind::RBracket, "expected `]` in pattern")?;
                Ok(Pattern::Array { elements, rest })
            }
            TokenKind::LBrace => {
                parser.advance()?;
                let mut props = Vec::new();
                let mut rest = None;
                while !parser.check(&TokenKind::RBrace) {
                    if parser.match_token(&TokenKind::DotDotDot)? {
                        rest = Some(Box::new(Self::parse_pattern(parser)?));
                        break;
                    }
                    let key = Self::parse_prop_key(parser)?;
                    if parser.match_token(&TokenKind::Colon)? {
                        let value = Self::parse_binding_element(parser)?;
                        props.push(ObjectPatProp::KeyValue { key, value });
                    } else {
                        let PropKey::Ident(name) = key else {
                            return Err(
                                parser.error_at_current("expected `:` after pattern key")
                            );
                        };
                        let default = if parser.match_token(&TokenKind::Assign)? {
                            Some(Self::parse_assign(parser, true)?)
                        } else {
                            None
                        };
                        props.push(ObjectPatProp::Shorthand { name, default });
                    }
                    if !parser.match_token(&TokenKind::Comma)? {
                        break;
                    }
                }
                parser.expect(&TokenKind::RBrace, "expected `}` in pattern")?;
                Ok(Pattern::Object { props, rest })
            }
            _ => Err(parser.error_at_current("expected binding pattern")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;

    #[test]
    fn test_precedence() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        let ExprKind::Binary { op, right, .. } = expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(
            right.kind,
            ExprKind::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn test_exponent_right_associative() {
        let expr = parse_expression("2 ** 3 ** 4").unwrap();
        let ExprKind::Binary { op, right, .. } = expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Exp);
        assert!(matches!(
            right.kind,
            ExprKind::Binary {
                op: BinaryOp::Exp,
                ..
            }
        ));
    }

    #[test]
    fn test_arrow_single_param() {
        let expr = parse_expression("x => x + 1").unwrap();
        let ExprKind::Arrow(arrow) = expr.kind else {
            panic!("expected arrow");
        };
        assert_eq!(arrow.params.len(), 1);
        assert!(matches!(arrow.body, ArrowBody::Expr(_)));
    }

    #[test]
    fn test_arrow_vs_parenthesized() {
        assert!(matches!(
            parse_expression("(a, b) => a").unwrap().kind,
            ExprKind::Arrow(_)
        ));
        assert!(matches!(
            parse_expression("(a)").unwrap().kind,
            ExprKind::Ident(_)
        ));
    }

    #[test]
    fn test_async_arrow_and_async_call() {
        assert!(matches!(
            parse_expression("async x => x").unwrap().kind,
            ExprKind::Arrow(_)
        ));
        assert!(matches!(
            parse_expression("async (1)").unwrap().kind,
            ExprKind::Call { .. }
        ));
    }

    #[test]
    fn test_member_chain_with_keyword_name() {
        let expr = parse_expression("promise.catch(handle)").unwrap();
        assert!(matches!(expr.kind, ExprKind::Call { .. }));
    }

    #[test]
    fn test_object_literal_shapes() {
        let expr = parse_expression("{ a, b: 1, c() {}, get d() {}, ...rest }").unwrap();
        let ExprKind::Object(props) = expr.kind else {
            panic!("expected object");
        };
        assert_eq!(props.len(), 5);
        assert!(matches!(props[0], ObjectProp::Shorthand(_)));
        assert!(matches!(
            props[3],
            ObjectProp::Method {
                kind: MethodKind::Getter,
                ..
            }
        ));
    }

    #[test]
    fn test_array_holes_and_spread() {
        let expr = parse_expression("[1, , 2, ...xs]").unwrap();
        let ExprKind::Array(items) = expr.kind else {
            panic!("expected array");
        };
        assert!(matches!(items[1], ArrayItem::Hole));
        assert!(matches!(items[3], ArrayItem::Spread(_)));
    }

    #[test]
    fn test_new_with_member_callee() {
        let expr = parse_expression("new a.B(1)").unwrap();
        let ExprKind::New { callee, args } = expr.kind else {
            panic!("expected new");
        };
        assert!(matches!(callee.kind, ExprKind::Member { .. }));
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_template_with_substitution() {
        let expr = parse_expression("`a${x + 1}b`").unwrap();
        let ExprKind::Template { quasis, exprs } = expr.kind else {
            panic!("expected template");
        };
        assert_eq!(quasis.len(), 2);
        assert_eq!(exprs.len(), 1);
        assert!(matches!(exprs[0].kind, ExprKind::Binary { .. }));
    }

    #[test]
    fn test_class_expression_members() {
        let expr =
            parse_expression("class A extends B { constructor(x) {} get v() {} static s() {} }")
                .unwrap();
        let ExprKind::Class(class) = expr.kind else {
            panic!("expected class");
        };
        assert!(class.superclass.is_some());
        assert_eq!(class.members.len(), 3);
        assert_eq!(class.members[0].kind, MethodKind::Constructor);
        assert_eq!(class.members[1].kind, MethodKind::Getter);
        assert!(class.members[2].is_static);
    }

    #[test]
    fn test_destructuring_params() {
        let expr = parse_expression("({a, b: [c, d = 1], ...rest}) => c").unwrap();
        let ExprKind::Arrow(arrow) = expr.kind else {
            panic!("expected arrow");
        };
        let mut names = Vec::new();
        arrow.params[0].collect_names(&mut names);
        assert_eq!(names, vec!["a", "c", "d", "rest"]);
    }

    #[test]
    fn test_bound_source_shape() {
        // Engines stringify arrows with implicit returns routinely; make
        // sure a nested arrow chain parses.
        let expr = parse_expression("a => b => a + b").unwrap();
        let ExprKind::Arrow(outer) = expr.kind else {
            panic!("expected arrow");
        };
        let ArrowBody::Expr(inner) = outer.body else {
            panic!("expected expr body");
        };
        assert!(matches!(inner.kind, ExprKind::Arrow(_)));
    }
}
