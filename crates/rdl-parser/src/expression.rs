//! Token stream to AST
//!
//! The grammar keeps the scan-order reduction of report expressions:
//!
//! ```text
//! expression := logical
//! logical    := not_expr ( LOGICAL not_expr )*
//! not_expr   := "Not" not_expr | chain
//! chain      := unary ( (ARITHMETIC | COMPARISON) unary )*
//! unary      := "-" unary | "+" unary | primary
//! ```
//!
//! Arithmetic and comparison share one left fold, so `3+4*2` is `(3+4)*2`.
//! Each fold is kept as one flat [`ChainExpr`]. Prefix operators count
//! toward the nesting bound like groups and calls do.

use rdl_ast::{
    AggregateExpr, BoxExpr, BuiltinFunction, CallExpr, ChainExpr, ConditionalExpr, Expression,
    FunctionCategory, Literal, Spanned, UnaryOp, UnaryOpExpr,
};
use rdl_diagnostics::{RdlError, Result, Span, RDL0001, RDL0002, RDL0006};
use smallvec::SmallVec;

use crate::arguments::ArgumentText;
use crate::scanner::{Scanner, Token, TokenKind};

pub(crate) struct ExpressionParser<'a> {
    /// The whole expression, for error messages
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> ExpressionParser<'a> {
    /// Parse `fragment`, which starts at `base` inside `source`
    pub(crate) fn parse_fragment(
        source: &'a str,
        fragment: &str,
        base: usize,
        depth: usize,
        max_depth: usize,
    ) -> Result<Spanned<Expression>> {
        if depth > max_depth {
            return Err(RdlError::parse_at(
                RDL0006,
                format!("Expression nesting exceeds {} levels", max_depth),
                source,
                Span::new(base, base + fragment.len()),
            ));
        }

        let tokens = Scanner::nested(fragment, base).scan();
        let mut parser = ExpressionParser {
            source,
            tokens,
            pos: 0,
            depth,
            max_depth,
        };

        let expr = parser.logical()?;
        if let Some(token) = parser.peek() {
            return Err(RdlError::parse_at(
                RDL0001,
                format!("Unexpected {:?}", token.kind),
                source,
                token.span,
            ));
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn end_span(&self) -> Span {
        Span::point(self.source.len())
    }

    fn unexpected_end(&self) -> RdlError {
        RdlError::parse_at(
            RDL0002,
            "Expected an operand",
            self.source,
            self.end_span(),
        )
    }

    fn logical(&mut self) -> Result<Spanned<Expression>> {
        let first = self.not_expr()?;
        self.fold(first, |op| op.is_logical(), Self::not_expr)
    }

    fn not_expr(&mut self) -> Result<Spanned<Expression>> {
        if let Some(Token {
            kind: TokenKind::Not,
            span,
        }) = self.peek().cloned()
        {
            self.pos += 1;
            return self.prefixed(UnaryOp::Not, span, Self::not_expr);
        }
        self.chain()
    }

    fn chain(&mut self) -> Result<Spanned<Expression>> {
        let first = self.unary()?;
        self.fold(
            first,
            |op| op.is_arithmetic() || op.is_comparison(),
            Self::unary,
        )
    }

    /// Collect `first (op operand)*` into one flat chain
    fn fold(
        &mut self,
        first: Spanned<Expression>,
        accept: impl Fn(&rdl_ast::BinaryOp) -> bool,
        operand: fn(&mut Self) -> Result<Spanned<Expression>>,
    ) -> Result<Spanned<Expression>> {
        let Some(op) = self.peek_operator(&accept) else {
            return Ok(first);
        };

        let mut span = first.span;
        let mut chain = ChainExpr::new(Box::new(first));
        let mut next = Some(op);
        while let Some(op) = next {
            self.pos += 1;
            let right = operand(self)?;
            span = span.merge(right.span);
            chain.push(op, Box::new(right));
            next = self.peek_operator(&accept);
        }
        Ok(Spanned::new(Expression::Chain(chain), span))
    }

    fn peek_operator(&self, accept: impl Fn(&rdl_ast::BinaryOp) -> bool) -> Option<rdl_ast::BinaryOp> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Operator(op),
                ..
            }) if accept(op) => Some(*op),
            _ => None,
        }
    }

    fn unary(&mut self) -> Result<Spanned<Expression>> {
        let sign = match self.peek() {
            Some(Token {
                kind: TokenKind::Operator(rdl_ast::BinaryOp::Subtract),
                span,
            }) => Some((UnaryOp::Negate, *span)),
            Some(Token {
                kind: TokenKind::Operator(rdl_ast::BinaryOp::Add),
                span,
            }) => Some((UnaryOp::Plus, *span)),
            _ => None,
        };

        if let Some((op, span)) = sign {
            self.pos += 1;
            return self.prefixed(op, span, Self::unary);
        }

        self.primary()
    }

    /// Parse the operand of a prefix operator one level deeper
    fn prefixed(
        &mut self,
        op: UnaryOp,
        span: Span,
        operand: fn(&mut Self) -> Result<Spanned<Expression>>,
    ) -> Result<Spanned<Expression>> {
        if self.depth >= self.max_depth {
            return Err(RdlError::parse_at(
                RDL0006,
                format!("Expression nesting exceeds {} levels", self.max_depth),
                self.source,
                span,
            ));
        }

        self.depth += 1;
        let operand = operand(self);
        self.depth -= 1;

        let operand = operand?;
        let span = span.merge(operand.span);
        Ok(Spanned::new(
            Expression::UnaryOp(UnaryOpExpr {
                op,
                operand: Box::new(operand),
            }),
            span,
        ))
    }

    fn primary(&mut self) -> Result<Spanned<Expression>> {
        let Some(token) = self.advance() else {
            return Err(self.unexpected_end());
        };
        let span = token.span;

        let expr = match token.kind {
            TokenKind::Literal(lit) => Expression::Literal(lit),
            TokenKind::Remainder(Literal::String(text)) => Expression::Text(text),
            TokenKind::Remainder(lit) => Expression::Literal(lit),
            TokenKind::Global(g) => Expression::Global(g),
            TokenKind::Field(f) => Expression::Field(f),
            TokenKind::Parameter(p) => Expression::Parameter(p),
            TokenKind::Group(inner) => {
                let expr = self.nested(&inner)?;
                return Ok(Spanned::new(expr.inner, span));
            }
            TokenKind::Call {
                function,
                arguments,
            } => self.call(function, &arguments, span)?,
            TokenKind::MalformedCall { function, text } => Expression::unresolved(
                format!("{}({}", function.name(), text),
                "unbalanced parentheses",
            ),
            TokenKind::Operator(op) => {
                return Err(RdlError::parse_at(
                    RDL0001,
                    format!("Unexpected operator '{}'", op.symbol()),
                    self.source,
                    span,
                ));
            }
            TokenKind::Not => {
                return Err(RdlError::parse_at(
                    RDL0001,
                    "Unexpected 'Not'",
                    self.source,
                    span,
                ));
            }
        };

        Ok(Spanned::new(expr, span))
    }

    fn nested(&self, arg: &ArgumentText) -> Result<Spanned<Expression>> {
        Self::parse_fragment(self.source, &arg.text, arg.offset, self.depth + 1, self.max_depth)
    }

    /// Build a call node. A malformed argument or a wrong argument count
    /// leaves the whole call unresolved; only nesting overflow propagates.
    fn call(
        &self,
        function: BuiltinFunction,
        arguments: &[ArgumentText],
        span: Span,
    ) -> Result<Expression> {
        let call_text = || span.slice(self.source).unwrap_or(function.name()).to_string();

        if !function.accepts_arguments(arguments.len()) {
            return Ok(Expression::unresolved(
                call_text(),
                format!(
                    "{} does not accept {} argument(s)",
                    function.name(),
                    arguments.len()
                ),
            ));
        }

        let mut parsed: SmallVec<[BoxExpr; 4]> = SmallVec::new();
        for arg in arguments {
            match self.nested(arg) {
                Ok(expr) => parsed.push(Box::new(expr)),
                Err(err) if err.code() == RDL0006 => return Err(err),
                Err(err) => {
                    return Ok(Expression::unresolved(
                        call_text(),
                        format!("argument '{}': {}", arg.text, err),
                    ));
                }
            }
        }

        if function.category() == FunctionCategory::Aggregate {
            return Ok(aggregate(function, parsed));
        }

        if function == BuiltinFunction::IIf {
            let mut args = parsed.into_iter();
            if let (Some(condition), Some(then_branch), Some(else_branch)) =
                (args.next(), args.next(), args.next())
            {
                return Ok(Expression::Conditional(ConditionalExpr {
                    condition,
                    then_branch,
                    else_branch,
                }));
            }
            return Ok(Expression::unresolved(call_text(), "IIf needs three arguments"));
        }

        Ok(Expression::Call(CallExpr {
            function,
            args: parsed,
        }))
    }
}

/// Split aggregate arguments into the per-row expression and the optional
/// quoted dataset scope in the last position.
fn aggregate(function: BuiltinFunction, mut args: SmallVec<[BoxExpr; 4]>) -> Expression {
    let takes_argument = function.arity().min > 0;
    let scope_position = usize::from(takes_argument);

    let scope = if args.len() > scope_position {
        match args.pop().map(|arg| arg.inner) {
            Some(Expression::Literal(Literal::String(name))) => Some(name),
            _ => None,
        }
    } else {
        None
    };

    let argument = if takes_argument {
        args.into_iter().next()
    } else {
        None
    };

    Expression::Aggregate(AggregateExpr {
        function,
        argument,
        scope,
    })
}
