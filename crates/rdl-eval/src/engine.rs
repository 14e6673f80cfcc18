//! Report Expression Engine
//!
//! [`ReportEngine`] turns expression text into a [`ReportValue`]: the text is
//! parsed once (and cached), then the AST is reduced by a visitor. Operator
//! implementations live in `operators`, built-in functions in `functions`
//! and name resolution in `resolver`; this module only dispatches.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::RwLock;
use rdl_ast::{
    BinaryOp, CallExpr, ChainExpr, Expression, FunctionCategory, Literal, Spanned,
    UnaryOp, UnaryOpExpr,
};
use rdl_diagnostics::{Span, RDL0006};
use rdl_parser::{Parser, ParserOptions};
use rdl_types::{format_value, parse_datetime, to_bool, ReportValue};
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use smallvec::SmallVec;

use crate::context::EvaluationContext;
use crate::error::{EvalError, EvalResult};
use crate::functions;
use crate::operators::{arithmetic, logical};

/// Arguments of a built-in call, already evaluated
pub type Arguments = SmallVec<[ReportValue; 4]>;

type ParsedExpression = Arc<Spanned<Expression>>;

/// Parsed expressions kept before the parse cache is cleared
pub const MAX_CACHED_EXPRESSIONS: usize = 4096;

/// Translated `Like` patterns kept before the pattern cache is cleared
pub const MAX_CACHED_PATTERNS: usize = 256;

/// The report expression engine
///
/// Safe to share between concurrent renders: the parse cache and the `Like`
/// pattern cache sit behind `parking_lot` locks, everything else about an
/// evaluation lives in the [`EvaluationContext`]. Both caches are bounded
/// and start over once full.
pub struct ReportEngine {
    parser: Parser,
    cache: RwLock<HashMap<String, ParsedExpression>>,
    pub(crate) patterns: RwLock<HashMap<String, Arc<Regex>>>,
}

impl Default for ReportEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReportEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportEngine")
            .field("parser", &self.parser)
            .field("cached_expressions", &self.cache.read().len())
            .finish()
    }
}

impl ReportEngine {
    pub fn new() -> Self {
        Self::with_parser(Parser::new())
    }

    pub fn with_options(options: ParserOptions) -> Self {
        Self::with_parser(Parser::with_options(options))
    }

    fn with_parser(parser: Parser) -> Self {
        Self {
            parser,
            cache: RwLock::new(HashMap::new()),
            patterns: RwLock::new(HashMap::new()),
        }
    }

    /// Evaluate expression text. A leading `=` is optional.
    pub fn evaluate(&self, text: &str, ctx: &EvaluationContext<'_>) -> EvalResult<ReportValue> {
        let parsed = self.parse(text)?;
        self.eval(&parsed, ctx)
    }

    /// Evaluate and render as display text, applying a `Format` property to
    /// date and numeric results
    pub fn evaluate_to_string(
        &self,
        text: &str,
        ctx: &EvaluationContext<'_>,
        output_format: &str,
    ) -> EvalResult<String> {
        let value = self.evaluate(text, ctx)?;
        Ok(render_value(&value, output_format))
    }

    /// Parse through the cache.
    ///
    /// Malformed text is cached as an unresolved fragment so it degrades to
    /// Nothing on every evaluation; only excessive nesting is an error.
    pub fn parse(&self, text: &str) -> EvalResult<ParsedExpression> {
        if let Some(parsed) = self.cache.read().get(text) {
            return Ok(Arc::clone(parsed));
        }

        let parsed = match self.parser.parse_expression(text) {
            Ok(expr) => expr,
            Err(err) if err.code() == RDL0006 => return Err(EvalError::RecursionLimit),
            Err(err) => {
                debug!("Unresolved expression '{}': {}", text, err);
                Spanned::new(
                    Expression::unresolved(text, err.to_string()),
                    Span::new(0, text.len()),
                )
            }
        };

        let parsed = Arc::new(parsed);
        let mut cache = self.cache.write();
        if cache.len() >= MAX_CACHED_EXPRESSIONS {
            debug!("Expression cache full ({} entries), clearing", cache.len());
            cache.clear();
        }
        cache.insert(text.to_string(), Arc::clone(&parsed));
        Ok(parsed)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn pattern_cache_len(&self) -> usize {
        self.patterns.read().len()
    }

    pub fn clear_cache(&self) {
        self.cache.write().clear();
        self.patterns.write().clear();
    }

    /// Main expression visitor
    pub fn eval(&self, expr: &Expression, ctx: &EvaluationContext<'_>) -> EvalResult<ReportValue> {
        match expr {
            Expression::Literal(lit) => Ok(eval_literal(lit)),
            Expression::Global(global) => Ok(self.resolve_global(*global, ctx)),
            Expression::Field(field) => self.resolve_field(field, ctx),
            Expression::Parameter(param) => Ok(self.resolve_parameter(param, ctx)),
            Expression::Call(call) => self.eval_call(call, ctx),
            Expression::Aggregate(agg) => self.eval_aggregate(agg, ctx),
            Expression::Conditional(cond) => {
                // VB evaluates both branches of IIf
                let condition = self.eval(&cond.condition, ctx)?;
                let then_value = self.eval(&cond.then_branch, ctx)?;
                let else_value = self.eval(&cond.else_branch, ctx)?;
                Ok(if to_bool(&condition).unwrap_or(false) {
                    then_value
                } else {
                    else_value
                })
            }
            Expression::Chain(chain) => self.eval_chain(chain, ctx),
            Expression::UnaryOp(unary) => self.eval_unary(unary, ctx),
            Expression::Text(text) => Ok(ReportValue::String(text.clone())),
            Expression::Unresolved(fragment) => {
                debug!(
                    "Unresolved fragment '{}' ({}) evaluates to Nothing",
                    fragment.text, fragment.reason
                );
                Ok(ReportValue::Null)
            }
        }
    }

    /// Fold a chain left to right. Every operand is evaluated, the
    /// operands of logical operators included.
    fn eval_chain(&self, chain: &ChainExpr, ctx: &EvaluationContext<'_>) -> EvalResult<ReportValue> {
        let mut acc = self.eval(&chain.first, ctx)?;
        for (op, operand) in &chain.rest {
            let right = self.eval(operand, ctx)?;
            acc = self.apply_binary(*op, &acc, &right);
        }
        Ok(acc)
    }

    fn apply_binary(&self, op: BinaryOp, left: &ReportValue, right: &ReportValue) -> ReportValue {
        let result = if op.is_logical() {
            logical::apply(op, left, right)
        } else if op.is_comparison() {
            self.compare(op, left, right)
        } else {
            arithmetic::apply(op, left, right)
        };
        trace!("fold {:?} {} {:?} -> {:?}", left, op.symbol(), right, result);
        result
    }

    fn eval_unary(&self, expr: &UnaryOpExpr, ctx: &EvaluationContext<'_>) -> EvalResult<ReportValue> {
        let operand = self.eval(&expr.operand, ctx)?;
        Ok(match expr.op {
            UnaryOp::Not => logical::not(&operand),
            UnaryOp::Negate => arithmetic::negate(&operand),
            UnaryOp::Plus => arithmetic::identity(&operand),
        })
    }

    fn eval_call(&self, call: &CallExpr, ctx: &EvaluationContext<'_>) -> EvalResult<ReportValue> {
        let args = call
            .args
            .iter()
            .map(|arg| self.eval(arg, ctx))
            .collect::<EvalResult<Arguments>>()?;

        match call.function.category() {
            FunctionCategory::ProgramFlow => Ok(functions::flow::call(call.function, &args)),
            FunctionCategory::Inspection => Ok(functions::inspection::call(call.function, &args)),
            FunctionCategory::DateTime => Ok(functions::datetime::call(call.function, &args, ctx)),
            FunctionCategory::Text => Ok(functions::text::call(call.function, &args)),
            FunctionCategory::Math => Ok(functions::math::call(call.function, &args)),
            FunctionCategory::Conversion => functions::conversion::call(call.function, &args),
            FunctionCategory::Aggregate => Err(EvalError::internal(format!(
                "aggregate {} reached the call dispatcher",
                call.function.name()
            ))),
        }
    }
}

fn eval_literal(literal: &Literal) -> ReportValue {
    match literal {
        Literal::Nothing => ReportValue::Null,
        Literal::Boolean(b) => ReportValue::Boolean(*b),
        Literal::Integer(i) => ReportValue::Integer(*i),
        // Fractional literals are doubles, as in VB
        Literal::Decimal(d) => d
            .to_f64()
            .map(ReportValue::Double)
            .unwrap_or(ReportValue::Decimal(*d)),
        Literal::String(s) => ReportValue::String(s.clone()),
        Literal::Date(text) => match parse_datetime(text) {
            Some(dt) => ReportValue::DateTime(dt),
            None => {
                debug!("Unparseable date literal #{}#", text);
                ReportValue::Null
            }
        },
    }
}

/// Display text of a value, formatted when the format applies to it
pub fn render_value(value: &ReportValue, output_format: &str) -> String {
    let formattable = value.is_numeric() || matches!(value, ReportValue::DateTime(_));
    if formattable && !output_format.trim().is_empty() {
        format_value(value, output_format)
    } else {
        value.to_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EvaluationEnvironment;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_cache_reuses_entries() {
        let engine = ReportEngine::new();
        let env = EvaluationEnvironment::new();
        let ctx = env.context();
        engine.evaluate("=1 + 1", &ctx).unwrap();
        engine.evaluate("=1 + 1", &ctx).unwrap();
        assert_eq!(engine.cache_len(), 1);
        engine.clear_cache();
        assert_eq!(engine.cache_len(), 0);
    }

    #[test]
    fn test_parse_cache_is_bounded() {
        let engine = ReportEngine::new();
        let env = EvaluationEnvironment::new();
        let ctx = env.context();
        for i in 0..MAX_CACHED_EXPRESSIONS + 10 {
            engine.evaluate(&format!("={} + 1", i), &ctx).unwrap();
            assert!(engine.cache_len() <= MAX_CACHED_EXPRESSIONS);
        }
        assert!(engine.cache_len() > 0);
    }

    #[test]
    fn test_malformed_text_degrades() {
        let engine = ReportEngine::new();
        let env = EvaluationEnvironment::new();
        assert_eq!(engine.evaluate("=1 +", &env.context()), Ok(ReportValue::Null));
    }

    #[test]
    fn test_render_value_formats_numbers_only() {
        assert_eq!(render_value(&ReportValue::Double(1234.5), "N2"), "1,234.50");
        assert_eq!(render_value(&ReportValue::string("abc"), "N2"), "abc");
        assert_eq!(render_value(&ReportValue::Integer(7), ""), "7");
    }
}
