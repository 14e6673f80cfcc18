//! Leftmost-match scanner
//!
//! The scanner walks an expression from left to right. At each position it
//! consults a fixed priority catalog of recognizers and takes the first that
//! matches. Quoted string literals are consumed whole, so nothing inside them
//! is ever matched. When no recognizer matches, literal extraction runs on
//! the remainder and the scan ends.

use rdl_ast::{
    BinaryOp, BuiltinFunction, FieldProperty, FieldRef, FunctionCategory, GlobalVariable, Literal,
    ParameterProperty, ParameterRef,
};
use rdl_diagnostics::Span;
use winnow::error::ContextError;

use crate::arguments::{find_group_end, split_arguments, ArgumentText};
use crate::combinators::{
    any_keyword, any_symbol, bang_path, date_literal, identifier, keyword_literal, number_literal,
    property_suffix, string_literal, ws, Input, PResult,
};

/// Recognizer categories, in the order they are tried at each position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanCategory {
    Global,
    Aggregate,
    Arithmetic,
    Comparison,
    ProgramFlow,
    Inspection,
    Logical,
    Reference,
    Function,
    Group,
    Literal,
}

pub const CATALOG: &[ScanCategory] = &[
    ScanCategory::Global,
    ScanCategory::Aggregate,
    ScanCategory::Arithmetic,
    ScanCategory::Comparison,
    ScanCategory::ProgramFlow,
    ScanCategory::Inspection,
    ScanCategory::Logical,
    ScanCategory::Reference,
    ScanCategory::Function,
    ScanCategory::Group,
    ScanCategory::Literal,
];

const ARITHMETIC_SYMBOLS: &[(&str, BinaryOp)] = &[
    ("+", BinaryOp::Add),
    ("-", BinaryOp::Subtract),
    ("*", BinaryOp::Multiply),
    ("/", BinaryOp::Divide),
    ("&", BinaryOp::Concatenate),
    ("^", BinaryOp::Power),
];

// longest spellings first
const COMPARISON_SYMBOLS: &[(&str, BinaryOp)] = &[
    (">=", BinaryOp::GreaterOrEqual),
    ("<=", BinaryOp::LessOrEqual),
    ("<>", BinaryOp::NotEqual),
    (">", BinaryOp::Greater),
    ("<", BinaryOp::Less),
    ("=", BinaryOp::Equal),
];

const LOGICAL_KEYWORDS: &[(&str, Option<BinaryOp>)] = &[
    ("AndAlso", Some(BinaryOp::AndAlso)),
    ("OrElse", Some(BinaryOp::OrElse)),
    ("And", Some(BinaryOp::And)),
    ("Or", Some(BinaryOp::Or)),
    ("Xor", Some(BinaryOp::Xor)),
    ("Not", None),
];

/// A recognised fragment of expression text
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Global(GlobalVariable),
    /// Built-in call with its raw top-level arguments, parsed later
    Call {
        function: BuiltinFunction,
        arguments: Vec<ArgumentText>,
    },
    /// Built-in call whose parentheses never balance
    MalformedCall {
        function: BuiltinFunction,
        text: String,
    },
    Operator(BinaryOp),
    Not,
    Field(FieldRef),
    Parameter(ParameterRef),
    /// Parenthesised sub-expression
    Group(ArgumentText),
    Literal(Literal),
    /// Literal extracted from text no recognizer matched; ends the scan
    Remainder(Literal),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Scanner over one expression fragment
pub struct Scanner<'s> {
    source: &'s str,
    /// Offset of `source` inside the whole expression
    base: usize,
}

impl<'s> Scanner<'s> {
    pub fn new(source: &'s str) -> Self {
        Self { source, base: 0 }
    }

    /// Scanner for a nested fragment starting at `base` in the whole expression
    pub fn nested(source: &'s str, base: usize) -> Self {
        Self { source, base }
    }

    fn offset(&self, input: &str) -> usize {
        self.base + self.source.len() - input.len()
    }

    /// Scan the whole fragment
    pub fn scan(&self) -> Vec<Token> {
        let mut input: Input<'s> = self.source;
        let mut tokens = Vec::new();

        loop {
            let _ = ws(&mut input);
            if input.is_empty() {
                break;
            }
            let start = self.offset(input);
            match self.recognize(&mut input) {
                Some(kind) => tokens.push(Token {
                    kind,
                    span: Span::new(start, self.offset(input)),
                }),
                None => {
                    tokens.push(Token {
                        kind: TokenKind::Remainder(extract_literal(input)),
                        span: Span::new(start, self.base + self.source.len()),
                    });
                    break;
                }
            }
        }

        tokens
    }

    /// Try every category at the current position, in catalog order
    fn recognize(&self, input: &mut Input<'s>) -> Option<TokenKind> {
        for category in CATALOG {
            let checkpoint = *input;
            match self.recognize_category(*category, input) {
                Ok(kind) => return Some(kind),
                Err(_) => *input = checkpoint,
            }
        }
        None
    }

    fn recognize_category(&self, category: ScanCategory, input: &mut Input<'s>) -> PResult<TokenKind> {
        match category {
            ScanCategory::Global => global(input),
            ScanCategory::Aggregate => self.call(input, FunctionCategory::Aggregate),
            ScanCategory::Arithmetic => arithmetic(input),
            ScanCategory::Comparison => comparison(input),
            ScanCategory::ProgramFlow => self.call(input, FunctionCategory::ProgramFlow),
            ScanCategory::Inspection => self.call(input, FunctionCategory::Inspection),
            ScanCategory::Logical => logical(input),
            ScanCategory::Reference => reference(input),
            ScanCategory::Function => self.any_function(input),
            ScanCategory::Group => self.group(input),
            ScanCategory::Literal => literal_token(input),
        }
    }

    fn any_function(&self, input: &mut Input<'s>) -> PResult<TokenKind> {
        for category in [
            FunctionCategory::DateTime,
            FunctionCategory::Text,
            FunctionCategory::Math,
            FunctionCategory::Conversion,
        ] {
            let checkpoint = *input;
            match self.call(input, category) {
                Ok(kind) => return Ok(kind),
                Err(_) => *input = checkpoint,
            }
        }
        Err(ContextError::new())
    }

    /// `Name(args...)` for a built-in of `category`
    fn call(&self, input: &mut Input<'s>, category: FunctionCategory) -> PResult<TokenKind> {
        let name = identifier(input)?;
        let function = BuiltinFunction::from_name(name)
            .filter(|f| f.category() == category)
            .ok_or_else(ContextError::new)?;

        let mut lookahead = *input;
        ws(&mut lookahead)?;
        let Some(after_paren) = lookahead.strip_prefix('(') else {
            return if function.allows_bare_call() {
                Ok(TokenKind::Call {
                    function,
                    arguments: Vec::new(),
                })
            } else {
                Err(ContextError::new())
            };
        };

        let args_offset = self.offset(after_paren);
        match split_arguments(after_paren) {
            Some(split) => {
                *input = &after_paren[split.consumed..];
                let arguments = split
                    .arguments
                    .into_iter()
                    .map(|arg| ArgumentText {
                        offset: arg.offset + args_offset,
                        text: arg.text,
                    })
                    .collect();
                Ok(TokenKind::Call {
                    function,
                    arguments,
                })
            }
            None => {
                let text = after_paren.to_string();
                *input = "";
                Ok(TokenKind::MalformedCall { function, text })
            }
        }
    }

    fn group(&self, input: &mut Input<'s>) -> PResult<TokenKind> {
        let Some(inner) = input.strip_prefix('(') else {
            return Err(ContextError::new());
        };
        let end = find_group_end(inner).ok_or_else(ContextError::new)?;
        let raw = &inner[..end];
        let leading = raw.len() - raw.trim_start().len();
        let group = ArgumentText {
            text: raw.trim().to_string(),
            offset: self.offset(inner) + leading,
        };
        *input = &inner[end + 1..];
        Ok(TokenKind::Group(group))
    }
}

fn global(input: &mut Input<'_>) -> PResult<TokenKind> {
    let (collection, member) = bang_path(input)?;
    GlobalVariable::from_path(collection, member)
        .map(TokenKind::Global)
        .ok_or_else(ContextError::new)
}

fn arithmetic(input: &mut Input<'_>) -> PResult<TokenKind> {
    let symbols: Vec<&'static str> = ARITHMETIC_SYMBOLS.iter().map(|(s, _)| *s).collect();
    if let Ok(index) = any_symbol(input, &symbols) {
        return Ok(TokenKind::Operator(ARITHMETIC_SYMBOLS[index].1));
    }
    any_keyword(input, &["Mod"]).map(|_| TokenKind::Operator(BinaryOp::Modulo))
}

fn comparison(input: &mut Input<'_>) -> PResult<TokenKind> {
    let symbols: Vec<&'static str> = COMPARISON_SYMBOLS.iter().map(|(s, _)| *s).collect();
    if let Ok(index) = any_symbol(input, &symbols) {
        return Ok(TokenKind::Operator(COMPARISON_SYMBOLS[index].1));
    }
    match any_keyword(input, &["Like", "Is"])? {
        0 => Ok(TokenKind::Operator(BinaryOp::Like)),
        _ => Ok(TokenKind::Operator(BinaryOp::Is)),
    }
}

fn logical(input: &mut Input<'_>) -> PResult<TokenKind> {
    let words: Vec<&'static str> = LOGICAL_KEYWORDS.iter().map(|(w, _)| *w).collect();
    let index = any_keyword(input, &words)?;
    Ok(match LOGICAL_KEYWORDS[index].1 {
        Some(op) => TokenKind::Operator(op),
        None => TokenKind::Not,
    })
}

/// `Fields!Name.Value` and `Parameters!Name.Value` / `.Label`
fn reference(input: &mut Input<'_>) -> PResult<TokenKind> {
    let (collection, name) = bang_path(input)?;
    let property = property_suffix(input)?;

    if collection.eq_ignore_ascii_case("Fields") {
        let property = match property {
            None => FieldProperty::Value,
            Some(p) if p.eq_ignore_ascii_case("Value") => FieldProperty::Value,
            Some(p) if p.eq_ignore_ascii_case("IsMissing") => FieldProperty::IsMissing,
            Some(_) => return Err(ContextError::new()),
        };
        return Ok(TokenKind::Field(FieldRef {
            name: name.to_string(),
            property,
        }));
    }

    if collection.eq_ignore_ascii_case("Parameters") {
        let property = match property {
            None => ParameterProperty::Value,
            Some(p) if p.eq_ignore_ascii_case("Value") => ParameterProperty::Value,
            Some(p) if p.eq_ignore_ascii_case("Label") => ParameterProperty::Label,
            Some(p) if p.eq_ignore_ascii_case("Count") => ParameterProperty::Count,
            Some(_) => return Err(ContextError::new()),
        };
        return Ok(TokenKind::Parameter(ParameterRef {
            name: name.to_string(),
            property,
        }));
    }

    Err(ContextError::new())
}

fn literal_token(input: &mut Input<'_>) -> PResult<TokenKind> {
    let checkpoint = *input;
    if let Ok(s) = string_literal(input) {
        return Ok(TokenKind::Literal(Literal::String(s)));
    }
    *input = checkpoint;
    if let Ok(lit) = number_literal(input) {
        return Ok(TokenKind::Literal(lit));
    }
    *input = checkpoint;
    if let Ok(lit) = date_literal(input) {
        return Ok(TokenKind::Literal(lit));
    }
    *input = checkpoint;
    keyword_literal(input).map(TokenKind::Literal)
}

/// Literal extraction for text no recognizer matched: a quoted literal, an
/// integer, the first whitespace-separated integer token, or the trimmed
/// text itself.
pub fn extract_literal(remainder: &str) -> Literal {
    let text = remainder.trim();

    if let Some(rest) = text.strip_prefix('"') {
        let body = rest.strip_suffix('"').unwrap_or(rest);
        return Literal::String(body.replace("\"\"", "\""));
    }
    if let Ok(i) = text.parse::<i64>() {
        return Literal::Integer(i);
    }
    if let Some(i) = text
        .split_whitespace()
        .find_map(|token| token.parse::<i64>().ok())
    {
        return Literal::Integer(i);
    }
    Literal::String(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(text: &str) -> Vec<TokenKind> {
        Scanner::new(text).scan().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_operators_inside_strings_are_not_matched() {
        assert_eq!(
            kinds(r#""a + b" & "c""#),
            vec![
                TokenKind::Literal(Literal::string("a + b")),
                TokenKind::Operator(BinaryOp::Concatenate),
                TokenKind::Literal(Literal::string("c")),
            ]
        );
    }

    #[test]
    fn test_keyword_prefixes_do_not_split_identifiers() {
        assert_eq!(
            kinds("IsNothing(Fields!A.Value)"),
            vec![TokenKind::Call {
                function: BuiltinFunction::IsNothing,
                arguments: vec![ArgumentText {
                    text: "Fields!A.Value".to_string(),
                    offset: 10,
                }],
            }]
        );
        assert_eq!(
            kinds("Fields!Name.Value Is Nothing"),
            vec![
                TokenKind::Field(FieldRef::value("Name")),
                TokenKind::Operator(BinaryOp::Is),
                TokenKind::Literal(Literal::Nothing),
            ]
        );
    }

    #[test]
    fn test_unrecognized_remainder_ends_scan() {
        let tokens = Scanner::new("1 + hello world").scan();
        assert_eq!(tokens.len(), 3);
        assert_eq!(
            tokens[2].kind,
            TokenKind::Remainder(Literal::string("hello world"))
        );
        assert_eq!(tokens[2].span, Span::new(4, 15));
    }

    #[test]
    fn test_remainder_integer_token() {
        assert_eq!(extract_literal("page 7 of"), Literal::Integer(7));
        assert_eq!(extract_literal("\"open"), Literal::string("open"));
    }

    #[test]
    fn test_unbalanced_call_is_malformed() {
        assert!(matches!(
            kinds("Left(\"abc\", 2")[0],
            TokenKind::MalformedCall {
                function: BuiltinFunction::Left,
                ..
            }
        ));
    }

    #[test]
    fn test_bare_today() {
        assert_eq!(
            kinds("Today"),
            vec![TokenKind::Call {
                function: BuiltinFunction::Today,
                arguments: Vec::new(),
            }]
        );
    }
}
