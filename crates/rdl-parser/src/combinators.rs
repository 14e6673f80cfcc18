//! Lexeme parsers built on winnow
//!
//! Every parser here consumes input only on success; callers try them from
//! a checkpoint and restore on failure.

use std::str::FromStr;

use rdl_ast::Literal;
use rust_decimal::Decimal;
use winnow::ascii::{digit1, multispace0, Caseless};
use winnow::combinator::{not, opt, terminated};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::{literal, one_of, take_till, take_while};

pub(crate) type Input<'a> = &'a str;
pub(crate) type PResult<O> = Result<O, ContextError>;

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Skip whitespace
pub(crate) fn ws(input: &mut Input<'_>) -> PResult<()> {
    multispace0.void().parse_next(input)
}

pub(crate) fn identifier<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    (one_of(is_ident_start), take_while(0.., is_ident_char))
        .take()
        .parse_next(input)
}

/// Case-insensitive keyword that is not the prefix of a longer identifier
pub(crate) fn keyword<'a>(input: &mut Input<'a>, word: &'static str) -> PResult<&'a str> {
    terminated(literal(Caseless(word)), not(one_of(is_ident_char))).parse_next(input)
}

/// Try `words` in order, returning the index of the first that matches
pub(crate) fn any_keyword(input: &mut Input<'_>, words: &[&'static str]) -> PResult<usize> {
    for (index, word) in words.iter().enumerate() {
        let checkpoint = *input;
        if keyword(input, word).is_ok() {
            return Ok(index);
        }
        *input = checkpoint;
    }
    Err(ContextError::new())
}

/// Try symbol `symbols` in order, returning the index of the first that matches
pub(crate) fn any_symbol(input: &mut Input<'_>, symbols: &[&'static str]) -> PResult<usize> {
    for (index, symbol) in symbols.iter().enumerate() {
        if let Some(rest) = input.strip_prefix(symbol) {
            *input = rest;
            return Ok(index);
        }
    }
    Err(ContextError::new())
}

/// Integer or decimal number literal
pub(crate) fn number_literal(input: &mut Input<'_>) -> PResult<Literal> {
    let checkpoint = *input;
    let text = (digit1, opt(('.', digit1))).take().parse_next(input)?;
    if text.contains('.') {
        return match Decimal::from_str(text) {
            Ok(d) => Ok(Literal::Decimal(d)),
            Err(_) => {
                *input = checkpoint;
                Err(ContextError::new())
            }
        };
    }
    match text.parse::<i64>() {
        Ok(i) => Ok(Literal::Integer(i)),
        Err(_) => match Decimal::from_str(text) {
            Ok(d) => Ok(Literal::Decimal(d)),
            Err(_) => {
                *input = checkpoint;
                Err(ContextError::new())
            }
        },
    }
}

/// Double-quoted string literal; `""` inside the literal is an escaped quote
pub(crate) fn string_literal(input: &mut Input<'_>) -> PResult<String> {
    let checkpoint = *input;
    '"'.parse_next(input)?;
    let mut out = String::new();
    loop {
        let chunk: &str = take_till(0.., '"').parse_next(input)?;
        out.push_str(chunk);
        if input.is_empty() {
            *input = checkpoint;
            return Err(ContextError::new());
        }
        '"'.parse_next(input)?;
        if input.starts_with('"') {
            '"'.parse_next(input)?;
            out.push('"');
        } else {
            return Ok(out);
        }
    }
}

/// `#1/15/2010#` date literal
pub(crate) fn date_literal(input: &mut Input<'_>) -> PResult<Literal> {
    let checkpoint = *input;
    let parsed = ('#', take_till(1.., '#'), '#').parse_next(input);
    match parsed {
        Ok((_, text, _)) => Ok(Literal::Date(text.trim().to_string())),
        Err(e) => {
            *input = checkpoint;
            Err(e)
        }
    }
}

/// `True`, `False`, `Nothing`
pub(crate) fn keyword_literal(input: &mut Input<'_>) -> PResult<Literal> {
    match any_keyword(input, &["True", "False", "Nothing"])? {
        0 => Ok(Literal::Boolean(true)),
        1 => Ok(Literal::Boolean(false)),
        _ => Ok(Literal::Nothing),
    }
}

/// `Collection!Member`, returning both names
pub(crate) fn bang_path<'a>(input: &mut Input<'a>) -> PResult<(&'a str, &'a str)> {
    let checkpoint = *input;
    let parsed = (identifier, '!', identifier).parse_next(input);
    match parsed {
        Ok((collection, _, member)) => Ok((collection, member)),
        Err(e) => {
            *input = checkpoint;
            Err(e)
        }
    }
}

/// Optional `.Property` suffix after a bang path
pub(crate) fn property_suffix<'a>(input: &mut Input<'a>) -> PResult<Option<&'a str>> {
    let checkpoint = *input;
    match ('.', identifier).parse_next(input) {
        Ok((_, name)) => Ok(Some(name)),
        Err(_) => {
            *input = checkpoint;
            Ok(None)
        }
    }
}
