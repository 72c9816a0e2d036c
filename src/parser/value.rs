// Parser for styling option values given as `key=value` on the command line
//
// Grammar:
//   value  := list | string | keyword | number | word
//   list   := '[' (value (',' value)*)? ']'
//   keyword:= true | false | null

use super::lexer::{bare_word, identifier, number_literal, string_literal, token_end, ws};
use crate::error::{PlotError, PlotResult};
use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::char,
    combinator::{all_consuming, map, peek, rest, value},
    multi::separated_list0,
    sequence::{delimited, separated_pair, terminated},
    IResult,
};
use serde_json::{Map, Number, Value};

/// Parse a single option value
pub fn parse_value(input: &str) -> IResult<&str, Value> {
    alt((parse_list, parse_string, parse_keyword, parse_number, parse_word))(input)
}

fn parse_list(input: &str) -> IResult<&str, Value> {
    map(
        delimited(
            ws(char('[')),
            separated_list0(ws(char(',')), ws(parse_value)),
            ws(char(']')),
        ),
        Value::Array,
    )(input)
}

fn parse_string(input: &str) -> IResult<&str, Value> {
    map(string_literal, Value::String)(input)
}

fn parse_keyword(input: &str) -> IResult<&str, Value> {
    terminated(
        alt((
            value(Value::Bool(true), tag_no_case("true")),
            value(Value::Bool(false), tag_no_case("false")),
            value(Value::Null, tag_no_case("null")),
        )),
        peek(token_end),
    )(input)
}

fn parse_number(input: &str) -> IResult<&str, Value> {
    map(terminated(number_literal, peek(token_end)), number_value)(input)
}

fn number_value(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::from(i);
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

fn parse_word(input: &str) -> IResult<&str, Value> {
    map(bare_word, |w: &str| Value::String(w.trim().to_string()))(input)
}

/// Parse `key=value`; a value that is not a complete literal is kept as raw text
pub fn parse_option(input: &str) -> IResult<&str, (String, Value)> {
    let (input, (key, raw)) = separated_pair(ws(identifier), char('='), rest)(input)?;
    let parsed = all_consuming(ws(parse_value))(raw)
        .map(|(_, v)| v)
        .unwrap_or_else(|_| Value::String(raw.trim().to_string()));
    Ok((input, (key, parsed)))
}

/// Collect `key=value` arguments into a styling map; later keys win
pub fn parse_options<S: AsRef<str>>(args: &[S]) -> PlotResult<Map<String, Value>> {
    let mut params = Map::new();
    for arg in args {
        let arg = arg.as_ref();
        let (_, (key, val)) = parse_option(arg).map_err(|_| {
            PlotError::invalid(arg, "expected key=value")
        })?;
        params.insert(key, val);
    }
    Ok(params)
}
