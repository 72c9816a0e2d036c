// Lexical helpers shared by the option parsers

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag},
    character::complete::{alpha1, alphanumeric1, char, multispace0, none_of, one_of},
    combinator::{eof, map, opt, recognize, value},
    multi::many0_count,
    number::complete::recognize_float,
    sequence::{delimited, pair},
    IResult,
};

/// Wrap a parser so it skips surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Identifier: letter or underscore, then letters, digits, underscores
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0_count(alt((alphanumeric1, tag("_")))),
        )),
        String::from,
    )(input)
}

/// Quoted string with `\"`, `\'`, `\\`, `\n` escapes; single or double quotes
pub fn string_literal(input: &str) -> IResult<&str, String> {
    alt((quoted('"'), quoted('\'')))(input)
}

fn quoted<'a>(quote: char) -> impl FnMut(&'a str) -> IResult<&'a str, String> {
    let normal = if quote == '"' { "\"\\" } else { "'\\" };
    move |input: &'a str| {
        delimited(
            char(quote),
            map(
                opt(escaped_transform(
                    none_of(normal),
                    '\\',
                    alt((
                        value("\\", tag("\\")),
                        value("\"", tag("\"")),
                        value("'", tag("'")),
                        value("\n", tag("n")),
                    )),
                )),
                Option::unwrap_or_default,
            ),
            char(quote),
        )(input)
    }
}

/// Raw text of a number (integer or float)
pub fn number_literal(input: &str) -> IResult<&str, &str> {
    recognize_float(input)
}

/// Unquoted word inside a list: everything up to a separator
pub fn bare_word(input: &str) -> IResult<&str, &str> {
    is_not(",[]")(input)
}

/// End of a scalar token: separator, closing bracket, whitespace or end of input
pub fn token_end(input: &str) -> IResult<&str, &str> {
    alt((eof, recognize(one_of(",] \t\r\n"))))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("line_color=red"), Ok(("=red", "line_color".to_string())));
        assert!(identifier("1abc").is_err());
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(string_literal(r#""My \"plot\"" rest"#), Ok((" rest", "My \"plot\"".to_string())));
        assert_eq!(string_literal("'single'"), Ok(("", "single".to_string())));
        assert_eq!(string_literal("\"\""), Ok(("", String::new())));
    }

    #[test]
    fn test_number_literal() {
        assert_eq!(number_literal("1.5e3,"), Ok((",", "1.5e3")));
        assert_eq!(number_literal("-2]"), Ok(("]", "-2")));
    }
}
