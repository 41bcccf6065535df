// Lexical helpers for the filter expression grammar

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_till, take_till1},
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0, satisfy},
    combinator::{map, map_res, not, opt, recognize},
    multi::many0,
    sequence::{delimited, pair, terminated, tuple},
    IResult,
};

use crate::data::Value;

/// Wrap a parser so that it skips surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Case-insensitive keyword that is not the prefix of a longer identifier
pub fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag_no_case(kw), not(satisfy(is_ident_char)))
}

/// Bare identifier: letter or underscore, then letters, digits, `_` or `.`
pub fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_"), tag(".")))),
    ))(input)
}

/// Field reference: a bare identifier or a `[bracketed name]` that may contain spaces
pub fn field_name(input: &str) -> IResult<&str, String> {
    alt((
        map(delimited(char('['), take_till1(|c| c == ']'), char(']')), |s: &str| s.trim().to_string()),
        map(identifier, str::to_string),
    ))(input)
}

/// Single- or double-quoted string without escapes
pub fn string_literal(input: &str) -> IResult<&str, String> {
    alt((
        map(delimited(char('"'), take_till(|c| c == '"'), char('"')), str::to_string),
        map(delimited(char('\''), take_till(|c| c == '\''), char('\'')), str::to_string),
    ))(input)
}

pub fn number_literal(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((opt(char('-')), digit1, opt(pair(char('.'), digit1))))),
        str::parse::<f64>,
    )(input)
}

/// Right-hand side of a comparison
pub fn literal(input: &str) -> IResult<&str, Value> {
    alt((
        map(string_literal, Value::Text),
        map(keyword("true"), |_| Value::Bool(true)),
        map(keyword("false"), |_| Value::Bool(false)),
        map(keyword("null"), |_| Value::Null),
        map(number_literal, Value::Number),
        map(identifier, |s: &str| Value::from(s)),
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_boundary() {
        assert!(keyword("and")("and x").is_ok());
        assert!(keyword("and")("AND x").is_ok());
        assert!(keyword("and")("android").is_err());
    }

    #[test]
    fn test_field_names() {
        assert_eq!(field_name("region = 1").unwrap().1, "region");
        assert_eq!(field_name("[Order Date] > 1").unwrap().1, "Order Date");
        assert_eq!(field_name("sales.total").unwrap().1, "sales.total");
        assert!(field_name("1abc").is_err());
    }

    #[test]
    fn test_literals() {
        assert_eq!(literal("\"North\"").unwrap().1, Value::from("North"));
        assert_eq!(literal("'it'").unwrap().1, Value::from("it"));
        assert_eq!(literal("-12.5").unwrap().1, Value::Number(-12.5));
        assert_eq!(literal("TRUE").unwrap().1, Value::Bool(true));
        assert_eq!(literal("null").unwrap().1, Value::Null);
        assert_eq!(literal("North").unwrap().1, Value::from("North"));
        assert_eq!(literal("\"\"").unwrap().1, Value::from(""));
    }
}
