// Filter expression grammar
//
//   expr      := and_expr ("or" and_expr)*
//   and_expr  := not_expr ("and" not_expr)*
//   not_expr  := "not" not_expr | "(" expr ")" | condition
//   condition := field test
//   test      := "is" ["not"] "blank"
//              | ["not"] "in" "(" literal ("," literal)* ")"
//              | "contains" string | "starts_with" string
//              | cmp_op literal

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{all_consuming, map, opt, value},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded},
    IResult,
};

use super::ast::{CompareOp, Predicate};
use super::lexer::{field_name, keyword, literal, string_literal, ws};
use super::FilterParseError;
use crate::data::Value;

/// Parse a complete filter expression
pub fn parse_filter(input: &str) -> Result<Predicate, FilterParseError> {
    if input.trim().is_empty() {
        return Err(FilterParseError::Empty);
    }
    match all_consuming(ws(expression))(input) {
        Ok((_, predicate)) => Ok(predicate),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(FilterParseError::Syntax {
            position: input.len() - e.input.len(),
            near: e.input.chars().take(20).collect(),
        }),
        Err(nom::Err::Incomplete(_)) => Err(FilterParseError::Syntax {
            position: input.len(),
            near: String::new(),
        }),
    }
}

pub fn expression(input: &str) -> IResult<&str, Predicate> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(preceded(ws(keyword("or")), and_expr))(input)?;
    Ok((input, join(first, rest, |predicates| Predicate::Or { predicates })))
}

fn and_expr(input: &str) -> IResult<&str, Predicate> {
    let (input, first) = not_expr(input)?;
    let (input, rest) = many0(preceded(ws(keyword("and")), not_expr))(input)?;
    Ok((input, join(first, rest, |predicates| Predicate::And { predicates })))
}

fn join(first: Predicate, rest: Vec<Predicate>, combine: impl FnOnce(Vec<Predicate>) -> Predicate) -> Predicate {
    if rest.is_empty() {
        return first;
    }
    let mut predicates = Vec::with_capacity(rest.len() + 1);
    predicates.push(first);
    predicates.extend(rest);
    combine(predicates)
}

fn not_expr(input: &str) -> IResult<&str, Predicate> {
    alt((
        map(preceded(ws(keyword("not")), not_expr), |p| Predicate::Not { predicate: Box::new(p) }),
        delimited(ws(char('(')), expression, ws(char(')'))),
        condition,
    ))(input)
}

enum Test {
    Blank(bool),
    In(Vec<Value>, bool),
    Contains(String),
    StartsWith(String),
    Compare(CompareOp, Value),
}

fn compare_op(input: &str) -> IResult<&str, CompareOp> {
    alt((
        value(CompareOp::Le, tag("<=")),
        value(CompareOp::Ge, tag(">=")),
        value(CompareOp::Ne, tag("!=")),
        value(CompareOp::Ne, tag("<>")),
        value(CompareOp::Eq, tag("==")),
        value(CompareOp::Eq, tag("=")),
        value(CompareOp::Lt, tag("<")),
        value(CompareOp::Gt, tag(">")),
    ))(input)
}

fn predicate_tail(input: &str) -> IResult<&str, Test> {
    alt((
        map(
            preceded(ws(keyword("is")), pair(opt(ws(keyword("not"))), ws(keyword("blank")))),
            |(negated, _)| Test::Blank(negated.is_some()),
        ),
        map(
            pair(
                opt(ws(keyword("not"))),
                preceded(
                    ws(keyword("in")),
                    delimited(ws(char('(')), separated_list1(ws(char(',')), ws(literal)), ws(char(')'))),
                ),
            ),
            |(negated, values)| Test::In(values, negated.is_some()),
        ),
        map(preceded(ws(keyword("contains")), ws(string_literal)), Test::Contains),
        map(
            preceded(ws(alt((keyword("starts_with"), keyword("startswith")))), ws(string_literal)),
            Test::StartsWith,
        ),
        map(pair(ws(compare_op), ws(literal)), |(op, v)| Test::Compare(op, v)),
    ))(input)
}

fn condition(input: &str) -> IResult<&str, Predicate> {
    let (input, field) = ws(field_name)(input)?;
    let (input, test) = predicate_tail(input)?;
    let predicate = match test {
        Test::Blank(negated) => Predicate::IsBlank { field, negated },
        Test::In(values, negated) => Predicate::In { field, values, negated },
        Test::Contains(value) => Predicate::Contains { field, value },
        Test::StartsWith(value) => Predicate::StartsWith { field, value },
        Test::Compare(op, value) => Predicate::Compare { field, op, value },
    };
    Ok((input, predicate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comparison() {
        let p = parse_filter("sales >= 100").unwrap();
        assert_eq!(p, Predicate::compare("sales", CompareOp::Ge, 100.0));
        let p = parse_filter("[Order Region] = \"North\"").unwrap();
        assert_eq!(p, Predicate::compare("Order Region", CompareOp::Eq, "North"));
    }

    #[test]
    fn test_precedence() {
        // and binds tighter than or
        let p = parse_filter("a = 1 or b = 2 and c = 3").unwrap();
        match p {
            Predicate::Or { predicates } => {
                assert_eq!(predicates.len(), 2);
                assert!(matches!(predicates[1], Predicate::And { .. }));
            }
            other => panic!("expected or, got {:?}", other),
        }
    }

    #[test]
    fn test_parentheses_and_not() {
        let p = parse_filter("not (region = 'North' or region = 'South')").unwrap();
        match p {
            Predicate::Not { predicate } => assert!(matches!(*predicate, Predicate::Or { .. })),
            other => panic!("expected not, got {:?}", other),
        }
    }

    #[test]
    fn test_in_and_blank() {
        let p = parse_filter("region not in ('North', 'East')").unwrap();
        assert_eq!(
            p,
            Predicate::In {
                field: "region".to_string(),
                values: vec![Value::from("North"), Value::from("East")],
                negated: true,
            }
        );
        let p = parse_filter("[Ship Date] is not blank").unwrap();
        assert_eq!(
            p,
            Predicate::IsBlank {
                field: "Ship Date".to_string(),
                negated: true,
            }
        );
    }

    #[test]
    fn test_text_operators() {
        assert!(matches!(parse_filter("name contains \"an\"").unwrap(), Predicate::Contains { .. }));
        assert!(matches!(parse_filter("name starts_with 'A'").unwrap(), Predicate::StartsWith { .. }));
    }

    #[test]
    fn test_case_insensitive_keywords() {
        assert!(parse_filter("a = 1 AND NOT b = 2").is_ok());
        assert!(parse_filter("a IN (1, 2)").is_ok());
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_filter("   "), Err(FilterParseError::Empty));
        assert!(matches!(parse_filter("sales >"), Err(FilterParseError::Syntax { .. })));
        assert!(matches!(parse_filter("sales = 1 extra"), Err(FilterParseError::Syntax { .. })));
        assert!(parse_filter("(a = 1").is_err());
        assert!(parse_filter("a in ()").is_err());
    }
}
