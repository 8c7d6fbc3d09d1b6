//! Query Parser
//!
//! Parses activity search strings into a [`StructuredQuery`] and writes them
//! back out.
//!
//! # Supported Syntax
//!
//! ```text
//! term [term ...]
//! term  := [field ":"] value
//! field := user | group | tag | uri | url | quote | text
//! value := bare | "double quoted" | 'single quoted'
//! ```
//!
//! Terms without a recognized field (including `foo:bar`) are stored under
//! the `any` key.
//!
//! # Examples
//!
//! ```text
//! tag:foo
//! group:abc123 user:jane
//! tag:"machine learning" transformers
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{cut, eof, map, peek},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

use crate::query::error::{QueryError, QueryResult};
use crate::query::structured::{StructuredQuery, ANY_KEY};

/// Field names recognized in `field:value` terms
pub const NAMED_FIELDS: &[&str] = &["user", "group", "tag", "uri", "url", "quote", "text"];

/// Pluggable text syntax for structured queries.
///
/// `unparse(parse(s))` must reproduce an equivalent query for any `s`.
pub trait QuerySyntax: Send + Sync {
    /// Parse a raw query string
    fn parse(&self, input: &str) -> QueryResult<StructuredQuery>;

    /// Serialize a query back to text
    fn unparse(&self, query: &StructuredQuery) -> String;
}

/// The default `field:value` term syntax
#[derive(Debug, Clone, Copy, Default)]
pub struct TermSyntax;

impl QuerySyntax for TermSyntax {
    fn parse(&self, input: &str) -> QueryResult<StructuredQuery> {
        parse_query(input)
    }

    fn unparse(&self, query: &StructuredQuery) -> String {
        unparse_query(query)
    }
}

/// Parse a query string into a StructuredQuery
pub fn parse_query(input: &str) -> QueryResult<StructuredQuery> {
    match parse_terms(input) {
        Ok((remaining, terms)) => {
            if remaining.trim().is_empty() {
                Ok(terms.into_iter().collect())
            } else {
                Err(QueryError::Parse(format!(
                    "Unexpected input after query: '{}'",
                    remaining.trim()
                )))
            }
        }
        Err(nom::Err::Failure(e)) => Err(QueryError::UnterminatedQuote {
            position: input.len() - e.input.len(),
        }),
        Err(e) => Err(QueryError::Parse(format!("Parse error: {:?}", e))),
    }
}

/// Serialize a StructuredQuery back into query text, keeping term order
pub fn unparse_query(query: &StructuredQuery) -> String {
    query
        .iter()
        .map(|(key, value)| {
            if key == ANY_KEY {
                escape_value(key, value)
            } else {
                format!("{}:{}", key, escape_value(key, value))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quote a value when it would not read back as the same term bare
fn escape_value(key: &str, value: &str) -> String {
    if !needs_quotes(key, value) {
        return value.to_string();
    }
    if value.contains('"') {
        format!("'{}'", value)
    } else {
        format!("\"{}\"", value)
    }
}

fn needs_quotes(key: &str, value: &str) -> bool {
    value.is_empty()
        || value.starts_with(['"', '\''])
        || value.chars().any(char::is_whitespace)
        || (key == ANY_KEY && looks_fielded(value))
}

/// Free text such as `group:xyz` that would parse as a fielded term
fn looks_fielded(value: &str) -> bool {
    value
        .split_once(':')
        .is_some_and(|(field, _)| NAMED_FIELDS.contains(&field))
}

/// Parse all whitespace-separated terms
fn parse_terms(input: &str) -> IResult<&str, Vec<(String, String)>> {
    delimited(
        multispace0,
        separated_list0(multispace1, parse_term),
        multispace0,
    )(input)
}

/// Parse a single term, fielded or free text
fn parse_term(input: &str) -> IResult<&str, (String, String)> {
    alt((
        map(pair(parse_field, parse_value), |(field, value)| {
            (field.to_string(), value.to_string())
        }),
        map(parse_value, |value| (ANY_KEY.to_string(), value.to_string())),
    ))(input)
}

/// Parse a recognized field name and its colon
fn parse_field(input: &str) -> IResult<&str, &str> {
    terminated(
        alt((
            tag("user"),
            tag("group"),
            tag("tag"),
            tag("uri"),
            tag("url"),
            tag("quote"),
            tag("text"),
        )),
        char(':'),
    )(input)
}

/// Parse a quoted or bare value
fn parse_value(input: &str) -> IResult<&str, &str> {
    alt((parse_double_quoted, parse_single_quoted, parse_bare))(input)
}

/// Double-quoted value; a missing closing quote is a hard failure
fn parse_double_quoted(input: &str) -> IResult<&str, &str> {
    preceded(
        char('"'),
        cut(terminated(take_while(|c| c != '"'), char('"'))),
    )(input)
}

/// Single-quoted value; falls back to a bare word when unterminated
fn parse_single_quoted(input: &str) -> IResult<&str, &str> {
    // A closing quote glued to more text (`'tis'nt`) is not a quoted value
    terminated(
        delimited(char('\''), take_while(|c| c != '\''), char('\'')),
        peek(alt((multispace1, eof))),
    )(input)
}

/// Bare word up to the next whitespace
fn parse_bare(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace())(input)
}
