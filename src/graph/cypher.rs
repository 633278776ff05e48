//! Cypher scanner for extracting RETURN clause column names.
//!
//! Raw statements do not carry a clause list, but Apache AGE needs the
//! result columns spelled out in SQL. This module finds them in the text.
//!
//! # Example
//!
//! ```ignore
//! use neopersist::graph::extract_return_columns;
//!
//! let columns = extract_return_columns("MATCH (n) RETURN n.name AS name, n.age").unwrap();
//! assert_eq!(columns, vec!["name", "n.age"]);
//! ```

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "graph/cypher.pest"]
struct CypherParser;

/// Errors that can occur while scanning a Cypher query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no RETURN clause found in query")]
    NoReturnClause,

    #[error("RETURN * is not supported, declare the columns explicitly")]
    ReturnStarNotSupported,

    #[error("invalid syntax: {0}")]
    InvalidSyntax(String),
}

/// Extracts column names from a Cypher query's final top-level RETURN.
///
/// For aliased items (`expr AS alias`) the alias is the column name;
/// otherwise the expression text is.
pub fn extract_return_columns(query: &str) -> Result<Vec<String>, ParseError> {
    let pairs = CypherParser::parse(Rule::Cypher, query)
        .map_err(|e| ParseError::InvalidSyntax(e.to_string()))?;

    let mut columns = None;
    for pair in pairs.flatten() {
        if pair.as_rule() == Rule::Return {
            columns = Some(projection_columns(pair)?);
        }
    }
    columns.ok_or(ParseError::NoReturnClause)
}

fn projection_columns(pair: Pair<'_, Rule>) -> Result<Vec<String>, ParseError> {
    pair.into_inner()
        .filter(|inner| inner.as_rule() == Rule::ProjectionItems)
        .flat_map(Pair::into_inner)
        .map(column_name)
        .collect()
}

fn column_name(item: Pair<'_, Rule>) -> Result<String, ParseError> {
    let mut expression = None;
    let mut alias = None;

    for inner in item.into_inner() {
        match inner.as_rule() {
            Rule::Expression => expression = Some(inner.as_str().trim().to_string()),
            Rule::Variable => alias = Some(unescape(inner.as_str())),
            _ => {}
        }
    }

    match (alias, expression) {
        (Some(alias), _) => Ok(alias),
        (None, Some(expression)) if expression == "*" => Err(ParseError::ReturnStarNotSupported),
        (None, Some(expression)) => Ok(expression),
        (None, None) => Err(ParseError::InvalidSyntax("empty RETURN item".to_string())),
    }
}

fn unescape(name: &str) -> String {
    name.strip_prefix('`')
        .and_then(|n| n.strip_suffix('`'))
        .unwrap_or(name)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_and_aliased_columns() {
        let columns = extract_return_columns("MATCH (n) RETURN n.name AS name, n.age").unwrap();
        assert_eq!(columns, vec!["name", "n.age"]);
    }

    #[test]
    fn test_expression_text_is_kept() {
        let columns = extract_return_columns("MATCH (n) RETURN n.age + 10, count(*)").unwrap();
        assert_eq!(columns, vec!["n.age + 10", "count(*)"]);
    }

    #[test]
    fn test_trailing_clauses_are_not_columns() {
        let columns = extract_return_columns(
            "MATCH (u:User) RETURN DISTINCT u.name AS name ORDER BY name DESC SKIP 1 LIMIT 5",
        )
        .unwrap();
        assert_eq!(columns, vec!["name"]);
    }

    #[test]
    fn test_keywords_inside_property_names() {
        let columns = extract_return_columns("MATCH (n) RETURN n.order, n.limit AS lim").unwrap();
        assert_eq!(columns, vec!["n.order", "lim"]);
    }

    #[test]
    fn test_nested_commas_and_strings() {
        let query = "MATCH (a)-[r:WROTE {tags: ['x', 'y']}]->(b) \
                     RETURN coalesce(a.name, 'RETURN, x') AS name, [a, b] AS pair";
        let columns = extract_return_columns(query).unwrap();
        assert_eq!(columns, vec!["name", "pair"]);
    }

    #[test]
    fn test_final_return_wins() {
        let query = "MATCH (n) CALL { WITH n RETURN n.x AS inner } RETURN n, inner";
        let columns = extract_return_columns(query).unwrap();
        assert_eq!(columns, vec!["n", "inner"]);
    }

    #[test]
    fn test_escaped_alias() {
        let columns = extract_return_columns("RETURN 1 AS `my col`").unwrap();
        assert_eq!(columns, vec!["my col"]);
    }

    #[test]
    fn test_write_only_query_has_no_return() {
        let result = extract_return_columns("CREATE (n:User {userId: $id})");
        assert_eq!(result, Err(ParseError::NoReturnClause));
    }

    #[test]
    fn test_return_star_is_rejected() {
        let result = extract_return_columns("MATCH (n) RETURN *");
        assert_eq!(result, Err(ParseError::ReturnStarNotSupported));
    }

    #[test]
    fn test_unbalanced_brackets_are_invalid() {
        let result = extract_return_columns("MATCH (n RETURN n");
        assert!(matches!(result, Err(ParseError::InvalidSyntax(_))));
    }
}
