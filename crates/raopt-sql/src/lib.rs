//! # raopt-sql: SQL Front End
//!
//! Converts SQL text into the clause AST consumed by `raopt-core`, using the
//! off-the-shelf `sqlparser` crate. Only single-statement SELECT queries are
//! accepted, and only the clauses the optimizer consumes are extracted: the
//! FROM source, explicit JOINs with their ON conditions, the WHERE predicate,
//! and the SELECT output list. Derived tables in FROM/JOIN positions convert
//! recursively into subquery sources.
//!
//! Predicates and output expressions are carried as SQL text (via the
//! parser's `Display` round-trip); the optimizer never interprets them beyond
//! their referenced identifiers.

use sqlparser::ast as sp;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser as SqlParser;
use thiserror::Error;

use raopt_core::ast::{JoinClause, QuerySpec, SourceNode};
use raopt_core::builder::build_plan;
use raopt_core::error::PlanError;
use raopt_core::plan::PlanNode;
use raopt_core::predicate::Predicate;

/// Errors from the SQL front end.
#[derive(Debug, Error)]
pub enum SqlError {
    /// The text is not valid SQL.
    #[error("syntax error: {0}")]
    Parse(#[from] sqlparser::parser::ParserError),

    /// Structural plan-construction failure (no FROM clause, unresolved
    /// source, malformed plan).
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("empty query")]
    EmptyQuery,

    #[error("multiple statements not supported")]
    MultipleStatements,

    /// A statement or query shape the optimizer does not handle
    /// (non-SELECT statements, set operations, comma joins, ...).
    #[error("unsupported statement: {0}")]
    UnsupportedStatement(String),
}

/// Parse SQL text into the optimizer's clause AST.
pub fn parse_query(sql: &str) -> Result<QuerySpec, SqlError> {
    let sql = sql.trim();
    if sql.is_empty() {
        return Err(SqlError::EmptyQuery);
    }

    let dialect = GenericDialect {};
    let statements = SqlParser::parse_sql(&dialect, sql)?;

    match statements.as_slice() {
        [] => Err(SqlError::EmptyQuery),
        [sp::Statement::Query(query)] => convert_query(query),
        [other] => Err(SqlError::UnsupportedStatement(other.to_string())),
        _ => Err(SqlError::MultipleStatements),
    }
}

/// Parse SQL text and build the corresponding RA plan tree in one step.
pub fn parse_plan(sql: &str) -> Result<PlanNode, SqlError> {
    let spec = parse_query(sql)?;
    Ok(build_plan(&spec)?)
}

fn convert_query(query: &sp::Query) -> Result<QuerySpec, SqlError> {
    let select = match query.body.as_ref() {
        sp::SetExpr::Select(select) => select,
        other => {
            return Err(SqlError::UnsupportedStatement(format!(
                "unsupported query body: {}",
                other
            )))
        }
    };

    let (from, joins) = match select.from.as_slice() {
        [] => (None, Vec::new()),
        [table_with_joins] => {
            let from = convert_factor(&table_with_joins.relation)?;
            let joins = table_with_joins
                .joins
                .iter()
                .map(convert_join)
                .collect::<Result<Vec<_>, _>>()?;
            (Some(from), joins)
        }
        _ => {
            return Err(SqlError::UnsupportedStatement(
                "comma-separated FROM sources not supported".into(),
            ))
        }
    };

    let filter = select
        .selection
        .as_ref()
        .map(|expr| Predicate::new(expr.to_string()));
    let select_list = select.projection.iter().map(|item| item.to_string()).collect();

    Ok(QuerySpec {
        from,
        joins,
        filter,
        select: select_list,
    })
}

fn convert_factor(factor: &sp::TableFactor) -> Result<SourceNode, SqlError> {
    match factor {
        sp::TableFactor::Table { name, alias, .. } => Ok(SourceNode::Table {
            name: object_name(name)?,
            alias: alias.as_ref().map(|a| a.name.value.clone()),
        }),
        sp::TableFactor::Derived { subquery, alias, .. } => Ok(SourceNode::Subquery {
            alias: alias.as_ref().map(|a| a.name.value.clone()),
            query: Box::new(convert_query(subquery)?),
        }),
        other => Err(PlanError::UnresolvedSource(other.to_string()).into()),
    }
}

/// Use the last component of a possibly schema-qualified name.
fn object_name(name: &sp::ObjectName) -> Result<String, SqlError> {
    name.0
        .last()
        .map(|part| {
            part.as_ident()
                .map(|ident| ident.value.clone())
                .unwrap_or_else(|| part.to_string())
        })
        .ok_or_else(|| PlanError::UnresolvedSource("empty table name".into()).into())
}

fn convert_join(join: &sp::Join) -> Result<JoinClause, SqlError> {
    let source = convert_factor(&join.relation)?;
    let on = match join_constraint(&join.join_operator) {
        Some(sp::JoinConstraint::On(expr)) => Some(Predicate::new(expr.to_string())),
        // USING/NATURAL/absent constraints carry no predicate text the
        // optimizer can attribute; the builder defaults them to always-true.
        _ => None,
    };
    Ok(JoinClause { source, on })
}

fn join_constraint(op: &sp::JoinOperator) -> Option<&sp::JoinConstraint> {
    match op {
        sp::JoinOperator::Join(c)
        | sp::JoinOperator::Inner(c)
        | sp::JoinOperator::Left(c)
        | sp::JoinOperator::LeftOuter(c)
        | sp::JoinOperator::Right(c)
        | sp::JoinOperator::RightOuter(c)
        | sp::JoinOperator::FullOuter(c) => Some(c),
        _ => None,
    }
}
