//! # Opaque Predicates
//!
//! Predicates in the RA tree carry the original SQL text of a boolean
//! expression together with the set of table/alias qualifiers it references.
//! The optimizer never evaluates a predicate; the reference set is the only
//! thing the rewrite passes inspect, and it is what decides pushdown legality
//! (can this filter move below a join?) and join applicability (does this
//! condition connect these two operands?).
//!
//! ## Reference Extraction
//!
//! References are extracted lexically from the text: every `qualifier.column`
//! pair of identifiers contributes a table qualifier and a qualified column,
//! both lowercased. Single-quoted string literals are skipped so that
//! `name = 'a.b'` does not produce a phantom reference. Unqualified column
//! names carry no table information and are ignored -- a predicate made only
//! of unqualified columns has an empty reference set and is treated as
//! unattributable by the passes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An opaque boolean expression over one or more relations.
///
/// Equality is structural (text plus reference sets), which is what the
/// idempotence and preservation checks on the rewrite passes compare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    /// Raw SQL text of the condition, e.g. `"t1.id = t2.id"`.
    text: String,
    /// Lowercased table/alias qualifiers referenced by the text.
    tables: BTreeSet<String>,
    /// Lowercased `qualifier.column` references, used by the
    /// projection-swap legality check.
    columns: BTreeSet<String>,
}

impl Predicate {
    /// Build a predicate from SQL text, extracting its reference sets.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let (tables, columns) = extract_references(&text);
        Self { text, tables, columns }
    }

    /// The always-true predicate used for join clauses without an ON
    /// condition (a cross join).
    pub fn always_true() -> Self {
        Self {
            text: "TRUE".to_string(),
            tables: BTreeSet::new(),
            columns: BTreeSet::new(),
        }
    }

    pub fn is_always_true(&self) -> bool {
        self.text.eq_ignore_ascii_case("true")
    }

    /// Conjunction of two predicates: text is joined with `AND`, reference
    /// sets are unioned. The result is still opaque.
    pub fn and(&self, other: &Predicate) -> Predicate {
        if self.is_always_true() {
            return other.clone();
        }
        if other.is_always_true() {
            return self.clone();
        }
        let mut tables = self.tables.clone();
        tables.extend(other.tables.iter().cloned());
        let mut columns = self.columns.clone();
        columns.extend(other.columns.iter().cloned());
        Predicate {
            text: format!("{} AND {}", self.text, other.text),
            tables,
            columns,
        }
    }

    /// SQL text of the condition.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lowercased table/alias qualifiers referenced by this predicate.
    pub fn tables(&self) -> &BTreeSet<String> {
        &self.tables
    }

    /// Lowercased `qualifier.column` references.
    pub fn columns(&self) -> &BTreeSet<String> {
        &self.columns
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Scan SQL text for `identifier.identifier` pairs.
///
/// Returns (table qualifiers, qualified columns), both lowercased. Numeric
/// literals like `10.5` never match because the qualifier must start with a
/// letter or underscore.
fn extract_references(text: &str) -> (BTreeSet<String>, BTreeSet<String>) {
    let mut tables = BTreeSet::new();
    let mut columns = BTreeSet::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        // Skip string literals ('' escapes a quote inside the literal).
        if c == '\'' {
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if i + 1 < chars.len() && chars[i + 1] == '\'' {
                        i += 2;
                        continue;
                    }
                    break;
                }
                i += 1;
            }
            i += 1;
            continue;
        }
        if is_ident_start(c) {
            let start = i;
            while i < chars.len() && is_ident_part(chars[i]) {
                i += 1;
            }
            // Qualified reference: identifier immediately followed by a dot
            // and another identifier.
            if i + 1 < chars.len() && chars[i] == '.' && is_ident_start(chars[i + 1]) {
                let qualifier: String = chars[start..i].iter().collect();
                i += 1;
                let col_start = i;
                while i < chars.len() && is_ident_part(chars[i]) {
                    i += 1;
                }
                let column: String = chars[col_start..i].iter().collect();
                let qualifier = qualifier.to_ascii_lowercase();
                columns.insert(format!("{}.{}", qualifier, column.to_ascii_lowercase()));
                tables.insert(qualifier);
            }
            continue;
        }
        i += 1;
    }

    (tables, columns)
}
