//! Per-database filter rewriting.
//!
//! Federated entries carry namespaced ids (`<database_id>/<local_id>`), so a
//! client filtering on such an id must have the prefix removed before the
//! filter reaches the database that owns the entry. This is a best-effort
//! textual rewrite, not a filter-language transformation: only the first id
//! literal carrying a known database prefix is rewritten.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::models::OptimadeWarning;

/// Finds string literals compared against `id`, on either side of the operator.
static ID_LITERAL: Lazy<Regex> = Lazy::new(|| {
    const OPS: &str = r"(?:<=|>=|!=|<|>|=|CONTAINS|STARTS WITH|ENDS WITH|STARTS|ENDS)";
    Regex::new(&format!(
        r#""(?P<left>[^\s]*)"\s*{ops}\s*id|[^_]+id\s*{ops}\s*"(?P<right>[^\s]*)""#,
        ops = OPS
    ))
    .expect("id literal regex is valid")
});

/// The per-database filters produced for one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterRewrite {
    /// Filter to send to each database; `None` means no filter.
    pub filters: BTreeMap<String, Option<String>>,
    /// Non-fatal problems found while rewriting.
    pub warnings: Vec<OptimadeWarning>,
}

impl FilterRewrite {
    /// The filter for one database.
    pub fn filter_for(&self, database_id: &str) -> Option<&str> {
        self.filters.get(database_id).and_then(|f| f.as_deref())
    }
}

/// Rewrites one filter into a filter per database.
pub fn rewrite<S: AsRef<str>>(database_ids: &[S], filter: Option<&str>) -> FilterRewrite {
    let filter = filter.filter(|f| !f.trim().is_empty());
    let mut filters: BTreeMap<String, Option<String>> = database_ids
        .iter()
        .map(|id| (id.as_ref().to_string(), filter.map(String::from)))
        .collect();

    let Some(filter) = filter else {
        return FilterRewrite {
            filters,
            warnings: Vec::new(),
        };
    };

    // The leading '=' lets an `id` at the very start of the filter match.
    let text = format!("={}", filter);
    let matches: Vec<regex::Match<'_>> = ID_LITERAL
        .captures_iter(&text)
        .filter_map(|caps| caps.name("left").or_else(|| caps.name("right")))
        .collect();

    let mut warnings = Vec::new();
    if matches.is_empty() {
        return FilterRewrite { filters, warnings };
    }

    for literal in &matches {
        if let Some(database_id) = owning_database(database_ids, literal.as_str()) {
            // Offsets in `text` are one past those in `filter`.
            let start = literal.start() - 1;
            let end = start + database_id.len() + 1;
            if let Some(slot) = filters.get_mut(database_id) {
                *slot = Some(format!("{}{}", &filter[..start], &filter[end..]));
            }
            return FilterRewrite { filters, warnings };
        }
    }

    let literals: Vec<&str> = matches.iter().map(|m| m.as_str()).collect();
    let candidates: Vec<&str> = database_ids.iter().map(AsRef::as_ref).collect();
    let detail = format!(
        "The passed entry ID(s) {:?} may be ambiguous. To get a specific entry, prepend the \
         ID with one of the gateway's database IDs followed by a forward slash, e.g. \
         '<database_id>/<local_id>'. Available database IDs: {:?}",
        literals, candidates
    );
    warn!(literals = ?literals, databases = ?candidates, "Ambiguous entry id in filter");
    warnings.push(OptimadeWarning::new("Non-Unique Entry ID", detail));
    FilterRewrite { filters, warnings }
}

/// The known database whose `<id>/` prefix the literal carries; the longest
/// match wins since database ids may themselves contain `/`.
fn owning_database<'a, S: AsRef<str>>(database_ids: &'a [S], literal: &str) -> Option<&'a str> {
    database_ids
        .iter()
        .map(AsRef::as_ref)
        .filter(|id| {
            literal.len() > id.len() && literal.starts_with(id) && literal[id.len()..].starts_with('/')
        })
        .max_by_key(|id| id.len())
}
