//! Filter and page construction for advertisement search.
//!
//! Every active predicate is joined with the same combinator; AND and OR
//! are never mixed in one query.

use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};

use crate::error::ApiError;

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    #[default]
    And,
    Or,
}

impl SearchMode {
    fn joiner(self) -> &'static str {
        match self {
            SearchMode::And => " AND ",
            SearchMode::Or => " OR ",
        }
    }
}

impl FromStr for SearchMode {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(SearchMode::And),
            "OR" => Ok(SearchMode::Or),
            other => Err(ApiError::validation(format!(
                "search_mode must be AND or OR, got {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub mode: SearchMode,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price_min.is_none()
            && self.price_max.is_none()
    }

    /// Append ` WHERE (...)` for the active predicates, or nothing.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if self.is_empty() {
            return;
        }

        qb.push(" WHERE (");
        {
            let mut preds = qb.separated(self.mode.joiner());
            if let Some(title) = &self.title {
                preds.push("title ILIKE ");
                preds.push_bind_unseparated(contains_pattern(title));
            }
            if let Some(description) = &self.description {
                preds.push("description ILIKE ");
                preds.push_bind_unseparated(contains_pattern(description));
            }
            if let Some(min) = self.price_min {
                preds.push("price >= ");
                preds.push_bind_unseparated(min);
            }
            if let Some(max) = self.price_max {
                preds.push("price <= ");
                preds.push_bind_unseparated(max);
            }
        }
        qb.push(")");
    }
}

/// `%needle%` with LIKE metacharacters in `needle` matched literally.
fn contains_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Page {
    pub fn has_more(&self, returned: usize, total: i64) -> bool {
        self.offset + (returned as i64) < total
    }
}
