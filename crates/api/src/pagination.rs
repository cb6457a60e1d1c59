//! List query parameters and pagination envelope.
//!
//! Every list endpoint deserializes [`ListParams`] from the query string and
//! returns a [`Paginated`] envelope. Sorting is whitelist-based: the client
//! sends logical sort keys (comma-separated, `-` prefix for descending) and
//! each repository maps them onto real columns, so user input never reaches
//! SQL identifiers.

use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_LIMIT: u32 = 20;

/// Maximum page size.
pub const MAX_LIMIT: u32 = 100;

/// Common list query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size, clamped to `1..=MAX_LIMIT`.
    pub limit: Option<u32>,
    /// Comma-separated sort keys; `-` prefix sorts descending.
    pub sort: Option<String>,
    /// Keyword search over the resource's searchable columns.
    pub keyword: Option<String>,
    /// Include soft-deleted rows. Honored only on staff routes.
    pub include_deleted: Option<bool>,
}

impl ListParams {
    /// Effective page number (>= 1).
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Effective page size (1..=[`MAX_LIMIT`]).
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// SQL LIMIT value.
    #[must_use]
    pub fn sql_limit(&self) -> i64 {
        i64::from(self.limit())
    }

    /// SQL OFFSET value.
    #[must_use]
    pub fn sql_offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.limit())
    }

    /// Whether soft-deleted rows were requested (staff routes only).
    #[must_use]
    pub fn include_deleted(&self) -> bool {
        self.include_deleted.unwrap_or(false)
    }

    /// ILIKE pattern for the keyword, with `%`/`_` escaped.
    ///
    /// Returns `None` when no keyword was given or it is blank.
    #[must_use]
    pub fn keyword_pattern(&self) -> Option<String> {
        let keyword = self.keyword.as_deref()?.trim();
        if keyword.is_empty() {
            return None;
        }
        Some(format!("%{}%", escape_like(keyword)))
    }

    /// Build an `ORDER BY` clause from the whitelisted sort keys.
    ///
    /// `whitelist` maps logical sort keys to column expressions. Unknown keys
    /// are ignored; when nothing valid remains, `default` is used. The output
    /// contains only whitelisted column expressions, never client input.
    #[must_use]
    pub fn order_by(&self, whitelist: &[(&str, &str)], default: &str) -> String {
        let mut clauses = Vec::new();

        if let Some(sort) = self.sort.as_deref() {
            for key in sort.split(',').map(str::trim).filter(|k| !k.is_empty()) {
                let (key, direction) = key
                    .strip_prefix('-')
                    .map_or((key, "ASC"), |stripped| (stripped, "DESC"));

                if let Some((_, column)) = whitelist.iter().find(|(k, _)| *k == key) {
                    clauses.push(format!("{column} {direction}"));
                }
            }
        }

        if clauses.is_empty() {
            format!("ORDER BY {default}")
        } else {
            format!("ORDER BY {}", clauses.join(", "))
        }
    }
}

/// Escape `%`, `_`, and `\` for use inside a LIKE/ILIKE pattern.
#[must_use]
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Paginated response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    /// The page of results.
    pub data: Vec<T>,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Total matching rows.
    pub total: i64,
    /// Total pages at this page size.
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    /// Assemble an envelope from a page of rows and the total count.
    #[must_use]
    pub fn new(data: Vec<T>, params: &ListParams, total: i64) -> Self {
        let limit = params.limit();
        let total_pages = if total == 0 {
            0
        } else {
            (total + i64::from(limit) - 1) / i64::from(limit)
        };
        Self {
            data,
            page: params.page(),
            limit,
            total,
            total_pages,
        }
    }

    /// Map the data while keeping page metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<u32>, limit: Option<u32>, sort: Option<&str>) -> ListParams {
        ListParams {
            page,
            limit,
            sort: sort.map(str::to_owned),
            keyword: None,
            include_deleted: None,
        }
    }

    const WHITELIST: &[(&str, &str)] = &[
        ("name", "name"),
        ("created_at", "created_at"),
        ("price", "price"),
    ];

    #[test]
    fn test_defaults() {
        let p = params(None, None, None);
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), DEFAULT_LIMIT);
        assert_eq!(p.sql_offset(), 0);
    }

    #[test]
    fn test_limit_clamped() {
        assert_eq!(params(None, Some(0), None).limit(), 1);
        assert_eq!(params(None, Some(500), None).limit(), MAX_LIMIT);
    }

    #[test]
    fn test_offset() {
        let p = params(Some(3), Some(25), None);
        assert_eq!(p.sql_offset(), 50);
        assert_eq!(p.sql_limit(), 25);
    }

    #[test]
    fn test_order_by_default() {
        let p = params(None, None, None);
        assert_eq!(
            p.order_by(WHITELIST, "created_at DESC"),
            "ORDER BY created_at DESC"
        );
    }

    #[test]
    fn test_order_by_whitelisted() {
        let p = params(None, None, Some("-price,name"));
        assert_eq!(
            p.order_by(WHITELIST, "created_at DESC"),
            "ORDER BY price DESC, name ASC"
        );
    }

    #[test]
    fn test_order_by_rejects_unknown_keys() {
        // Injection attempt: unknown keys never reach the clause.
        let p = params(None, None, Some("name;DROP TABLE x,--,price"));
        assert_eq!(
            p.order_by(WHITELIST, "created_at DESC"),
            "ORDER BY price ASC"
        );
    }

    #[test]
    fn test_keyword_pattern_escapes_wildcards() {
        let p = ListParams {
            keyword: Some("50%_off".to_owned()),
            ..ListParams::default()
        };
        assert_eq!(p.keyword_pattern().as_deref(), Some("%50\\%\\_off%"));
    }

    #[test]
    fn test_keyword_pattern_blank_is_none() {
        let p = ListParams {
            keyword: Some("   ".to_owned()),
            ..ListParams::default()
        };
        assert!(p.keyword_pattern().is_none());
    }

    #[test]
    fn test_paginated_total_pages() {
        let p = params(Some(1), Some(20), None);
        let page = Paginated::new(vec![1, 2, 3], &p, 41);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total, 41);

        let empty: Paginated<i32> = Paginated::new(vec![], &p, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
