//! LIMIT/OFFSET pagination helpers shared by every list endpoint.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 50;

/// Parsed `?page=&limit=` query values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl PageParams {
    /// Parse raw query strings. Invalid or missing values fall back to
    /// page 1 / limit 10 and are clamped to `page >= 1`, `1 <= limit <= 50`
    /// rather than rejected.
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.parse::<i64>().ok())
            .unwrap_or(1)
            .max(1);
        let limit = limit
            .and_then(|l| l.parse::<i64>().ok())
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Pagination block attached to list responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(total: i64, params: PageParams) -> Self {
        Self {
            page: params.page,
            limit: params.limit,
            total,
            total_pages: (total + params.limit - 1) / params.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_missing() {
        let params = PageParams::parse(None, None);
        assert_eq!(params, PageParams { page: 1, limit: 10 });
    }

    #[test]
    fn clamps_out_of_range_values() {
        let params = PageParams::parse(Some("0"), Some("999"));
        assert_eq!(params, PageParams { page: 1, limit: 50 });
    }

    #[test]
    fn falls_back_on_garbage() {
        let params = PageParams::parse(Some("abc"), Some("-3"));
        assert_eq!(params, PageParams { page: 1, limit: 1 });
    }

    #[test]
    fn offset_math() {
        assert_eq!(PageParams { page: 1, limit: 10 }.offset(), 0);
        assert_eq!(PageParams { page: 3, limit: 10 }.offset(), 20);
    }

    #[test]
    fn meta_rounds_total_pages_up() {
        let params = PageParams { page: 1, limit: 10 };
        assert_eq!(PageMeta::new(21, params).total_pages, 3);
        assert_eq!(PageMeta::new(0, params).total_pages, 0);
    }
}
