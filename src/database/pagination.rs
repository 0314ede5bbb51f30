use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

use super::error::StoreError;

/// Page size limits, taken from `Config` and handed to every listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSettings {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_SIZE,
            max_limit: MAX_PAGE_SIZE,
        }
    }
}

impl PageSettings {
    /// Resolves optional `page`/`limit` query values. Out of range values are
    /// clamped rather than rejected. `page` is capped so the offset fits an
    /// `i64`; such a page is past the end of any listing.
    pub fn request(&self, page: Option<i64>, limit: Option<i64>) -> PageRequest {
        let limit = limit
            .filter(|limit| *limit > 0)
            .unwrap_or(self.default_limit)
            .min(self.max_limit)
            .max(1);
        let page = page
            .filter(|page| *page > 0)
            .unwrap_or(1)
            .min(i64::MAX / limit);

        PageRequest { page, limit }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, request: PageRequest) -> Self {
        let last_page = if total_rows == 0 {
            1
        } else {
            (total_rows + request.limit - 1) / request.limit
        };

        Self {
            count: total_rows,
            next: (request.page < last_page).then_some(request.page + 1),
            previous: (request.page > 1).then(|| (request.page - 1).min(last_page)),
            results: rows,
        }
    }

    /// Like `from_rows`, but a page past the end is an error.
    pub fn checked(rows: Vec<T>, total_rows: i64, request: PageRequest) -> Result<Self, StoreError> {
        if rows.is_empty() && request.page > 1 {
            return Err(StoreError::NotFound("page"));
        }
        Ok(Self::from_rows(rows, total_rows, request))
    }

    /// Same page metadata around converted results.
    pub fn with_results<U>(self, results: Vec<U>) -> Page<U> {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results,
        }
    }
}
