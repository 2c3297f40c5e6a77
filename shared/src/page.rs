//! Offset pagination
//!
//! The storefront API pages with `limit` + `offset` query parameters.
//! A page shorter than `limit` means the server has no more rows.

use serde::{Deserialize, Serialize};

/// Page request - one `limit`/`offset` window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page size
    pub limit: usize,
    /// Number of rows to skip
    pub offset: usize,
}

impl PageRequest {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// First page of the given size
    pub fn first(limit: usize) -> Self {
        Self { limit, offset: 0 }
    }

    /// The window right after this one
    pub fn next(self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset + self.limit,
        }
    }

    /// Whether a page of `len` rows returned for this request is the last one
    pub fn is_last_page(&self, len: usize) -> bool {
        len < self.limit
    }

    /// Query string pairs
    pub fn query(&self) -> [(&'static str, String); 2] {
        [
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ]
    }
}
