//! Paging parameter validation for "Feature by source, paged" (spec.md §4.3,
//! §9 Open Question (iii)): `limit ∈ [1, 10_000]`, default 100; `offset`
//! default 0.

use crate::error::{Error, Result};

pub const DEFAULT_LIMIT: i64 = 100;
pub const DEFAULT_OFFSET: i64 = 0;
pub const MAX_LIMIT: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        let offset = offset.unwrap_or(DEFAULT_OFFSET);

        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(Error::invalid_input(format!(
                "limit must be in [1, {MAX_LIMIT}], got {limit}"
            )));
        }
        if offset < 0 {
            return Err(Error::invalid_input(format!(
                "offset must be non-negative, got {offset}"
            )));
        }

        Ok(Page { limit, offset })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let page = Page::new(None, None).unwrap();
        assert_eq!(page.limit, 100);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn rejects_limit_out_of_range() {
        assert!(Page::new(Some(0), None).is_err());
        assert!(Page::new(Some(10_001), None).is_err());
    }

    #[test]
    fn accepts_max_limit() {
        assert!(Page::new(Some(10_000), None).is_ok());
    }

    #[test]
    fn rejects_negative_offset() {
        assert!(Page::new(None, Some(-1)).is_err());
    }
}
