//! Page-number pagination shared by list endpoints.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    /// Client override for the page size, capped at [`MAX_PAGE_SIZE`].
    pub limit: Option<u32>,
}

impl PageParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE))
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * self.limit()
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, params: &PageParams) -> Self {
        Self { data, total, page: params.page() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = PageParams::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 20);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn limit_is_clamped() {
        let p = PageParams { page: None, limit: Some(500) };
        assert_eq!(p.limit(), 100);
        let p = PageParams { page: None, limit: Some(0) };
        assert_eq!(p.limit(), 1);
    }

    #[test]
    fn page_floor_and_offset() {
        let p = PageParams { page: Some(0), limit: None };
        assert_eq!(p.page(), 1);
        let p = PageParams { page: Some(3), limit: Some(25) };
        assert_eq!(p.offset(), 50);
    }
}
