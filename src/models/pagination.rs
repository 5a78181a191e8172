//! 分页相关的数据结构

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::raffle::WinRecord;

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 500;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct PaginationParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: Some(1),
            page_size: Some(DEFAULT_PAGE_SIZE),
        }
    }
}

impl PaginationParams {
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.map(|p| p as u64),
            page_size: per_page.map(|p| p as u64),
        }
    }

    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn get_offset(&self) -> u64 {
        (self.page() - 1) * self.page_size()
    }

    pub fn get_limit(&self) -> u64 {
        self.page_size()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[aliases(PaginatedWinRecords = PaginatedResponse<WinRecord>)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, params: &PaginationParams, total: u64) -> Self {
        let page_size = params.page_size();
        Self {
            data,
            page: params.page(),
            page_size,
            total,
            total_pages: total.div_ceil(page_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_and_clamp() {
        let params = PaginationParams::new(None, None);
        assert_eq!(params.get_offset(), 0);
        assert_eq!(params.get_limit(), 50);

        let params = PaginationParams::new(Some(0), Some(10_000));
        assert_eq!(params.page(), 1);
        assert_eq!(params.get_limit(), 500);
    }

    #[test]
    fn test_total_pages() {
        let params = PaginationParams::new(Some(3), Some(10));
        let page: PaginatedResponse<u8> = PaginatedResponse::new(vec![], &params, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(params.get_offset(), 20);
    }
}
