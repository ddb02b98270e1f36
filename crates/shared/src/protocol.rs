use serde::{Deserialize, Serialize};

/// Page size the catalog screens request by default.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// One bounded slice of a remote collection, addressed by item offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: u64,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(offset: u64, page_size: u32) -> Self {
        Self {
            offset,
            page_size: page_size.max(1),
        }
    }

    /// Request for the nth zero-based page.
    pub fn for_page(page: u32, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        Self {
            offset: u64::from(page) * u64::from(page_size),
            page_size,
        }
    }
}

/// Query-string shape the remote API expects (`?limit=10&skip=20`).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageQuery {
    pub limit: u32,
    pub skip: u64,
}

impl From<PageRequest> for PageQuery {
    fn from(request: PageRequest) -> Self {
        Self {
            limit: request.page_size,
            skip: request.offset,
        }
    }
}

/// Decoded page payload: the item slice plus the collection size the server
/// reported alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
}
