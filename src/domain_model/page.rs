use serde::Serialize;

pub const MAX_PAGE_SIZE: u16 = 100;

/// Only built through [`PageRequest::new`], which clamps the size.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PageRequest {
    /// Zero-based.
    pub page: u32,
    pub size: u16,
}

impl PageRequest {
    pub fn new(page: u32, size: u16) -> Self {
        PageRequest {
            page,
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        self.page as u64 * self.size as u64
    }

    pub fn limit(&self) -> usize {
        self.size as usize
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(0, 20)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slice<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u16,
    pub has_next: bool,
}

impl<T> Slice<T> {
    pub fn empty(request: PageRequest) -> Self {
        Slice {
            content: Vec::new(),
            page: request.page,
            size: request.size,
            has_next: false,
        }
    }

    /// Builds a slice from `limit + 1` fetched rows, trimming the extra row.
    pub fn from_lookahead(mut rows: Vec<T>, request: PageRequest) -> Self {
        let has_next = rows.len() > request.limit();
        rows.truncate(request.limit());
        Slice {
            content: rows,
            page: request.page,
            size: request.size,
            has_next,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Slice<U> {
        Slice {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            has_next: self.has_next,
        }
    }
}
