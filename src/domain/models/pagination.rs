use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_number: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Clamps raw query values: page number to at least 1, page size to `1..=MAX_PAGE_SIZE`.
    pub fn normalize(page_number: Option<i64>, page_size: Option<i64>) -> Self {
        let page_number = page_number.filter(|n| *n >= 1).unwrap_or(1);
        let page_size = match page_size {
            Some(size) if size >= 1 => size.min(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        };
        Self { page_number, page_size }
    }

    pub fn offset(&self) -> i64 {
        (self.page_number - 1) * self.page_size
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: i64,
    pub page_size: i64,
    pub total_count: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_count: i64) -> Self {
        Self {
            items,
            page_number: request.page_number,
            page_size: request.page_size,
            total_count,
        }
    }

    pub fn total_pages(&self) -> i64 {
        if self.total_count == 0 {
            0
        } else {
            (self.total_count + self.page_size - 1) / self.page_size
        }
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }
}

/// Resolves the SQL direction keyword. An explicit sort key defaults to ascending.
pub fn sort_direction(sort_order: Option<&str>) -> &'static str {
    match sort_order.map(|s| s.to_ascii_lowercase()) {
        Some(order) if order == "desc" => "DESC",
        _ => "ASC",
    }
}
