use serde::{Deserialize, Serialize};

/// Pagination parameters. `sort` uses the `<attribute>_ASC|DESC` convention.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Pageable {
    #[serde(default)]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub size: u64,
    #[serde(default)]
    pub sort: Option<String>,
}

fn default_page_size() -> u64 {
    20
}

impl Default for Pageable {
    fn default() -> Self {
        Self {
            page: 0,
            size: default_page_size(),
            sort: None,
        }
    }
}

impl Pageable {
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page,
            size,
            sort: None,
        }
    }

    pub fn sorted(mut self, sort: &str) -> Self {
        self.sort = Some(sort.to_string());
        self
    }

    /// Rows to skip. Saturates instead of overflowing on huge page numbers.
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

/// A page of results with pagination metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, pageable: &Pageable, total_elements: u64) -> Self {
        let total_pages = if pageable.size == 0 {
            0
        } else {
            total_elements.div_ceil(pageable.size)
        };
        Self {
            content,
            page: pageable.page,
            size: pageable.size,
            total_elements,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_apply_when_deserializing() {
        let pageable: Pageable = serde_json::from_value(json!({ "page": 2 })).unwrap();
        assert_eq!(pageable.size, 20);
        assert_eq!(pageable.offset(), 40);
    }

    #[test]
    fn offset_saturates_on_huge_page() {
        let pageable: Pageable =
            serde_json::from_value(json!({ "page": u64::MAX, "size": 20 })).unwrap();
        assert_eq!(pageable.offset(), u64::MAX);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Page::new(vec![1, 2], &Pageable::new(0, 2), 5);
        assert_eq!(page.total_pages, 3);
        let empty: Page<i32> = Page::new(vec![], &Pageable::new(0, 0), 5);
        assert_eq!(empty.total_pages, 0);
    }
}
