/// One page to fetch: its zero-based index and full URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub index: u64,
    pub url: String,
}

/// Finite, single-pass sequence of page requests `0..page_count` against a collection URL.
#[derive(Debug)]
pub struct Paginator {
    base: String,
    next: u64,
    page_count: u64,
}

impl Paginator {
    pub fn new(base: impl Into<String>, page_count: u64) -> Self {
        Self {
            base: base.into(),
            next: 0,
            page_count,
        }
    }

    pub fn page_count(&self) -> u64 {
        self.page_count
    }
}

pub fn page_url(base: &str, index: u64) -> String {
    format!("{base}/?page={index}")
}

impl Iterator for Paginator {
    type Item = PageRequest;

    fn next(&mut self) -> Option<PageRequest> {
        if self.next >= self.page_count {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(PageRequest {
            index,
            url: page_url(&self.base, index),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = usize::try_from(self.page_count - self.next).unwrap_or(usize::MAX);
        (left, Some(left))
    }
}
