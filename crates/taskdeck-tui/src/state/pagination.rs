/// `ceil(total_count / limit)`; zero when `limit` is zero.
pub fn total_pages(total_count: usize, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    total_count.div_ceil(limit as usize) as u32
}

/// 1-indexed page cursor. `total_count` comes from the count query, not from
/// the page that is on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_count: usize,
}

impl Pagination {
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            total_count: 0,
        }
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.total_count, self.limit)
    }

    pub fn set_total(&mut self, total_count: usize) {
        self.total_count = total_count;
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    pub fn first(&mut self) -> bool {
        self.set_page(1)
    }

    /// Stays on page 1 while nothing is counted yet.
    pub fn last(&mut self) -> bool {
        self.set_page(self.total_pages().max(1))
    }

    pub fn next(&mut self) -> bool {
        self.page < self.total_pages() && self.set_page(self.page + 1)
    }

    pub fn prev(&mut self) -> bool {
        self.page > 1 && self.set_page(self.page - 1)
    }

    /// Pull the page back inside `1..=total_pages` after the total shrank.
    pub fn clamp(&mut self) -> bool {
        let last = self.total_pages().max(1);
        self.page > last && self.set_page(last)
    }

    /// Jump to `page` if it exists.
    pub fn go_to(&mut self, page: u32) -> bool {
        if page < 1 || page > self.total_pages() {
            return false;
        }
        self.set_page(page)
    }

    fn set_page(&mut self, page: u32) -> bool {
        let changed = self.page != page;
        self.page = page;
        changed
    }
}
