/// Page size, measured in contract groups.
pub const ITEMS_PER_PAGE: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    current_page: usize,
    items_per_page: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationState {
    pub fn new() -> Self {
        Self {
            current_page: 1,
            items_per_page: ITEMS_PER_PAGE,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn total_pages(&self, item_count: usize) -> usize {
        item_count.div_ceil(self.items_per_page)
    }

    /// 每次渲染前夾回 `[1, total_pages]`
    pub fn clamp(&mut self, item_count: usize) {
        let total = self.total_pages(item_count);
        self.current_page = self.current_page.clamp(1, total.max(1));
    }

    /// Moves to `page`; pages outside `[1, total_pages]` are ignored.
    pub fn go_to(&mut self, page: usize, item_count: usize) -> bool {
        let total = self.total_pages(item_count);
        if page < 1 || page > total {
            tracing::debug!("Ignoring navigation to page {} (total {})", page, total);
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn next(&mut self, item_count: usize) -> bool {
        self.go_to(self.current_page + 1, item_count)
    }

    pub fn previous(&mut self, item_count: usize) -> bool {
        match self.current_page.checked_sub(1) {
            Some(page) => self.go_to(page, item_count),
            None => false,
        }
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<'_, T> {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn label(&self) -> String {
        format!("Página {} de {}", self.page, self.total_pages)
    }
}

/// Clamps the state and returns the slice for the current page.
pub fn paginate<'a, T>(items: &'a [T], state: &mut PaginationState) -> Page<'a, T> {
    state.clamp(items.len());
    let total_pages = state.total_pages(items.len());
    let start = ((state.current_page - 1) * state.items_per_page).min(items.len());
    let end = (start + state.items_per_page).min(items.len());

    Page {
        items: &items[start..end],
        // 沒有資料時回報第 0 頁
        page: if total_pages == 0 { 0 } else { state.current_page },
        total_pages,
        total_items: items.len(),
    }
}
