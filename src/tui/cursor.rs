// Scrolling selection over the projected items.

/// Selection is `first_visible + selected_row`; `selected_row` is the offset
/// inside a viewport of `height` rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCursor {
    first_visible: usize,
    selected_row: usize,
    height: usize,
    len: usize,
}

impl ListCursor {
    pub fn new(height: usize) -> Self {
        Self {
            first_visible: 0,
            selected_row: 0,
            height: height.max(1),
            len: 0,
        }
    }

    pub fn first_visible(&self) -> usize {
        self.first_visible
    }

    pub fn selected_row(&self) -> usize {
        self.selected_row
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn selected_index(&self) -> usize {
        self.first_visible + self.selected_row
    }

    /// `None` when there is nothing to select.
    pub fn selection(&self) -> Option<usize> {
        (self.len > 0).then(|| self.selected_index())
    }

    pub fn up(&mut self) {
        if self.selected_row > 0 {
            self.selected_row -= 1;
        } else if self.first_visible > 0 {
            self.first_visible -= 1;
        }
    }

    pub fn down(&mut self) {
        if self.len == 0 || self.selected_index() + 1 >= self.len {
            return;
        }
        if self.selected_row + 1 < self.height {
            self.selected_row += 1;
        } else {
            self.first_visible += 1;
        }
    }

    pub fn top(&mut self) {
        self.first_visible = 0;
        self.selected_row = 0;
    }

    pub fn page_down(&mut self) {
        for _ in 0..self.height {
            self.down();
        }
    }

    pub fn page_up(&mut self) {
        for _ in 0..self.height {
            self.up();
        }
    }

    /// Follows a change in item count, pulling the selection back onto the
    /// last item when it fell off the end.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if len == 0 {
            self.top();
            return;
        }
        while self.selected_index() >= len {
            self.up();
        }
    }

    /// Follows a terminal resize, keeping the same item selected.
    pub fn set_height(&mut self, height: usize) {
        let height = height.max(1);
        if self.selected_row >= height {
            let shift = self.selected_row - (height - 1);
            self.first_visible += shift;
            self.selected_row = height - 1;
        }
        self.height = height;
    }
}
