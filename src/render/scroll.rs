// Scroll state for a log surface
//
// Tracks the offset (row index at the top of the viewport) against the number
// of rows and the viewport height. The viewport is only known once the surface
// has been painted, so offsets requested before that are kept as-is and
// clamped on the next `update_dimensions`.

/// Scroll state for a single surface
#[derive(Debug, Clone, Default)]
pub struct ScrollState {
    /// Current scroll offset (row index at top of viewport)
    offset: usize,

    /// Total number of rows in the surface
    total: usize,

    /// Number of rows visible in viewport (0 until first paint)
    viewport: usize,
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update content and viewport dimensions
    /// Call this each render frame with current sizes
    pub fn update_dimensions(&mut self, total: usize, viewport: usize) {
        self.total = total;
        self.viewport = viewport;
        self.clamp();
    }

    /// Row count changed (viewport unchanged)
    pub fn set_total(&mut self, total: usize) {
        self.total = total;
        self.clamp();
    }

    /// Scroll up by `n` rows
    pub fn scroll_up(&mut self, n: usize) {
        self.offset = self.offset.min(self.max_offset()).saturating_sub(n);
    }

    /// Scroll down by `n` rows
    pub fn scroll_down(&mut self, n: usize) {
        self.offset = (self.offset + n).min(self.max_offset());
    }

    /// Scroll up by a page
    pub fn page_up(&mut self) {
        self.scroll_up(self.viewport.max(1));
    }

    /// Scroll down by a page
    pub fn page_down(&mut self) {
        self.scroll_down(self.viewport.max(1));
    }

    /// Jump to top
    pub fn scroll_to_top(&mut self) {
        self.offset = 0;
    }

    /// Keep the most recent row visible
    pub fn pin_to_bottom(&mut self) {
        self.offset = if self.viewport > 0 {
            self.max_offset()
        } else {
            // Not painted yet; clamp lands on the bottom once the viewport is known
            self.total
        };
    }

    /// Restore an absolute offset (clamped to the content)
    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
        self.clamp();
    }

    /// Get current scroll offset
    pub fn offset(&self) -> usize {
        self.offset.min(self.total)
    }

    /// Whether the viewport is within `threshold` rows of the bottom
    pub fn is_near_bottom(&self, threshold: usize) -> bool {
        self.max_offset().saturating_sub(self.offset) <= threshold
    }

    /// Get visible range (start_index, end_index)
    pub fn visible_range(&self) -> (usize, usize) {
        let start = self.offset();
        let end = (start + self.viewport).min(self.total);
        (start, end)
    }

    /// Check if content overflows viewport (scrollbar needed)
    pub fn needs_scrollbar(&self) -> bool {
        self.viewport > 0 && self.total > self.viewport
    }

    /// Maximum valid offset
    fn max_offset(&self) -> usize {
        self.total.saturating_sub(self.viewport)
    }

    fn clamp(&mut self) {
        if self.viewport > 0 {
            self.offset = self.offset.min(self.max_offset());
        }
    }

    /// Get total content size
    pub fn total(&self) -> usize {
        self.total
    }

    /// Get viewport size
    pub fn viewport(&self) -> usize {
        self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_before_first_paint_lands_on_bottom() {
        let mut scroll = ScrollState::new();
        scroll.set_total(50);
        scroll.pin_to_bottom();

        // First paint reveals a 10-row viewport
        scroll.update_dimensions(50, 10);
        assert_eq!(scroll.offset(), 40);
        assert!(scroll.is_near_bottom(0));
    }

    #[test]
    fn test_scroll_up_and_down() {
        let mut scroll = ScrollState::new();
        scroll.update_dimensions(20, 5);
        scroll.pin_to_bottom();
        assert_eq!(scroll.offset(), 15);

        scroll.scroll_up(1);
        assert_eq!(scroll.offset(), 14);

        scroll.scroll_down(10);
        assert_eq!(scroll.offset(), 15); // Clamped at bottom
    }

    #[test]
    fn test_near_bottom_threshold() {
        let mut scroll = ScrollState::new();
        scroll.update_dimensions(100, 10);
        scroll.set_offset(88);
        assert!(scroll.is_near_bottom(2));
        scroll.set_offset(87);
        assert!(!scroll.is_near_bottom(2));
    }

    #[test]
    fn test_visible_range() {
        let mut scroll = ScrollState::new();
        scroll.update_dimensions(100, 10);
        scroll.pin_to_bottom();

        let (start, end) = scroll.visible_range();
        assert_eq!(start, 90);
        assert_eq!(end, 100);

        scroll.scroll_to_top();
        let (start, end) = scroll.visible_range();
        assert_eq!(start, 0);
        assert_eq!(end, 10);
    }

    #[test]
    fn test_offset_clamped_when_content_shrinks() {
        let mut scroll = ScrollState::new();
        scroll.update_dimensions(100, 10);
        scroll.set_offset(60);
        scroll.set_total(30);
        assert_eq!(scroll.offset(), 20);
    }

    #[test]
    fn test_page_navigation() {
        let mut scroll = ScrollState::new();
        scroll.update_dimensions(100, 10);
        scroll.page_down();
        assert_eq!(scroll.offset(), 10);
        scroll.page_up();
        scroll.page_up();
        assert_eq!(scroll.offset(), 0);
    }
}
