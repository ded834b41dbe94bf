//! # Pagination Sources
//!
//! Where lines go. A [`PaginationSource`] hands out successive,
//! non-overlapping rectangles; the flow loop asks for one per line and
//! stops when the source runs dry.

use crate::model::{Rect, Size};

/// Stateful supplier of layout areas.
pub trait PaginationSource {
    /// Start over on a fresh page of `page_size`.
    fn reset(&mut self, page_size: Size);

    /// Next area at least `requested_height` tall, or `None` when the page
    /// is full.
    fn next_area(&mut self, requested_height: f32) -> Option<Rect>;
}

/// Stacks areas top-down, optionally across several equal columns.
#[derive(Debug, Clone)]
pub struct StackedAreaSource {
    size: Size,
    columns: usize,
    column_gap: f32,
    column: usize,
    y: f32,
}

impl Default for StackedAreaSource {
    fn default() -> Self {
        Self::new()
    }
}

impl StackedAreaSource {
    /// A single full-width column.
    pub fn new() -> Self {
        Self::with_columns(1, 0.0)
    }

    pub fn with_columns(columns: usize, column_gap: f32) -> Self {
        Self {
            size: Size::default(),
            columns: columns.max(1),
            column_gap: column_gap.max(0.0),
            column: 0,
            y: 0.0,
        }
    }

    fn column_width(&self) -> f32 {
        let gaps = self.column_gap * (self.columns - 1) as f32;
        ((self.size.width - gaps) / self.columns as f32).max(0.0)
    }
}

impl PaginationSource for StackedAreaSource {
    fn reset(&mut self, page_size: Size) {
        self.size = page_size;
        self.column = 0;
        self.y = 0.0;
    }

    fn next_area(&mut self, requested_height: f32) -> Option<Rect> {
        if requested_height > self.size.height {
            return None;
        }
        if self.y + requested_height > self.size.height {
            self.column += 1;
            self.y = 0.0;
        }
        if self.column >= self.columns {
            return None;
        }

        let width = self.column_width();
        let left = self.column as f32 * (width + self.column_gap);
        let rect = Rect::new(left, self.y, left + width, self.y + requested_height);
        self.y += requested_height;
        Some(rect)
    }
}
