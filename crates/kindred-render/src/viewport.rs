//! Drag-to-pan viewport for the tree view.
//!
//! A press followed by movement past the drag threshold pans the content;
//! a press released without crossing it is an ordinary click. A click
//! that ends a drag is swallowed once so panning never opens a member.

use serde::{Deserialize, Serialize};

/// Movement in pixels a press must exceed on either axis to become a drag.
pub const DRAG_THRESHOLD_PX: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Content and visible sizes of the scroll container.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollExtent {
    pub content_width: f64,
    pub content_height: f64,
    pub client_width: f64,
    pub client_height: f64,
}

impl ScrollExtent {
    pub fn new(content_width: f64, content_height: f64, client_width: f64, client_height: f64) -> Self {
        Self {
            content_width,
            content_height,
            client_width,
            client_height,
        }
    }

    /// Largest scroll offset on each axis.
    pub fn max_scroll(&self) -> Point {
        Point {
            x: (self.content_width - self.client_width).max(0.0),
            y: (self.content_height - self.client_height).max(0.0),
        }
    }

    fn clamp(&self, scroll: Point) -> Point {
        let max = self.max_scroll();
        Point {
            x: scroll.x.clamp(0.0, max.x),
            y: scroll.y.clamp(0.0, max.y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragState {
    #[default]
    Idle,
    /// Button down, not yet past the threshold.
    Pressed,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickOutcome {
    /// Follow the clicked link.
    Navigate,
    /// The click ended a drag and is swallowed.
    Suppressed,
}

/// Cursor hint for the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cursor {
    Grab,
    Grabbing,
}

#[derive(Debug, Clone)]
pub struct Viewport {
    state: DragState,
    extent: ScrollExtent,
    scroll: Point,
    origin: Point,
    scroll_start: Point,
    has_dragged: bool,
    threshold: f64,
}

impl Viewport {
    pub fn new(extent: ScrollExtent) -> Self {
        Self {
            state: DragState::Idle,
            extent,
            scroll: Point::default(),
            origin: Point::default(),
            scroll_start: Point::default(),
            has_dragged: false,
            threshold: DRAG_THRESHOLD_PX,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn scroll(&self) -> Point {
        self.scroll
    }

    pub fn extent(&self) -> ScrollExtent {
        self.extent
    }

    pub fn cursor(&self) -> Cursor {
        match self.state {
            DragState::Idle => Cursor::Grab,
            DragState::Pressed | DragState::Dragging => Cursor::Grabbing,
        }
    }

    /// Updates the sizes after a re-render, keeping the offset in range.
    pub fn set_extent(&mut self, extent: ScrollExtent) {
        self.extent = extent;
        self.scroll = extent.clamp(self.scroll);
    }

    pub fn scroll_to(&mut self, scroll: Point) {
        self.scroll = self.extent.clamp(scroll);
    }

    /// Centers the content horizontally. Called on first render and
    /// whenever the root set changes.
    pub fn center_horizontally(&mut self) {
        let x = (self.extent.content_width - self.extent.client_width) / 2.0;
        self.scroll_to(Point { x, y: self.scroll.y });
    }

    pub fn press(&mut self, at: Point) {
        self.state = DragState::Pressed;
        self.origin = at;
        self.scroll_start = self.scroll;
        self.has_dragged = false;
    }

    /// Pointer movement. Returns true when the scroll offset changed.
    pub fn move_to(&mut self, at: Point) -> bool {
        let dx = at.x - self.origin.x;
        let dy = at.y - self.origin.y;

        match self.state {
            DragState::Idle => return false,
            DragState::Pressed => {
                if dx.abs() <= self.threshold && dy.abs() <= self.threshold {
                    return false;
                }
                self.state = DragState::Dragging;
                self.has_dragged = true;
            }
            DragState::Dragging => {}
        }

        let before = self.scroll;
        self.scroll = self.extent.clamp(Point {
            x: self.scroll_start.x - dx,
            y: self.scroll_start.y - dy,
        });
        self.scroll != before
    }

    pub fn release(&mut self) {
        self.state = DragState::Idle;
    }

    /// Pointer left the container; same as a release.
    pub fn leave(&mut self) {
        self.release();
    }

    /// A click on something inside the container.
    pub fn click(&mut self) -> ClickOutcome {
        if self.has_dragged {
            self.has_dragged = false;
            ClickOutcome::Suppressed
        } else {
            ClickOutcome::Navigate
        }
    }
}
