//! Pointer, wheel and keyboard driven state of a rendered diagram.
//!
//! Every controller is a plain state machine fed with host events and
//! timestamps; the session decides when to re-route and redraw.

pub mod anim;
pub mod compaction;
pub mod drag;
pub mod highlight;
pub mod search;
pub mod zoom;

use std::collections::HashSet;

pub use anim::{Debouncer, FrameGate, Tween, ease_cubic_in_out};
pub use compaction::{Compaction, CompactionTick};
pub use drag::DragController;
pub use highlight::{Depth, Highlight};
pub use search::{Search, SearchOutcome};
pub use zoom::{Transform, WheelMode, ZoomConfig, ZoomController};

/// Which tables and links are drawn dimmed, and which table is selected.
/// Highlight and search both write here; the latest action wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Emphasis {
    pub dimmed_tables: HashSet<String>,
    /// Indices into the link list.
    pub dimmed_links: HashSet<usize>,
    pub selected: Option<String>,
}

impl Emphasis {
    /// Remove all dimming. The selection marker is left alone.
    pub fn clear(&mut self) {
        self.dimmed_tables.clear();
        self.dimmed_links.clear();
    }

    pub fn is_clear(&self) -> bool {
        self.dimmed_tables.is_empty() && self.dimmed_links.is_empty() && self.selected.is_none()
    }

    pub fn is_table_dimmed(&self, id: &str) -> bool {
        self.dimmed_tables.contains(id)
    }

    pub fn is_link_dimmed(&self, index: usize) -> bool {
        self.dimmed_links.contains(&index)
    }
}
