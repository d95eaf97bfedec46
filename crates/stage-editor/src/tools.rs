//! Tool system for canvas interactions.
//!
//! Each tool translates user input events into `GraphMutation` commands
//! that are applied via the `SyncEngine`.
//!
//! ## Modifier behaviors
//!
//! | Modifier | Select Tool | Resize Tool |
//! |----------|-------------|-------------|
//! | **Shift** | Axis-constrain drag | none |

use crate::input::InputEvent;
use crate::sync::GraphMutation;
use stage_core::id::NodeId;

/// Trait for tools that handle input and produce mutations.
pub trait Tool {
    /// Handle an input event, returning zero or more mutations.
    fn handle(&mut self, event: &InputEvent, hit_node: Option<NodeId>) -> Vec<GraphMutation>;
}

// ─── Select Tool ─────────────────────────────────────────────────────────

/// Selects and drags nodes, and recognizes clicks.
pub struct SelectTool {
    /// Currently selected node.
    pub selected: Option<NodeId>,
    /// Drag state (moving the selected node).
    dragging: bool,
    last_x: f32,
    last_y: f32,
    /// Where the current press started.
    press: Option<(f32, f32)>,
    /// Largest distance from the press point seen during this gesture.
    travel: f32,
    /// Pointer travel under which press + release is a click.
    click_slop: f32,
    /// Node clicked by the most recent press/release pair, until taken.
    clicked: Option<NodeId>,
}

impl Default for SelectTool {
    fn default() -> Self {
        Self::new(3.0)
    }
}

impl SelectTool {
    pub fn new(click_slop: f32) -> Self {
        Self {
            selected: None,
            dragging: false,
            last_x: 0.0,
            last_y: 0.0,
            press: None,
            travel: 0.0,
            click_slop,
            clicked: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Take the node clicked by the last completed gesture, if any.
    pub fn take_click(&mut self) -> Option<NodeId> {
        self.clicked.take()
    }

    /// Forget a node that no longer exists.
    pub fn forget(&mut self, id: NodeId) {
        if self.selected == Some(id) {
            self.selected = None;
            self.dragging = false;
        }
        if self.clicked == Some(id) {
            self.clicked = None;
        }
    }

    fn track_travel(&mut self, x: f32, y: f32) {
        if let Some((sx, sy)) = self.press {
            let d = ((x - sx).powi(2) + (y - sy).powi(2)).sqrt();
            self.travel = self.travel.max(d);
        }
    }
}

impl Tool for SelectTool {
    fn handle(&mut self, event: &InputEvent, hit_node: Option<NodeId>) -> Vec<GraphMutation> {
        match event {
            InputEvent::PointerDown { x, y, .. } => {
                self.press = Some((*x, *y));
                self.travel = 0.0;
                self.clicked = None;
                self.selected = hit_node;
                self.dragging = hit_node.is_some();
                self.last_x = *x;
                self.last_y = *y;
                vec![]
            }
            InputEvent::PointerMove { x, y, modifiers } => {
                self.track_travel(*x, *y);
                let Some(id) = self.selected.filter(|_| self.dragging) else {
                    return vec![];
                };
                let mut dx = x - self.last_x;
                let mut dy = y - self.last_y;
                self.last_x = *x;
                self.last_y = *y;

                // Shift: constrain to dominant axis
                if modifiers.shift {
                    if dx.abs() > dy.abs() {
                        dy = 0.0;
                    } else {
                        dx = 0.0;
                    }
                }

                if dx == 0.0 && dy == 0.0 {
                    return vec![];
                }
                vec![GraphMutation::MoveNode { id, dx, dy }]
            }
            InputEvent::PointerUp { x, y } => {
                self.track_travel(*x, *y);
                if self.press.take().is_some() && self.travel < self.click_slop {
                    self.clicked = self.selected;
                }
                self.dragging = false;
                vec![]
            }
        }
    }
}
