//! Hit testing: point → node or handle lookup.
//!
//! Reverse-walks the root's children (front-to-back) to find which visible
//! node is at a given stage position. Handles sit above every node, so
//! callers check `hit_test_handle` first.

use stage_core::SceneGraph;
use stage_core::id::NodeId;
use stage_core::model::{Anchor, TransformHandles};

/// Find the topmost visible node at position (px, py).
/// Returns `None` if no node is hit (background).
pub fn hit_test(graph: &SceneGraph, px: f32, py: f32) -> Option<NodeId> {
    graph
        .children(graph.root)
        .into_iter()
        .rev()
        .map(|idx| &graph.graph[idx])
        .find(|node| node.visible && node.bounds().contains(px, py))
        .map(|node| node.id)
}

/// Find the handle anchor within `radius` of (px, py).
///
/// When two anchors overlap (a tiny node), the closest one wins.
pub fn hit_test_handle(
    handles: &TransformHandles,
    px: f32,
    py: f32,
    radius: f32,
) -> Option<Anchor> {
    handles
        .anchor_points()
        .into_iter()
        .filter(|(_, p)| (p.x - px).abs() <= radius && (p.y - py).abs() <= radius)
        .min_by(|(_, a), (_, b)| {
            let da = (a.x - px).powi(2) + (a.y - py).powi(2);
            let db = (b.x - px).powi(2) + (b.y - py).powi(2);
            da.total_cmp(&db)
        })
        .map(|(anchor, _)| anchor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stage_core::model::{AssetRef, Bounds, HandleOptions, NodeKind};

    fn image(url: &str) -> NodeKind {
        NodeKind::Image {
            source: AssetRef::new(url),
        }
    }

    #[test]
    fn hit_test_prefers_topmost() {
        let mut graph = SceneGraph::new();
        let back = graph.create_node(image("a.png"), Bounds::new(0.0, 0.0, 100.0, 100.0));
        let front = graph.create_node(image("b.png"), Bounds::new(50.0, 50.0, 100.0, 100.0));

        assert_eq!(hit_test(&graph, 75.0, 75.0), Some(front));
        assert_eq!(hit_test(&graph, 10.0, 10.0), Some(back));
        assert_eq!(hit_test(&graph, 400.0, 400.0), None);
    }

    #[test]
    fn hit_test_skips_hidden_nodes() {
        let mut graph = SceneGraph::new();
        let back = graph.create_node(image("a.png"), Bounds::new(0.0, 0.0, 100.0, 100.0));
        let front = graph.create_node(image("b.png"), Bounds::new(0.0, 0.0, 100.0, 100.0));
        graph.set_visible(front, false).unwrap();

        assert_eq!(hit_test(&graph, 10.0, 10.0), Some(back));
    }

    #[test]
    fn handle_hit_uses_radius() {
        let mut graph = SceneGraph::new();
        let id = graph.create_node(image("a.png"), Bounds::new(10.0, 10.0, 100.0, 50.0));
        graph.attach_handles(id, HandleOptions::corners()).unwrap();
        let handles = graph.handles().unwrap();

        assert_eq!(
            hit_test_handle(handles, 112.0, 58.0, 4.0),
            Some(Anchor::BottomRight)
        );
        assert_eq!(hit_test_handle(handles, 9.0, 11.0, 4.0), Some(Anchor::TopLeft));
        assert_eq!(hit_test_handle(handles, 60.0, 35.0, 4.0), None);
    }

    #[test]
    fn disabled_anchor_is_not_hit() {
        let mut graph = SceneGraph::new();
        let id = graph.create_node(image("a.png"), Bounds::new(0.0, 0.0, 10.0, 10.0));
        let mut options = HandleOptions::corners();
        options.anchors.retain(|a| *a != Anchor::TopLeft);
        graph.attach_handles(id, options).unwrap();

        assert_eq!(hit_test_handle(graph.handles().unwrap(), 0.0, 0.0, 2.0), None);
    }
}
