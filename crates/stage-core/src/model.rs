//! Core scene-graph data model for the stage.
//!
//! The scene is a DAG rooted at a `Root` node whose children are the
//! placeable elements (image, video surface, text) in paint order. Every
//! mutation marks the graph dirty; the graph never draws itself. Whoever owns
//! the graph flushes the dirty flag into one batched redraw on its surface.
//!
//! The graph also owns the (at most one) `TransformHandles` set so that
//! destroying or hiding the owning node drops its handles in the same call.

use crate::error::{SceneError, SceneResult};
use crate::id::NodeId;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Smallest width/height a node may be resized to.
pub const MIN_DIMENSION: f32 = 1.0;

/// Smallest font size a text node may carry.
pub const MIN_FONT_SIZE: f32 = 1.0;

/// Text line height as a multiple of the font size.
pub const LINE_HEIGHT: f32 = 1.0;

/// Average glyph advance as a multiple of the font size, used to estimate
/// text width without a font backend.
pub const GLYPH_ADVANCE: f32 = 0.6;

// ─── Colors & Style ──────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let channel = |i: usize| -> Option<f32> {
            let v = hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?;
            Some(v as f32 / 255.0)
        };
        match bytes.len() {
            6 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, 1.0)),
            8 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let to8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (to8(self.r), to8(self.g), to8(self.b), to8(self.a));
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
    pub opacity: Option<f32>,
}

// ─── Geometry ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width over height; 1.0 for a degenerate height.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// Axis-aligned bounding box in stage coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_parts(position: Point, size: Size) -> Self {
        Self::new(position.x, position.y, size.width, size.height)
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A partial geometry update: only `Some` fields are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialGeometry {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl PartialGeometry {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn sized(width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn from_bounds(b: Bounds) -> Self {
        Self {
            x: Some(b.x),
            y: Some(b.y),
            width: Some(b.width),
            height: Some(b.height),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.width.is_none() && self.height.is_none()
    }

    fn touches_size(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }
}

/// Estimate the box a single line of text occupies.
pub fn estimate_text_size(content: &str, font_size: f32) -> Size {
    let chars = content.chars().count() as f32;
    Size::new(
        (chars * font_size * GLYPH_ADVANCE).max(MIN_DIMENSION),
        (font_size * LINE_HEIGHT).max(MIN_DIMENSION),
    )
}

// ─── Transform handles ───────────────────────────────────────────────────

/// A corner anchor of the transform handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Anchor {
    pub const ALL: [Anchor; 4] = [
        Anchor::TopLeft,
        Anchor::TopRight,
        Anchor::BottomLeft,
        Anchor::BottomRight,
    ];

    /// Direction the anchor pulls each axis: -1 toward the origin, +1 away.
    pub fn signs(self) -> (f32, f32) {
        match self {
            Anchor::TopLeft => (-1.0, -1.0),
            Anchor::TopRight => (1.0, -1.0),
            Anchor::BottomLeft => (-1.0, 1.0),
            Anchor::BottomRight => (1.0, 1.0),
        }
    }

    /// Where this anchor sits on `b`.
    pub fn point_on(self, b: &Bounds) -> Point {
        let (sx, sy) = self.signs();
        let x = if sx < 0.0 { b.x } else { b.x + b.width };
        let y = if sy < 0.0 { b.y } else { b.y + b.height };
        Point::new(x, y)
    }

    pub fn name(self) -> &'static str {
        match self {
            Anchor::TopLeft => "top-left",
            Anchor::TopRight => "top-right",
            Anchor::BottomLeft => "bottom-left",
            Anchor::BottomRight => "bottom-right",
        }
    }
}

/// How handles behave when attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandleOptions {
    pub anchors: SmallVec<[Anchor; 4]>,
    pub keep_aspect_ratio: bool,
}

impl HandleOptions {
    /// All four corners, free aspect ratio.
    pub fn corners() -> Self {
        Self {
            anchors: SmallVec::from_slice(&Anchor::ALL),
            keep_aspect_ratio: false,
        }
    }

    /// All four corners, aspect ratio locked.
    pub fn corners_locked() -> Self {
        Self {
            keep_aspect_ratio: true,
            ..Self::corners()
        }
    }
}

/// The resize handles attached to the selected node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformHandles {
    pub owner: NodeId,
    pub options: HandleOptions,
    /// Owner bounds the handles were last laid out against.
    pub frame: Bounds,
    /// Width/height ratio captured when the handles were attached.
    pub ratio: f32,
}

impl TransformHandles {
    pub fn new(owner: NodeId, options: HandleOptions, frame: Bounds) -> Self {
        Self {
            owner,
            options,
            ratio: frame.size().aspect_ratio(),
            frame,
        }
    }

    /// Enabled anchors and their current positions.
    pub fn anchor_points(&self) -> SmallVec<[(Anchor, Point); 4]> {
        self.options
            .anchors
            .iter()
            .map(|a| (*a, a.point_on(&self.frame)))
            .collect()
    }
}

// ─── Scene nodes ─────────────────────────────────────────────────────────

/// Source of an image or video node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub url: String,
}

impl AssetRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// The node kinds in the scene DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Root of the scene.
    Root,

    /// A loaded bitmap.
    Image { source: AssetRef },

    /// A surface presenting the current frame of the video element.
    VideoSurface { source: AssetRef },

    /// An editable text label.
    Text { content: String, font_size: f32 },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Image { .. } => "image",
            NodeKind::VideoSurface { .. } => "video",
            NodeKind::Text { .. } => "text",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, NodeKind::Text { .. })
    }

    /// Paint layer under the root: video, then image, then text on top.
    pub fn layer(&self) -> u8 {
        match self {
            NodeKind::Root | NodeKind::VideoSurface { .. } => 0,
            NodeKind::Image { .. } => 1,
            NodeKind::Text { .. } => 2,
        }
    }
}

/// A single node in the scene graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub position: Point,
    pub size: Size,
    pub draggable: bool,
    pub visible: bool,
    pub style: Style,
    /// Handles to attach when this node is selected; `None` means the node
    /// can be dragged but not resized.
    pub handles: Option<HandleOptions>,
}

impl SceneNode {
    /// A visible, draggable node with no handles.
    pub fn new(id: NodeId, kind: NodeKind, bounds: Bounds) -> Self {
        let mut node = Self {
            id,
            kind,
            position: bounds.position(),
            size: bounds.size(),
            draggable: true,
            visible: true,
            style: Style::default(),
            handles: None,
        };
        node.derive_text_size();
        node
    }

    pub fn with_handles(mut self, options: HandleOptions) -> Self {
        self.handles = Some(options);
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_parts(self.position, self.size)
    }

    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn font_size(&self) -> Option<f32> {
        match &self.kind {
            NodeKind::Text { font_size, .. } => Some(*font_size),
            _ => None,
        }
    }

    /// Text nodes size themselves from their content and font size.
    fn derive_text_size(&mut self) {
        if let NodeKind::Text { content, font_size } = &self.kind {
            self.size = estimate_text_size(content, *font_size);
        }
    }
}

// ─── Scene graph ─────────────────────────────────────────────────────────

/// The single long-lived scene. Edges go from parent → child.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    /// The underlying directed graph.
    pub graph: StableDiGraph<SceneNode, ()>,

    /// The root node index.
    pub root: NodeIndex,

    /// Index from NodeId → NodeIndex for fast lookup.
    pub id_index: HashMap<NodeId, NodeIndex>,

    /// Root children back to front, by layer and then insertion.
    /// `StableDiGraph` recycles freed indices, so index order alone does not
    /// track insertion order.
    paint_order: Vec<NodeIndex>,

    /// Handles of the selected node, if any.
    handles: Option<TransformHandles>,

    dirty: bool,
}

impl SceneGraph {
    /// Create a new empty scene graph with a root node.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root_node = SceneNode::new(NodeId::root(), NodeKind::Root, Bounds::default());
        let root = graph.add_node(root_node);

        let mut id_index = HashMap::new();
        id_index.insert(NodeId::root(), root);

        Self {
            graph,
            root,
            id_index,
            paint_order: Vec::new(),
            handles: None,
            dirty: false,
        }
    }

    // ─── Structure ───────────────────────────────────────────────────────

    /// Add a node as a child of `parent`. Returns the new node's index.
    ///
    /// Under the root the node goes above its layer's existing nodes and
    /// below every higher layer, whatever order the nodes arrive in.
    pub fn add_node(&mut self, parent: NodeIndex, node: SceneNode) -> NodeIndex {
        let id = node.id;
        let layer = node.kind.layer();
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.id_index.insert(id, idx);
        if parent == self.root {
            let at = self
                .paint_order
                .iter()
                .position(|i| self.graph[*i].kind.layer() > layer)
                .unwrap_or(self.paint_order.len());
            self.paint_order.insert(at, idx);
        }
        self.dirty = true;
        idx
    }

    /// Remove a node, keeping `id_index` and the handles synchronized.
    pub fn remove_node(&mut self, idx: NodeIndex) -> Option<SceneNode> {
        let removed = self.graph.remove_node(idx)?;
        self.id_index.remove(&removed.id);
        self.paint_order.retain(|i| *i != idx);
        if self.handles.as_ref().is_some_and(|h| h.owner == removed.id) {
            log::debug!("handles destroyed with @{}", removed.id);
            self.handles = None;
        }
        self.dirty = true;
        Some(removed)
    }

    /// Look up a node by id.
    pub fn get_by_id(&self, id: NodeId) -> Option<&SceneNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    /// Look up a node mutably by id. Does not mark the graph dirty.
    pub fn get_by_id_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id != NodeId::root() && self.id_index.contains_key(&id)
    }

    /// Children of a node in insertion (paint) order.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        if idx == self.root {
            return self.paint_order.clone();
        }
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    /// Placeable nodes in paint order (back to front).
    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> + '_ {
        self.children(self.root)
            .into_iter()
            .map(move |idx| &self.graph[idx])
    }

    /// Number of placeable nodes.
    pub fn len(&self) -> usize {
        self.id_index.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The single text node, if one exists.
    pub fn text_node(&self) -> Option<&SceneNode> {
        self.nodes().find(|n| n.kind.is_text())
    }

    /// The video surface node, if one exists.
    pub fn video_node(&self) -> Option<&SceneNode> {
        self.nodes()
            .find(|n| matches!(n.kind, NodeKind::VideoSurface { .. }))
    }

    // ─── Node model contract ─────────────────────────────────────────────

    /// Create a node of `kind` with a fresh id and insert it at the top of
    /// its layer.
    pub fn create_node(&mut self, kind: NodeKind, geometry: Bounds) -> NodeId {
        let id = NodeId::with_prefix(kind.name());
        let node = SceneNode::new(id, kind, geometry);
        self.add_node(self.root, node);
        log::debug!("created @{id}");
        id
    }

    /// Insert a fully-built node at the top of its layer.
    pub fn insert_node(&mut self, node: SceneNode) -> NodeId {
        let id = node.id;
        self.add_node(self.root, node);
        log::debug!("inserted @{id}");
        id
    }

    /// Destroy a node. Its handles go with it.
    pub fn destroy_node(&mut self, id: NodeId) -> SceneResult<SceneNode> {
        let idx = self
            .index_of(id)
            .filter(|_| id != NodeId::root())
            .ok_or(SceneError::NodeNotFound(id))?;
        self.remove_node(idx).ok_or(SceneError::NodeNotFound(id))
    }

    /// Write the `Some` fields of `geometry` into the node.
    ///
    /// Text nodes derive their size from content and font size, so only the
    /// position of a text node can be set this way.
    pub fn update_geometry(&mut self, id: NodeId, geometry: PartialGeometry) -> SceneResult<()> {
        let node = self.node_mut(id)?;
        if let Some(x) = geometry.x {
            node.position.x = x;
        }
        if let Some(y) = geometry.y {
            node.position.y = y;
        }
        if geometry.touches_size() {
            if node.kind.is_text() {
                log::trace!("ignoring explicit size on text @{id}");
            } else {
                if let Some(w) = geometry.width {
                    node.size.width = w.max(MIN_DIMENSION);
                }
                if let Some(h) = geometry.height {
                    node.size.height = h.max(MIN_DIMENSION);
                }
            }
        }
        self.after_geometry_change(id);
        Ok(())
    }

    /// Translate a node by a delta.
    pub fn translate(&mut self, id: NodeId, dx: f32, dy: f32) -> SceneResult<Point> {
        let node = self.node_mut(id)?;
        node.position.x += dx;
        node.position.y += dy;
        let position = node.position;
        self.after_geometry_change(id);
        Ok(position)
    }

    /// Replace a text node's content.
    pub fn update_content(&mut self, id: NodeId, text: &str) -> SceneResult<()> {
        let node = self.node_mut(id)?;
        match &mut node.kind {
            NodeKind::Text { content, .. } => {
                if content != text {
                    text.clone_into(content);
                }
            }
            other => {
                return Err(SceneError::InvalidNodeKind {
                    id,
                    expected: "text",
                    found: other.name(),
                });
            }
        }
        node.derive_text_size();
        self.after_geometry_change(id);
        Ok(())
    }

    /// Set a text node's font size, clamped to `MIN_FONT_SIZE`.
    /// Returns the size actually applied.
    pub fn set_font_size(&mut self, id: NodeId, size: f32) -> SceneResult<f32> {
        let node = self.node_mut(id)?;
        let applied = match &mut node.kind {
            NodeKind::Text { font_size, .. } => {
                *font_size = size.max(MIN_FONT_SIZE);
                *font_size
            }
            other => {
                return Err(SceneError::InvalidNodeKind {
                    id,
                    expected: "text",
                    found: other.name(),
                });
            }
        };
        node.derive_text_size();
        self.after_geometry_change(id);
        Ok(applied)
    }

    /// Show or hide a node. Hiding the handle owner detaches the handles.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> SceneResult<()> {
        self.node_mut(id)?.visible = visible;
        if !visible && self.handles.as_ref().is_some_and(|h| h.owner == id) {
            self.handles = None;
        }
        self.dirty = true;
        Ok(())
    }

    // ─── Handles ─────────────────────────────────────────────────────────

    /// Attach handles to a visible node, replacing any existing set.
    pub fn attach_handles(&mut self, id: NodeId, options: HandleOptions) -> SceneResult<()> {
        let frame = self
            .get_by_id(id)
            .filter(|n| n.visible && !matches!(n.kind, NodeKind::Root))
            .map(SceneNode::bounds)
            .ok_or(SceneError::NodeNotFound(id))?;
        self.handles = Some(TransformHandles::new(id, options, frame));
        self.dirty = true;
        log::debug!("handles attached to @{id}");
        Ok(())
    }

    /// Remove the handles. Returns the detached set, if any.
    pub fn detach_handles(&mut self) -> Option<TransformHandles> {
        let detached = self.handles.take();
        if let Some(h) = &detached {
            self.dirty = true;
            log::debug!("handles detached from @{}", h.owner);
        }
        detached
    }

    pub fn handles(&self) -> Option<&TransformHandles> {
        self.handles.as_ref()
    }

    // ─── Dirty tracking ──────────────────────────────────────────────────

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clear the dirty flag, returning whether it was set.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn node_mut(&mut self, id: NodeId) -> SceneResult<&mut SceneNode> {
        if id == NodeId::root() {
            return Err(SceneError::NodeNotFound(id));
        }
        self.get_by_id_mut(id).ok_or(SceneError::NodeNotFound(id))
    }

    /// Keep the handle frame glued to its owner.
    fn after_geometry_change(&mut self, id: NodeId) {
        self.dirty = true;
        let frame = match self.get_by_id(id) {
            Some(n) => n.bounds(),
            None => return,
        };
        if let Some(h) = self.handles.as_mut().filter(|h| h.owner == id) {
            h.frame = frame;
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
