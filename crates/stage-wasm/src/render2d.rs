//! Canvas2D software renderer.
//!
//! Walks the scene graph in paint order and draws to an HTML `<canvas>` via
//! `CanvasRenderingContext2d`: bitmap and video frames with `drawImage`,
//! text with `fillText`, then the transform handles on top.

use stage_core::host::DrawSurface;
use stage_core::model::*;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement, HtmlVideoElement};

const BACKGROUND: &str = "#F3F4F6";
const HANDLE_STROKE: &str = "#4FC3F7";
const HANDLE_FILL: &str = "#FFFFFF";
const FONT_FAMILY: &str = "Arial";

/// The DOM elements whose pixels back image and video nodes.
pub struct MediaSources {
    pub image: HtmlImageElement,
    pub video: HtmlVideoElement,
}

/// A drawing surface backed by a 2D canvas context.
pub struct DomSurface {
    ctx: CanvasRenderingContext2d,
    size: Size,
    sources: MediaSources,
    handle_size: f64,
}

impl DomSurface {
    pub fn new(
        ctx: CanvasRenderingContext2d,
        size: Size,
        sources: MediaSources,
        handle_size: f32,
    ) -> Self {
        Self {
            ctx,
            size,
            sources,
            handle_size: handle_size as f64,
        }
    }
}

impl DrawSurface for DomSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn batch_draw(&mut self, graph: &SceneGraph) {
        render_scene(
            &self.ctx,
            graph,
            &self.sources,
            self.size.width as f64,
            self.size.height as f64,
            self.handle_size,
        );
    }

    fn release(&mut self) {
        self.ctx
            .clear_rect(0.0, 0.0, self.size.width as f64, self.size.height as f64);
    }
}

/// Render the entire scene graph to a Canvas2D context.
pub fn render_scene(
    ctx: &CanvasRenderingContext2d,
    graph: &SceneGraph,
    sources: &MediaSources,
    canvas_width: f64,
    canvas_height: f64,
    handle_size: f64,
) {
    // Clear canvas
    ctx.set_fill_style_str(BACKGROUND);
    ctx.fill_rect(0.0, 0.0, canvas_width, canvas_height);

    for node in graph.nodes().filter(|n| n.visible) {
        render_node(ctx, node, sources);
    }

    if let Some(handles) = graph.handles() {
        draw_selection_handles(ctx, handles, handle_size);
    }
}

fn render_node(ctx: &CanvasRenderingContext2d, node: &SceneNode, sources: &MediaSources) {
    let b = node.bounds();
    ctx.save();
    apply_opacity(ctx, &node.style);

    match &node.kind {
        NodeKind::Root => {}
        NodeKind::Image { .. } => {
            if sources.image.complete() {
                let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
                    &sources.image,
                    b.x as f64,
                    b.y as f64,
                    b.width as f64,
                    b.height as f64,
                );
            }
        }
        NodeKind::VideoSurface { .. } => {
            let _ = ctx.draw_image_with_html_video_element_and_dw_and_dh(
                &sources.video,
                b.x as f64,
                b.y as f64,
                b.width as f64,
                b.height as f64,
            );
        }
        NodeKind::Text { content, font_size } => {
            draw_text(ctx, &b, content, *font_size, &node.style);
        }
    }

    // Stroke
    if let Some(stroke) = &node.style.stroke {
        ctx.set_stroke_style_str(&stroke.color.to_hex());
        ctx.set_line_width(stroke.width as f64);
        ctx.stroke_rect(b.x as f64, b.y as f64, b.width as f64, b.height as f64);
    }

    ctx.restore();
}

fn draw_text(
    ctx: &CanvasRenderingContext2d,
    b: &Bounds,
    content: &str,
    font_size: f32,
    style: &Style,
) {
    ctx.set_font(&format!("{font_size}px {FONT_FAMILY}"));
    let fill = style.fill.unwrap_or(Color::BLACK).to_hex();
    ctx.set_fill_style_str(&fill);
    ctx.set_text_baseline("top");
    let _ = ctx.fill_text(content, b.x as f64, b.y as f64);
}

fn draw_selection_handles(
    ctx: &CanvasRenderingContext2d,
    handles: &TransformHandles,
    handle_size: f64,
) {
    let f = &handles.frame;
    let half = handle_size / 2.0;

    ctx.set_stroke_style_str(HANDLE_STROKE);
    ctx.set_line_width(1.0);
    ctx.stroke_rect(f.x as f64, f.y as f64, f.width as f64, f.height as f64);

    ctx.set_fill_style_str(HANDLE_FILL);
    ctx.set_line_width(1.5);
    for (_, p) in handles.anchor_points() {
        let (hx, hy) = (p.x as f64 - half, p.y as f64 - half);
        ctx.fill_rect(hx, hy, handle_size, handle_size);
        ctx.stroke_rect(hx, hy, handle_size, handle_size);
    }
}

fn apply_opacity(ctx: &CanvasRenderingContext2d, style: &Style) {
    if let Some(opacity) = style.opacity {
        ctx.set_global_alpha(opacity as f64);
    }
}
