//! Layout Engine - recursive measurement of a box tree
//!
//! Measurement is a pure function of the node, the inherited rendering
//! context, and the glyph-metrics provider. It mutates nothing and is
//! safe to call repeatedly and speculatively.

use crate::model::{Font, NodeRef, RenderContext, TexContent, TexNode, TexSymbol};
use serde::{Deserialize, Serialize};

// =============================================================================
// Geometry
// =============================================================================

/// A position in 2D space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self::default()
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// A size with width and height
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

/// A rectangle in render coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

// =============================================================================
// Layout Units
// =============================================================================

/// Abstract layout units per font-size unit: 18 mu equal one em.
pub const MU_PER_EM: f32 = 18.0;

/// Horizontal overhang of a fraction rule past its widest child, in mu
pub const FRACTION_OVERHANG_MU: f32 = 2.0;

/// Thickness of the fraction rule, in mu
pub const RULE_THICKNESS_MU: f32 = 1.0;

/// Padding on each side of a procedurally drawn symbol, in mu
pub const SYMBOL_PAD_MU: f32 = 2.0;

/// Convert abstract layout units to pixels at a font size.
pub fn mu_to_px(mu: f32, font_size: f32) -> f32 {
    mu * font_size / MU_PER_EM
}

// =============================================================================
// Glyph Metrics Provider
// =============================================================================

/// Text measurement supplied by the drawing backend.
///
/// The engine is agnostic to how text is rasterized; this is the only
/// thing measurement needs from the outside.
pub trait GlyphMetrics {
    /// Extent of `text` rendered with `font` at `font_size` pixels.
    fn measure_text(&self, font: Font, text: &str, font_size: f32) -> Size;
}

/// Character-count metrics for headless use and tests.
///
/// Estimates the average glyph advance as a fixed fraction of the em
/// size, the usual approximation when no shaper is available.
#[derive(Debug, Clone, Copy)]
pub struct ApproxMetrics {
    /// Average glyph advance as a fraction of the font size
    pub char_width: f32,
    /// Line height as a fraction of the font size
    pub line_height: f32,
}

impl Default for ApproxMetrics {
    fn default() -> Self {
        Self {
            char_width: 0.6,
            line_height: 1.0,
        }
    }
}

impl GlyphMetrics for ApproxMetrics {
    fn measure_text(&self, _font: Font, text: &str, font_size: f32) -> Size {
        Size::new(
            text.chars().count() as f32 * font_size * self.char_width,
            font_size * self.line_height,
        )
    }
}

// =============================================================================
// Measurement
// =============================================================================

/// Measure `node` under `ctx`, resolving the node's own overrides first.
///
/// The resolved context is what the node's children inherit.
pub fn measure<M: GlyphMetrics>(node: &TexNode, ctx: &RenderContext, metrics: &M) -> Size {
    let ctx = node.overrides.apply(ctx);
    match &node.content {
        TexContent::Space { mu } => Size::new(mu_to_px(*mu, ctx.font_size), 0.0),
        TexContent::VSpace { mu } => Size::new(0.0, mu_to_px(*mu, ctx.font_size)),
        TexContent::Text(text) => metrics.measure_text(ctx.font, text, ctx.font_size),
        TexContent::Symbol(symbol) => measure_symbol(*symbol, &ctx, metrics),
        TexContent::Fraction {
            num,
            den,
            spacing_mu,
        } => {
            let num_size = measure_ref(num, &ctx, metrics);
            let den_size = measure_ref(den, &ctx, metrics);
            let overhang = mu_to_px(FRACTION_OVERHANG_MU, ctx.font_size);
            let spacing = mu_to_px(*spacing_mu, ctx.font_size);
            let rule = mu_to_px(RULE_THICKNESS_MU, ctx.font_size);
            Size::new(
                num_size.width.max(den_size.width) + 2.0 * overhang,
                num_size.height + den_size.height + 2.0 * spacing + rule,
            )
        }
        TexContent::Horizontal { children, align } => {
            let mut width = 0.0;
            if align.is_centered() {
                // Children sit around a shared axis; a fraction's rule,
                // not its bounding-box center, lands on that axis.
                let mut max_ascent = 0.0f32;
                let mut max_descent = 0.0f32;
                for child in children {
                    let (size, shift) = child.with(|node| {
                        (measure(node, &ctx, metrics), axis_shift(node, &ctx, metrics))
                    });
                    width += size.width;
                    max_ascent = max_ascent.max(size.height / 2.0 + shift);
                    max_descent = max_descent.max(size.height / 2.0 - shift);
                }
                Size::new(width, max_ascent + max_descent)
            } else {
                let mut height = 0.0f32;
                for child in children {
                    let size = measure_ref(child, &ctx, metrics);
                    width += size.width;
                    height = height.max(size.height);
                }
                Size::new(width, height)
            }
        }
        TexContent::Vertical { children, .. } => {
            let mut width = 0.0f32;
            let mut height = 0.0;
            for child in children {
                let size = measure_ref(child, &ctx, metrics);
                width = width.max(size.width);
                height += size.height;
            }
            Size::new(width, height)
        }
        TexContent::Matrix { rows, cols, .. } => {
            tracing::warn!(
                rows = *rows,
                cols = *cols,
                "matrix measurement is not implemented, reporting zero size"
            );
            Size::zero()
        }
    }
}

/// Measure through a child reference.
pub fn measure_ref<M: GlyphMetrics>(child: &NodeRef, ctx: &RenderContext, metrics: &M) -> Size {
    child.with(|node| measure(node, ctx, metrics))
}

/// Upward shift that puts a fraction's rule, rather than its bounding-box
/// center, on the axis of a centered row. Zero for every other mode.
///
/// Drawing applies the same shift, keeping the two passes in agreement.
pub(crate) fn axis_shift<M: GlyphMetrics>(
    node: &TexNode,
    ctx: &RenderContext,
    metrics: &M,
) -> f32 {
    let ctx = node.overrides.apply(ctx);
    match &node.content {
        TexContent::Fraction {
            num,
            den,
            spacing_mu,
        } => {
            let num_h = measure_ref(num, &ctx, metrics).height;
            let den_h = measure_ref(den, &ctx, metrics).height;
            (num_h - den_h + mu_to_px(*spacing_mu, ctx.font_size)) / 2.0
        }
        _ => 0.0,
    }
}

pub(crate) fn measure_symbol<M: GlyphMetrics>(
    symbol: TexSymbol,
    ctx: &RenderContext,
    metrics: &M,
) -> Size {
    let glyph = metrics.measure_text(ctx.font, symbol.base_glyph(), ctx.font_size);
    let pad = mu_to_px(SYMBOL_PAD_MU, ctx.font_size);
    Size::new(glyph.width + 2.0 * pad, glyph.height)
}

// =============================================================================
// Tests
// =============================================================================
