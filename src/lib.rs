//! boxtex - box-tree layout and rendering for typeset expressions
//!
//! A caller composes a tree of boxes (spacing, text runs, symbols,
//! fractions, horizontal/vertical groups, matrices) through factory
//! constructors, measures it against a glyph-metrics provider, and
//! draws it through a canvas collaborator:
//! - A box-tree model with owned and shared child references
//! - Per-node color/font-size/font overrides resolved against an
//!   explicitly threaded rendering context
//! - Recursive measurement and draw-positioning, with fraction rules
//!   kept level across mixed rows
//!
//! The engine never rasterizes: text measurement and the actual
//! text/line/rectangle drawing are injected by the caller.

pub mod error;
pub mod layout;
pub mod model;
pub mod render;

pub use error::{TexError, TexResult};
pub use layout::{
    measure, measure_ref, mu_to_px, ApproxMetrics, GlyphMetrics, Point, Rect, Size,
    FRACTION_OVERHANG_MU, MU_PER_EM, RULE_THICKNESS_MU, SYMBOL_PAD_MU,
};
pub use model::{
    Font, HAlign, NodeRef, Overrides, RenderContext, SharedNode, TexContent, TexMode, TexNode,
    TexSymbol, VAlign,
};
pub use render::{draw, draw_centered, draw_ref, Canvas, Color, CommandBuffer, DrawCommand};
