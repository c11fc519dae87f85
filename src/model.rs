//! Box Tree - nodes, child references, and style overrides
//!
//! The tree is built through factory constructors and mutated in place
//! through bounds-checked accessors. A child reference is either owned
//! by its parent (dropping the parent releases the subtree) or shared
//! through reference counting (it outlives any single parent and can be
//! mutated through any handle to it).

use crate::error::{TexError, TexResult};
use crate::render::Color;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

// =============================================================================
// Fonts and Rendering Context
// =============================================================================

/// Opaque handle to a font loaded by the drawing backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Font(pub u32);

impl Font {
    /// The backend's default font
    pub const DEFAULT: Font = Font(0);
}

impl Default for Font {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Values a node inherits when it carries no override of its own.
///
/// The context is threaded explicitly through measurement and drawing;
/// there is no global default font, size, or color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    pub font: Font,
    pub font_size: f32,
    pub color: Color,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            font: Font::DEFAULT,
            font_size: 20.0,
            color: Color::BLACK,
        }
    }
}

impl RenderContext {
    pub fn new(font: Font, font_size: f32, color: Color) -> Self {
        Self {
            font,
            font_size,
            color,
        }
    }

    /// Default font and color at a specific size
    pub fn with_font_size(font_size: f32) -> Self {
        Self {
            font_size,
            ..Default::default()
        }
    }
}

// =============================================================================
// Style Overrides
// =============================================================================

/// Optional per-node style state.
///
/// Unset fields inherit from the [`RenderContext`] passed down during
/// measurement and drawing, not from the parent node. The three fields
/// are set and cleared independently.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Overrides {
    pub color: Option<Color>,
    pub font_size: Option<f32>,
    pub font: Option<Font>,
}

impl Overrides {
    /// Resolve the context seen by this node and passed on to its children.
    pub fn apply(&self, ctx: &RenderContext) -> RenderContext {
        RenderContext {
            font: self.font.unwrap_or(ctx.font),
            font_size: self.font_size.unwrap_or(ctx.font_size),
            color: self.color.unwrap_or(ctx.color),
        }
    }
}

// =============================================================================
// Symbols
// =============================================================================

/// A named glyph-like construct drawn procedurally rather than taken
/// straight from the font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexSymbol {
    /// Not-equal: an equals sign with a diagonal strike
    Neq,
    /// Canonical fallback for unrecognized symbol names, drawn as a
    /// marked question mark so bad input stays visible
    Unknown,
}

impl TexSymbol {
    /// Look up a symbol by name (e.g. `"neq"`).
    pub fn from_name(name: &str) -> TexResult<Self> {
        match name {
            "neq" => Ok(Self::Neq),
            _ => Err(TexError::UnknownSymbol(name.to_string())),
        }
    }

    /// The font glyph the symbol is built from.
    pub(crate) fn base_glyph(self) -> &'static str {
        match self {
            TexSymbol::Neq => "=",
            TexSymbol::Unknown => "?",
        }
    }
}

// =============================================================================
// Alignment
// =============================================================================

/// Vertical placement of children within a horizontal group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VAlign {
    Top,
    #[default]
    Center,
    Bottom,
}

impl VAlign {
    pub(crate) fn is_centered(self) -> bool {
        matches!(self, VAlign::Center)
    }
}

/// Horizontal placement of children within a vertical group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HAlign {
    Left,
    #[default]
    Center,
    Right,
}

// =============================================================================
// Node Content
// =============================================================================

/// Discriminant of a node's active content variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexMode {
    Space,
    VSpace,
    Text,
    Symbol,
    Fraction,
    Horizontal,
    Vertical,
    Matrix,
}

/// The active payload of a node, selected by its mode.
///
/// Measurement and drawing match on this exhaustively, so adding a
/// variant forces both walks to be revisited.
#[derive(Debug, Clone)]
pub enum TexContent {
    /// Horizontal blank advance, zero height
    Space { mu: f32 },
    /// Vertical blank advance, zero width
    VSpace { mu: f32 },
    /// A run of literal text
    Text(Cow<'static, str>),
    /// A procedurally drawn symbol
    Symbol(TexSymbol),
    /// Numerator over denominator with a rule between them
    Fraction {
        num: NodeRef,
        den: NodeRef,
        spacing_mu: f32,
    },
    /// Children laid out left to right
    Horizontal {
        children: Vec<NodeRef>,
        align: VAlign,
    },
    /// Children laid out top to bottom
    Vertical {
        children: Vec<NodeRef>,
        align: HAlign,
    },
    /// Fixed row-major grid of cells; always fully populated
    Matrix {
        rows: usize,
        cols: usize,
        cells: Vec<NodeRef>,
    },
}

// =============================================================================
// Child References
// =============================================================================

/// Handle to a subtree shared between several parents
pub type SharedNode = Rc<RefCell<TexNode>>;

/// Reference from a parent to a child subtree.
///
/// `Owned` ties the child's lifetime to the parent: dropping the parent
/// drops the subtree. `Shared` children are reference-counted and
/// outlive any single parent, which lets one subtree appear under
/// several parents and be mutated through any handle to it. A shared
/// child cannot be destroyed through a parent at all, so the
/// double-free and dangling-borrow cases are unrepresentable.
///
/// Cloning deep-copies an owned subtree and shares a shared one.
#[derive(Debug, Clone)]
pub enum NodeRef {
    Owned(Box<TexNode>),
    Shared(SharedNode),
}

impl NodeRef {
    /// Run `f` against the referenced node.
    pub fn with<R>(&self, f: impl FnOnce(&TexNode) -> R) -> R {
        match self {
            NodeRef::Owned(node) => f(node),
            NodeRef::Shared(node) => f(&node.borrow()),
        }
    }

    /// Run `f` against the referenced node with mutable access.
    pub fn with_mut<R>(&mut self, f: impl FnOnce(&mut TexNode) -> R) -> R {
        match self {
            NodeRef::Owned(node) => f(node),
            NodeRef::Shared(node) => f(&mut node.borrow_mut()),
        }
    }

    /// Mode of the referenced node
    pub fn mode(&self) -> TexMode {
        self.with(TexNode::mode)
    }
}

impl From<TexNode> for NodeRef {
    fn from(node: TexNode) -> Self {
        NodeRef::Owned(Box::new(node))
    }
}

impl From<SharedNode> for NodeRef {
    fn from(node: SharedNode) -> Self {
        NodeRef::Shared(node)
    }
}

impl From<&SharedNode> for NodeRef {
    fn from(node: &SharedNode) -> Self {
        NodeRef::Shared(Rc::clone(node))
    }
}

// =============================================================================
// Tex Node
// =============================================================================

/// A node in the box tree: one content variant plus optional style
/// overrides.
#[derive(Debug, Clone)]
pub struct TexNode {
    pub content: TexContent,
    pub overrides: Overrides,
}

impl TexNode {
    fn new(content: TexContent) -> Self {
        Self {
            content,
            overrides: Overrides::default(),
        }
    }

    /// Horizontal blank advance of `mu` layout units
    pub fn space(mu: f32) -> Self {
        Self::new(TexContent::Space { mu })
    }

    /// Vertical blank advance of `mu` layout units
    pub fn vspace(mu: f32) -> Self {
        Self::new(TexContent::VSpace { mu })
    }

    /// Zero-size filler, used to pad under-specified matrix rows
    pub fn blank() -> Self {
        Self::space(0.0)
    }

    /// A literal text run.
    ///
    /// Static string slices stay borrowed; formatted or generated text
    /// passes an owned `String` and the node keeps its own copy.
    pub fn text(content: impl Into<Cow<'static, str>>) -> Self {
        Self::new(TexContent::Text(content.into()))
    }

    /// A procedurally drawn symbol
    pub fn symbol(symbol: TexSymbol) -> Self {
        Self::new(TexContent::Symbol(symbol))
    }

    /// Look up `name` and build a symbol node.
    ///
    /// An unrecognized name is logged and falls back to the
    /// [`TexSymbol::Unknown`] glyph so rendering can proceed.
    pub fn symbol_named(name: &str) -> Self {
        match TexSymbol::from_name(name) {
            Ok(symbol) => Self::symbol(symbol),
            Err(err) => {
                tracing::warn!("symbol lookup failed, using fallback glyph: {err}");
                Self::symbol(TexSymbol::Unknown)
            }
        }
    }

    /// Numerator over denominator, separated from the rule by
    /// `spacing_mu` layout units on each side.
    ///
    /// Negative spacing is accepted but makes the numerator, rule, and
    /// denominator overlap.
    pub fn fraction(
        num: impl Into<NodeRef>,
        den: impl Into<NodeRef>,
        spacing_mu: f32,
    ) -> Self {
        Self::new(TexContent::Fraction {
            num: num.into(),
            den: den.into(),
            spacing_mu,
        })
    }

    /// Children laid out left to right, in call order
    pub fn horizontal(align: VAlign, children: Vec<NodeRef>) -> Self {
        Self::new(TexContent::Horizontal { children, align })
    }

    /// Children laid out top to bottom, in call order
    pub fn vertical(align: HAlign, children: Vec<NodeRef>) -> Self {
        Self::new(TexContent::Vertical { children, align })
    }

    /// A `rows` x `cols` grid built from row-major `cells`.
    ///
    /// Missing trailing cells are padded with [`TexNode::blank`];
    /// supplying more cells than the grid holds is an error.
    pub fn matrix(rows: usize, cols: usize, cells: Vec<NodeRef>) -> TexResult<Self> {
        let expected = rows * cols;
        if cells.len() > expected {
            return Err(TexError::MalformedMatrix {
                rows,
                cols,
                supplied: cells.len(),
            });
        }
        let mut cells = cells;
        if cells.len() < expected {
            tracing::debug!(
                missing = expected - cells.len(),
                "padding matrix with blank cells"
            );
            while cells.len() < expected {
                cells.push(TexNode::blank().into());
            }
        }
        Ok(Self::new(TexContent::Matrix { rows, cols, cells }))
    }

    /// Wrap the node for sharing between multiple parents.
    pub fn into_shared(self) -> SharedNode {
        Rc::new(RefCell::new(self))
    }

    /// Discriminant of the active content variant
    pub fn mode(&self) -> TexMode {
        match &self.content {
            TexContent::Space { .. } => TexMode::Space,
            TexContent::VSpace { .. } => TexMode::VSpace,
            TexContent::Text(_) => TexMode::Text,
            TexContent::Symbol(_) => TexMode::Symbol,
            TexContent::Fraction { .. } => TexMode::Fraction,
            TexContent::Horizontal { .. } => TexMode::Horizontal,
            TexContent::Vertical { .. } => TexMode::Vertical,
            TexContent::Matrix { .. } => TexMode::Matrix,
        }
    }

    /// Number of direct children
    pub fn child_count(&self) -> usize {
        match &self.content {
            TexContent::Fraction { .. } => 2,
            TexContent::Horizontal { children, .. }
            | TexContent::Vertical { children, .. } => children.len(),
            TexContent::Matrix { cells, .. } => cells.len(),
            _ => 0,
        }
    }

    /// Bounds-checked child accessor.
    ///
    /// For fractions, index 0 is the numerator and index 1 the
    /// denominator. Matrix cells are addressed by flat row-major index
    /// (see [`TexNode::cell`] for coordinates).
    pub fn child(&self, index: usize) -> TexResult<&NodeRef> {
        match &self.content {
            TexContent::Fraction { num, den, .. } => match index {
                0 => Ok(num),
                1 => Ok(den),
                _ => Err(TexError::ChildIndex { index, count: 2 }),
            },
            TexContent::Horizontal { children, .. }
            | TexContent::Vertical { children, .. } => {
                let count = children.len();
                children.get(index).ok_or(TexError::ChildIndex { index, count })
            }
            TexContent::Matrix { cells, .. } => {
                let count = cells.len();
                cells.get(index).ok_or(TexError::ChildIndex { index, count })
            }
            _ => {
                tracing::warn!(mode = ?self.mode(), index, "child access on a childless node");
                Err(TexError::WrongMode {
                    mode: self.mode(),
                    operation: "child access",
                })
            }
        }
    }

    /// Mutable counterpart of [`TexNode::child`]
    pub fn child_mut(&mut self, index: usize) -> TexResult<&mut NodeRef> {
        let mode = self.mode();
        match &mut self.content {
            TexContent::Fraction { num, den, .. } => match index {
                0 => Ok(num),
                1 => Ok(den),
                _ => Err(TexError::ChildIndex { index, count: 2 }),
            },
            TexContent::Horizontal { children, .. }
            | TexContent::Vertical { children, .. } => {
                let count = children.len();
                children
                    .get_mut(index)
                    .ok_or(TexError::ChildIndex { index, count })
            }
            TexContent::Matrix { cells, .. } => {
                let count = cells.len();
                cells
                    .get_mut(index)
                    .ok_or(TexError::ChildIndex { index, count })
            }
            _ => {
                tracing::warn!(mode = ?mode, index, "child access on a childless node");
                Err(TexError::WrongMode {
                    mode,
                    operation: "child access",
                })
            }
        }
    }

    /// Bounds-checked matrix cell accessor
    pub fn cell(&self, row: usize, col: usize) -> TexResult<&NodeRef> {
        match &self.content {
            TexContent::Matrix { rows, cols, cells } => {
                if row >= *rows || col >= *cols {
                    return Err(TexError::CellIndex {
                        row,
                        col,
                        rows: *rows,
                        cols: *cols,
                    });
                }
                Ok(&cells[row * cols + col])
            }
            _ => {
                tracing::warn!(mode = ?self.mode(), row, col, "cell access on a non-matrix node");
                Err(TexError::WrongMode {
                    mode: self.mode(),
                    operation: "cell access",
                })
            }
        }
    }

    /// Mutable counterpart of [`TexNode::cell`]
    pub fn cell_mut(&mut self, row: usize, col: usize) -> TexResult<&mut NodeRef> {
        let mode = self.mode();
        match &mut self.content {
            TexContent::Matrix { rows, cols, cells } => {
                if row >= *rows || col >= *cols {
                    return Err(TexError::CellIndex {
                        row,
                        col,
                        rows: *rows,
                        cols: *cols,
                    });
                }
                Ok(&mut cells[row * *cols + col])
            }
            _ => {
                tracing::warn!(mode = ?mode, row, col, "cell access on a non-matrix node");
                Err(TexError::WrongMode {
                    mode,
                    operation: "cell access",
                })
            }
        }
    }

    /// Insert `child` at `index` in a horizontal or vertical group.
    pub fn insert_child(&mut self, index: usize, child: impl Into<NodeRef>) -> TexResult<()> {
        let mode = self.mode();
        match &mut self.content {
            TexContent::Horizontal { children, .. }
            | TexContent::Vertical { children, .. } => {
                if index > children.len() {
                    return Err(TexError::ChildIndex {
                        index,
                        count: children.len(),
                    });
                }
                children.insert(index, child.into());
                Ok(())
            }
            _ => {
                tracing::warn!(mode = ?mode, index, "insert_child on a node without an ordered child list");
                Err(TexError::WrongMode {
                    mode,
                    operation: "insert_child",
                })
            }
        }
    }

    /// Detach and return the child at `index` from a horizontal or
    /// vertical group; the caller decides its new owner.
    pub fn remove_child(&mut self, index: usize) -> TexResult<NodeRef> {
        let mode = self.mode();
        match &mut self.content {
            TexContent::Horizontal { children, .. }
            | TexContent::Vertical { children, .. } => {
                if index >= children.len() {
                    return Err(TexError::ChildIndex {
                        index,
                        count: children.len(),
                    });
                }
                Ok(children.remove(index))
            }
            _ => {
                tracing::warn!(mode = ?mode, index, "remove_child on a node without an ordered child list");
                Err(TexError::WrongMode {
                    mode,
                    operation: "remove_child",
                })
            }
        }
    }

    // Override setters and clearers. Each field is independent.

    pub fn set_color(&mut self, color: Color) {
        self.overrides.color = Some(color);
    }

    pub fn clear_color(&mut self) {
        self.overrides.color = None;
    }

    pub fn set_font_size(&mut self, font_size: f32) {
        self.overrides.font_size = Some(font_size);
    }

    pub fn clear_font_size(&mut self) {
        self.overrides.font_size = None;
    }

    pub fn set_font(&mut self, font: Font) {
        self.overrides.font = Some(font);
    }

    pub fn clear_font(&mut self) {
        self.overrides.font = None;
    }

    /// Builder-style color override
    pub fn with_color(mut self, color: Color) -> Self {
        self.set_color(color);
        self
    }

    /// Builder-style font-size override
    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.set_font_size(font_size);
        self
    }

    /// Builder-style font override
    pub fn with_font(mut self, font: Font) -> Self {
        self.set_font(font);
        self
    }
}

// =============================================================================
// Tests
// =============================================================================
