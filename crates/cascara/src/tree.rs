//! Contract between the environment and the externally supplied rule tree
//!
//! The parser owns the concrete AST; the environment only needs the narrow
//! surface below. Keeping the boundary as object-safe traits means the
//! environment never learns node shapes, selector grammar, or how a frame
//! orders its own bindings.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::environment::Environment;
use crate::value::Value;

/// Any position in the rule tree.
///
/// Nodes are opaque to the environment; they exist to mark *where* evaluation
/// currently is, which frames use to decide binding visibility. The `Any`
/// supertrait lets the tree recover its own concrete types at the boundary
/// (the environment itself never downcasts).
pub trait Node: Any + std::fmt::Debug {}

/// An opaque mixin-call selector.
///
/// Matching a selector against a ruleset is the frame's concern; the
/// environment only carries the selector from caller to frame.
pub trait Selector: Any + std::fmt::Debug {}

/// One rule block acting as a scope unit.
///
/// Frames are owned by the rule tree and live for the whole compile; the
/// environment holds them on its scope stack only while the block is being
/// evaluated.
pub trait Frame: Node {
    /// Look up a binding named `name` defined by this frame and visible from
    /// position `from`.
    ///
    /// `None` means "this frame defines no such binding" and must stay
    /// distinct from a binding whose value happens to be empty. How the frame
    /// weighs `from` against its own internal ordering is its contract; a
    /// rule block is normally a scope unit, visible to nested blocks
    /// regardless of textual order.
    fn variable(&self, name: &str, from: Option<&dyn Node>) -> Option<Variable>;

    /// Collect every closure in this frame's subtree whose selector matches.
    ///
    /// `context`, when present, is the frame on whose behalf the search runs;
    /// implementations may use it to scope nested resolution.
    fn find(
        &self,
        env: &Environment,
        selector: &dyn Selector,
        context: Option<&dyn Frame>,
    ) -> Vec<Closure>;

    /// Whether this frame *is* `other`, or was produced by cloning it
    /// (directly or through intermediate clones).
    ///
    /// Identity and clone ancestry, not name equality: mixins may be copied
    /// or renamed, and a renamed copy recursing into its origin must still be
    /// caught.
    fn is_equal_or_cloned_from(&self, other: &dyn Frame) -> bool;
}

/// A named, evaluated binding living inside a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// The binding's name
    pub name: String,

    /// The evaluated value
    pub value: Value,
}

impl Variable {
    /// Create a binding.
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A matched mixin/ruleset body paired with its capture scope.
///
/// This is the unit returned by mixin lookup: the frame to evaluate plus the
/// frame chain it should be evaluated in.
#[derive(Debug, Clone)]
pub struct Closure {
    /// The matched rule block
    pub frame: Rc<dyn Frame>,

    /// Frames captured at the definition site, outermost first
    pub context: Vec<Rc<dyn Frame>>,
}

impl Closure {
    /// Create a closure capturing `context`.
    pub fn new(frame: Rc<dyn Frame>, context: Vec<Rc<dyn Frame>>) -> Self {
        Self { frame, context }
    }
}

/// Opaque output sink the environment forwards to its consumers.
///
/// Rendering lives in the output stage; the environment only hands the
/// sink around.
pub trait Output {
    /// Append a chunk of rendered output.
    fn append(&mut self, chunk: &str);
}

/// Shared handle to an output sink.
pub type OutputHandle = Rc<RefCell<dyn Output>>;
