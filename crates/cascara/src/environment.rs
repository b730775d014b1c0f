//! Evaluation environment: scope stack, lookup algorithms, shared registries

mod guard;

pub use guard::ScopeGuard;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::EnvironmentError;
use crate::extensions::{Extension, ExtensionRegistry};
use crate::functions::{FunctionConstructor, FunctionModule, FunctionRegistry, StyleFunction};
use crate::tree::{Closure, Frame, Node, OutputHandle, Selector, Variable};

/// The evaluation environment for one compilation unit.
///
/// Owns the active scope stack and the current evaluation cursor, and shares
/// the function/extension registries with every child forked from it. The
/// external tree-walking evaluator pushes a frame when it enters a rule block,
/// pops it on the way out, and calls the lookup methods in between.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use cascara::{Closure, Environment, Frame, Node, Selector, Value, Variable};
///
/// #[derive(Debug)]
/// struct Block(Vec<(String, Value)>);
///
/// impl Node for Block {}
///
/// impl Frame for Block {
///     fn variable(&self, name: &str, _from: Option<&dyn Node>) -> Option<Variable> {
///         self.0
///             .iter()
///             .find(|(n, _)| n == name)
///             .map(|(n, v)| Variable::new(n.clone(), v.clone()))
///     }
///
///     fn find(
///         &self,
///         _env: &Environment,
///         _selector: &dyn Selector,
///         _context: Option<&dyn Frame>,
///     ) -> Vec<Closure> {
///         Vec::new()
///     }
///
///     fn is_equal_or_cloned_from(&self, _other: &dyn Frame) -> bool {
///         false
///     }
/// }
///
/// let mut env = Environment::new();
/// env.push_frame(Rc::new(Block(vec![("@x".into(), Value::number(1.0))])));
/// env.push_frame(Rc::new(Block(vec![("@x".into(), Value::number(2.0))])));
///
/// // The innermost definition shadows the outer one.
/// let var = env.find_variable("@x").unwrap();
/// assert_eq!(var.value, Value::number(2.0));
/// ```
pub struct Environment {
    /// Active frame chain, outermost first, innermost last
    frames: Vec<Rc<dyn Frame>>,

    /// Callable functions, shared across forks
    functions: Rc<RefCell<FunctionRegistry>>,

    /// Registered extensions, shared across forks
    extensions: Rc<RefCell<ExtensionRegistry>>,

    /// Node currently being evaluated; default origin for variable lookups
    cursor: Option<Rc<dyn Node>>,

    /// Forwarding handle to the output stage's sink
    output: Option<OutputHandle>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Create an environment with an empty scope stack and the bundled
    /// function set already discovered.
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            functions: Rc::new(RefCell::new(FunctionRegistry::with_builtins())),
            extensions: Rc::new(RefCell::new(ExtensionRegistry::new())),
            cursor: None,
            output: None,
        }
    }

    /// Create an environment with an initial frame chain, outermost first.
    pub fn with_frames(frames: Vec<Rc<dyn Frame>>) -> Self {
        Self {
            frames,
            ..Self::new()
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Frame Management (Scope Entry/Exit)
    // ═══════════════════════════════════════════════════════════════════

    /// Enter a rule block: push its frame onto the scope stack.
    pub fn push_frame(&mut self, frame: Rc<dyn Frame>) {
        self.frames.push(frame);
    }

    /// Leave the current rule block: pop and return its frame.
    ///
    /// The evaluator keeps the root frame on the stack for the whole
    /// evaluation; the environment does not enforce that invariant itself.
    pub fn pop_frame(&mut self) -> Option<Rc<dyn Frame>> {
        self.frames.pop()
    }

    /// The innermost active frame, if any.
    pub fn current_frame(&self) -> Option<&Rc<dyn Frame>> {
        self.frames.last()
    }

    /// Number of active frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Active frames, innermost to outermost.
    pub fn frames(&self) -> impl Iterator<Item = &Rc<dyn Frame>> {
        self.frames.iter().rev()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Evaluation Cursor
    // ═══════════════════════════════════════════════════════════════════

    /// Mark `node` as the point currently being evaluated.
    ///
    /// The cursor is the default visibility origin for [`find_variable`];
    /// the evaluator reassigns it as it advances.
    ///
    /// [`find_variable`]: Environment::find_variable
    pub fn set_cursor(&mut self, node: Rc<dyn Node>) {
        self.cursor = Some(node);
    }

    /// The node currently being evaluated, if the evaluator set one.
    pub fn cursor(&self) -> Option<&Rc<dyn Node>> {
        self.cursor.as_ref()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Variable Resolution
    // ═══════════════════════════════════════════════════════════════════

    /// Resolve `name` from the current cursor position.
    ///
    /// See [`find_variable_from`] for the search order.
    ///
    /// [`find_variable_from`]: Environment::find_variable_from
    pub fn find_variable(&self, name: &str) -> Option<Variable> {
        self.find_variable_from(name, self.cursor.as_deref())
    }

    /// Resolve `name` starting from position `from`.
    ///
    /// Frames are consulted innermost to outermost and the first match wins,
    /// so a nearer definition shadows any same-named binding further out. The
    /// visibility position starts as `from` and becomes the just-consulted
    /// frame on each step outward: a rule block is a scope unit, so its
    /// bindings are visible to nested blocks regardless of textual order
    /// within the block.
    ///
    /// Exhausting the stack yields `None`. That is not an error here; a
    /// caller such as a guarded conditional decides whether an undefined
    /// variable aborts the compile.
    pub fn find_variable_from(&self, name: &str, from: Option<&dyn Node>) -> Option<Variable> {
        let mut position = from;
        for frame in self.frames.iter().rev() {
            if let Some(variable) = frame.variable(name, position) {
                trace!(name, "variable resolved");
                return Some(variable);
            }
            let consulted: &dyn Node = frame.as_ref();
            position = Some(consulted);
        }
        trace!(name, "variable unresolved");
        None
    }

    // ═══════════════════════════════════════════════════════════════════
    // Ruleset / Mixin Matching
    // ═══════════════════════════════════════════════════════════════════

    /// Find the closures a mixin call resolves to.
    ///
    /// Frames are searched innermost to outermost; the first frame whose
    /// subtree yields any surviving match ends the search, so an inner-scope
    /// ruleset shadows an outer one with the same selector. A closure is
    /// dropped when its target frame is identical to, or was cloned from,
    /// any frame already on the scope stack; that is what keeps a mixin from
    /// matching itself or an active ancestor and recursing without bound.
    ///
    /// An empty result means "no matching mixin" and is the caller's to
    /// interpret.
    pub fn find_rulesets(&self, selector: &dyn Selector) -> Vec<Closure> {
        for frame in self.frames.iter().rev() {
            let mut matched = frame.find(self, selector, None);
            matched.retain(|closure| {
                !self
                    .frames
                    .iter()
                    .any(|active| closure.frame.is_equal_or_cloned_from(active.as_ref()))
            });
            if !matched.is_empty() {
                trace!(?selector, count = matched.len(), "mixin call matched");
                return matched;
            }
        }
        trace!(?selector, "mixin call unmatched");
        Vec::new()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Function Registry Access
    // ═══════════════════════════════════════════════════════════════════

    /// Bind `name` to a function constructor in the shared registry.
    pub fn add_function(
        &self,
        name: &str,
        constructor: FunctionConstructor,
    ) -> Result<(), EnvironmentError> {
        self.functions.borrow_mut().register(name, constructor)
    }

    /// Discover every implementation in `module` into the shared registry.
    pub fn discover_functions(&self, module: &dyn FunctionModule) -> Result<(), EnvironmentError> {
        self.functions.borrow_mut().discover(module)
    }

    /// Construct the function registered under `name`, if any.
    ///
    /// `None` marks an unresolved identifier, not an error.
    pub fn function(&self, name: &str) -> Option<Box<dyn StyleFunction>> {
        self.functions.borrow().lookup(name)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Extension Registry Access
    // ═══════════════════════════════════════════════════════════════════

    /// Register `ext` and immediately run its setup hook against this
    /// environment.
    ///
    /// Fails if an extension of the same concrete type is already
    /// registered; the hook does not run in that case.
    pub fn add_extension(&self, ext: Rc<dyn Extension>) -> Result<(), EnvironmentError> {
        self.extensions.borrow_mut().add(Rc::clone(&ext))?;
        ext.setup(self);
        Ok(())
    }

    /// Retrieve the registered extension of type `T`.
    ///
    /// # Panics
    ///
    /// Panics if no `T` was registered; see [`ExtensionRegistry::get`].
    pub fn get_extension<T: Extension>(&self) -> Rc<T> {
        self.extensions.borrow().get::<T>()
    }

    /// Whether an extension of type `T` is registered.
    pub fn has_extension<T: Extension>(&self) -> bool {
        self.extensions.borrow().contains::<T>()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Output Sink
    // ═══════════════════════════════════════════════════════════════════

    /// Attach the output stage's sink.
    pub fn set_output(&mut self, sink: OutputHandle) {
        self.output = Some(sink);
    }

    /// The attached output sink, if any.
    pub fn output(&self) -> Option<OutputHandle> {
        self.output.clone()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Forking
    // ═══════════════════════════════════════════════════════════════════

    /// Create a child environment over `frames` for nested evaluation, e.g.
    /// a mixin body evaluated in its capture scope.
    ///
    /// The child owns an independent scope stack, so its pushes and pops
    /// never disturb this environment, while both share the same function
    /// and extension registries without re-running discovery. Registration
    /// is expected to be finished before the first fork; past that point the
    /// registries are effectively read-only.
    pub fn fork_child(&self, frames: Vec<Rc<dyn Frame>>) -> Environment {
        debug!(frames = frames.len(), "forking child environment");
        Environment {
            frames,
            functions: Rc::clone(&self.functions),
            extensions: Rc::clone(&self.extensions),
            cursor: self.cursor.clone(),
            output: self.output.clone(),
        }
    }
}
