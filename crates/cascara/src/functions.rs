//! Callable function registry with pluggable module discovery

mod builtins;

pub use builtins::CoreFunctions;

use indexmap::IndexMap;
use tracing::debug;

use crate::environment::Environment;
use crate::error::{EnvironmentError, Result};
use crate::value::Value;

/// A callable function usable in style-sheet expressions.
///
/// The registry hands out a fresh instance per lookup, so an implementation
/// may keep per-call state in `&mut self` without leaking it across calls.
pub trait StyleFunction {
    /// Invoke the function on already-evaluated arguments.
    fn call(&mut self, env: &Environment, args: &[Value]) -> Result<Value>;
}

/// Constructor entry in the registry's static table.
pub type FunctionConstructor = fn() -> Box<dyn StyleFunction>;

/// A pluggable module of function implementations.
///
/// Stands in for runtime module scanning: a module enumerates its concrete
/// implementations as `(type name, constructor)` pairs and the registry
/// derives the callable names from the type names.
pub trait FunctionModule {
    /// Every non-abstract function implementation this module provides.
    fn implementations(&self) -> Vec<(&'static str, FunctionConstructor)>;
}

/// Name-to-constructor table for callable functions.
///
/// Names are case-insensitive. Re-registering an existing name silently
/// overwrites it, which is how user plugins override built-ins.
///
/// # Example
///
/// ```
/// use cascara::FunctionRegistry;
///
/// let registry = FunctionRegistry::with_builtins();
///
/// assert!(registry.lookup("darken").is_some());
/// assert!(registry.lookup("DARKEN").is_some()); // case-insensitive
/// assert!(registry.lookup("%").is_some()); // explicit alias
/// assert!(registry.lookup("marquee").is_none());
/// ```
#[derive(Default)]
pub struct FunctionRegistry {
    entries: IndexMap<String, FunctionConstructor>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Create a registry seeded with the bundled function set.
    ///
    /// Discovery covers [`CoreFunctions`]; on top of that, the literal `%`
    /// token maps to the C-style format function, a deliberate break from
    /// the derived-name convention.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .discover(&CoreFunctions)
            .expect("bundled function set carries well-formed type names");
        registry
            .register("%", builtins::format_function)
            .expect("`%` is a non-empty name");
        registry
    }

    /// Bind `name` to `constructor`.
    ///
    /// The name is normalized to lowercase. An existing binding under the
    /// same name is overwritten.
    pub fn register(
        &mut self,
        name: &str,
        constructor: FunctionConstructor,
    ) -> std::result::Result<(), EnvironmentError> {
        if name.is_empty() {
            return Err(EnvironmentError::EmptyFunctionName);
        }
        let key = name.to_ascii_lowercase();
        if self.entries.insert(key.clone(), constructor).is_some() {
            debug!(name = %key, "function binding overwritten");
        }
        Ok(())
    }

    /// Register every implementation `module` provides, deriving one or two
    /// names per implementation from its type name.
    ///
    /// The type name is processed as follows: a trailing `Function` suffix is
    /// stripped; a `-` is inserted before every interior uppercase letter;
    /// the result is lowercased and becomes the primary alias. If the primary
    /// alias contains a `-`, the `-`-stripped form is registered as well, so
    /// `ImageSizeFunction` answers to both `image-size` and `imagesize`.
    pub fn discover(
        &mut self,
        module: &dyn FunctionModule,
    ) -> std::result::Result<(), EnvironmentError> {
        let implementations = module.implementations();
        debug!(count = implementations.len(), "discovering function module");
        for (type_name, constructor) in implementations {
            let (primary, secondary) = aliases_for(type_name);
            self.register(&primary, constructor)?;
            if let Some(secondary) = secondary {
                self.register(&secondary, constructor)?;
            }
        }
        Ok(())
    }

    /// Construct the function registered under `name`.
    ///
    /// An unregistered name yields `None`; the caller treats the call as an
    /// unresolved identifier rather than an error.
    pub fn lookup(&self, name: &str) -> Option<Box<dyn StyleFunction>> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|constructor| constructor())
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    /// All registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Derive the callable aliases for an implementation type name.
fn aliases_for(type_name: &str) -> (String, Option<String>) {
    let stem = type_name.strip_suffix("Function").unwrap_or(type_name);
    let mut primary = String::with_capacity(stem.len() + 4);
    for (i, ch) in stem.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                primary.push('-');
            }
            primary.extend(ch.to_lowercase());
        } else {
            primary.push(ch);
        }
    }
    let secondary = primary.contains('-').then(|| primary.replace('-', ""));
    (primary, secondary)
}
