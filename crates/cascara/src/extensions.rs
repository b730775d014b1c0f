//! Compiler extension registry

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::environment::Environment;
use crate::error::EnvironmentError;

/// A stateful singleton plugin attached to the evaluation environment.
///
/// At most one extension of each concrete type can be registered. An
/// extension needing mutable state keeps it behind interior mutability;
/// the registry only ever hands out shared references.
pub trait Extension: Any {
    /// Name used in diagnostics and error messages.
    fn name(&self) -> &'static str;

    /// Called once, immediately after successful registration.
    ///
    /// Receives the environment so the extension can wire itself in, e.g.
    /// register additional functions.
    fn setup(&self, env: &Environment);
}

/// Singleton-per-kind table of registered extensions.
///
/// Kinds are the extensions' concrete types, so the key set is closed at
/// compile time.
#[derive(Default)]
pub struct ExtensionRegistry {
    entries: HashMap<TypeId, Rc<dyn Extension>>,
}

impl ExtensionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register `ext` under its concrete type.
    ///
    /// Registering a second extension of the same type is a usage error and
    /// leaves the registry unchanged. The setup hook is the environment's
    /// job; see [`Environment::add_extension`].
    pub fn add(&mut self, ext: Rc<dyn Extension>) -> Result<(), EnvironmentError> {
        let kind = ext.as_ref().type_id();
        if self.entries.contains_key(&kind) {
            return Err(EnvironmentError::DuplicateExtension { name: ext.name() });
        }
        debug!(name = ext.name(), "extension registered");
        self.entries.insert(kind, ext);
        Ok(())
    }

    /// Retrieve the registered extension of type `T`.
    ///
    /// # Panics
    ///
    /// Panics if no extension of type `T` was ever registered. Well-formed
    /// code registers before it looks up, so a missing kind is a programming
    /// error and fails loudly rather than returning an empty result.
    pub fn get<T: Extension>(&self) -> Rc<T> {
        match self.entries.get(&TypeId::of::<T>()) {
            Some(ext) => {
                let ext: Rc<dyn Extension> = Rc::clone(ext);
                let any: Rc<dyn Any> = ext;
                let Ok(typed) = any.downcast::<T>() else {
                    unreachable!("entry keyed by TypeId matches its concrete type")
                };
                typed
            }
            None => panic!(
                "extension `{}` was never registered",
                std::any::type_name::<T>()
            ),
        }
    }

    /// Whether an extension of type `T` is registered.
    pub fn contains<T: Extension>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered extensions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
