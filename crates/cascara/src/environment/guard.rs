//! RAII scope guard for automatic frame cleanup

use std::rc::Rc;

use super::Environment;
use crate::tree::Frame;

/// RAII guard that pops the pushed frame when dropped.
///
/// Evaluator code that enters a rule block and must leave it on every exit
/// path (including `?` returns) uses this instead of a manual
/// `push_frame`/`pop_frame` pair.
pub struct ScopeGuard<'a> {
    env: &'a mut Environment,
}

impl Environment {
    /// Push `frame` now and pop it when the returned guard is dropped.
    pub fn scope_guard(&mut self, frame: Rc<dyn Frame>) -> ScopeGuard<'_> {
        self.push_frame(frame);
        ScopeGuard { env: self }
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.env.pop_frame();
    }
}

impl std::ops::Deref for ScopeGuard<'_> {
    type Target = Environment;

    fn deref(&self) -> &Self::Target {
        self.env
    }
}

impl std::ops::DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Closure, Node, Selector, Variable};

    #[derive(Debug)]
    struct Block;

    impl Node for Block {}

    impl Frame for Block {
        fn variable(&self, _name: &str, _from: Option<&dyn Node>) -> Option<Variable> {
            None
        }

        fn find(
            &self,
            _env: &Environment,
            _selector: &dyn Selector,
            _context: Option<&dyn Frame>,
        ) -> Vec<Closure> {
            Vec::new()
        }

        fn is_equal_or_cloned_from(&self, _other: &dyn Frame) -> bool {
            false
        }
    }

    #[test]
    fn test_scope_guard_creates_frame() {
        let mut env = Environment::new();
        {
            let guard = env.scope_guard(Rc::new(Block));
            assert_eq!(guard.depth(), 1);
        }
    }

    #[test]
    fn test_scope_guard_drops_frame() {
        let mut env = Environment::new();
        {
            let _guard = env.scope_guard(Rc::new(Block));
        }
        assert_eq!(env.depth(), 0);
    }

    #[test]
    fn test_scope_guard_nested_scopes() {
        let mut env = Environment::new();
        env.push_frame(Rc::new(Block));

        {
            let mut guard1 = env.scope_guard(Rc::new(Block));
            assert_eq!(guard1.depth(), 2);

            {
                let guard2 = guard1.scope_guard(Rc::new(Block));
                assert_eq!(guard2.depth(), 3);
            }

            assert_eq!(guard1.depth(), 2);
        }

        assert_eq!(env.depth(), 1);
    }

    #[test]
    fn test_scope_guard_deref_mut_write() {
        let mut env = Environment::new();
        {
            let mut guard = env.scope_guard(Rc::new(Block));
            guard.push_frame(Rc::new(Block));
            guard.pop_frame();
            assert_eq!(guard.depth(), 1);
        }
        assert_eq!(env.depth(), 0);
    }
}
