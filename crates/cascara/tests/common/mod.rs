//! In-memory rule tree shared by the integration suites

// Not every suite uses every helper.
#![allow(dead_code)]

use std::any::Any;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cascara::{Closure, Environment, Frame, Node, Selector, Value, Variable};

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

/// Mixin-call selector matching rulesets by name.
#[derive(Debug)]
pub struct ByName(pub &'static str);

impl Selector for ByName {}

/// A statement position inside a block, standing in for an AST node.
#[derive(Debug)]
pub struct CallSite(pub &'static str);

impl Node for CallSite {}

/// A rule block: variables, nested rulesets, and clone ancestry.
#[derive(Debug)]
pub struct Block {
    id: usize,
    ancestry: Vec<usize>,
    name: Option<&'static str>,
    variables: Vec<(String, Value)>,
    rulesets: Vec<Rc<Block>>,
}

impl Block {
    pub fn new() -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            ancestry: Vec::new(),
            name: None,
            variables: Vec::new(),
            rulesets: Vec::new(),
        }
    }

    /// A block invokable as a mixin under `name`.
    pub fn named(name: &'static str) -> Self {
        Self {
            name: Some(name),
            ..Self::new()
        }
    }

    /// Copy `origin`, keeping a record of the ancestry. The copy may be
    /// renamed afterwards; ancestry, not the name, is what recursion
    /// dedup keys on.
    pub fn cloned_from(origin: &Block) -> Self {
        let mut ancestry = origin.ancestry.clone();
        ancestry.push(origin.id);
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            ancestry,
            name: origin.name,
            variables: origin.variables.clone(),
            rulesets: origin.rulesets.clone(),
        }
    }

    pub fn rename(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_variable(mut self, name: &str, value: Value) -> Self {
        self.variables.push((name.to_string(), value));
        self
    }

    pub fn with_ruleset(mut self, child: Rc<Block>) -> Self {
        self.rulesets.push(child);
        self
    }
}

impl Node for Block {}

impl Frame for Block {
    fn variable(&self, name: &str, _from: Option<&dyn Node>) -> Option<Variable> {
        // Whole-block visibility: a binding is visible from anywhere in the
        // block, regardless of textual order.
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(n, v)| Variable::new(n.clone(), v.clone()))
    }

    fn find(
        &self,
        env: &Environment,
        selector: &dyn Selector,
        context: Option<&dyn Frame>,
    ) -> Vec<Closure> {
        let any: &dyn Any = selector;
        let Some(ByName(name)) = any.downcast_ref::<ByName>() else {
            return Vec::new();
        };
        let mut found = Vec::new();
        for child in &self.rulesets {
            if child.name == Some(*name) {
                found.push(Closure::new(
                    Rc::clone(child) as Rc<dyn Frame>,
                    vec![Rc::clone(child) as Rc<dyn Frame>],
                ));
            }
            found.extend(child.find(env, selector, context));
        }
        found
    }

    fn is_equal_or_cloned_from(&self, other: &dyn Frame) -> bool {
        let any: &dyn Any = other;
        match any.downcast_ref::<Block>() {
            Some(other) => self.id == other.id || self.ancestry.contains(&other.id),
            None => false,
        }
    }
}
