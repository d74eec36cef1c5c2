//! Variable scopes and the call-frame stack
//!
//! Reads look in the global scope first, then in the innermost frame.
//! Writes always go to the innermost frame. Entering `startup` pushes the
//! global scope itself as the frame, which is how variables become global.

use crate::lang::is_startup;
use crate::runner::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Variable bindings. Names are case sensitive.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Scope {
    vars: HashMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_string(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Shared handle to a scope
pub type ScopeRef = Rc<RefCell<Scope>>;

/// The global scope plus one frame per active call
#[derive(Debug)]
pub struct Frames {
    global: ScopeRef,
    stack: Vec<ScopeRef>,
}

impl Frames {
    pub fn new() -> Self {
        Frames {
            global: Rc::new(RefCell::new(Scope::new())),
            stack: Vec::new(),
        }
    }

    /// Push the frame for a call to `task_name`
    pub fn enter(&mut self, task_name: &str) {
        let frame = if is_startup(task_name) {
            Rc::clone(&self.global)
        } else {
            Rc::new(RefCell::new(Scope::new()))
        };
        self.stack.push(frame);
    }

    /// Pop the innermost frame. The global scope outlives its frame entry.
    pub fn leave(&mut self) {
        self.stack.pop();
    }

    /// Number of active calls
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Resolve a name: global scope first, then the innermost frame
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.global.borrow().get(name) {
            return Some(value.clone());
        }
        self.stack
            .last()
            .and_then(|frame| frame.borrow().get(name).cloned())
    }

    /// Bind a name in the innermost frame (the global scope outside any call)
    pub fn assign(&mut self, name: &str, value: Value) {
        let frame = self.stack.last().unwrap_or(&self.global);
        frame.borrow_mut().set(name, value);
    }

    /// A snapshot of the global scope
    pub fn globals(&self) -> Scope {
        self.global.borrow().clone()
    }
}

impl Default for Frames {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_frames_are_discarded() {
        let mut frames = Frames::new();
        frames.enter("build");
        frames.assign("X", Value::from("local"));
        assert_eq!(frames.lookup("X"), Some(Value::from("local")));
        frames.leave();
        assert_eq!(frames.lookup("X"), None);
        assert_eq!(frames.depth(), 0);
    }

    #[test]
    fn test_startup_writes_global_scope() {
        let mut frames = Frames::new();
        frames.enter("Startup");
        frames.assign("X", Value::from("hi"));
        frames.leave();

        frames.enter("greet");
        assert_eq!(frames.lookup("X"), Some(Value::from("hi")));
        frames.leave();
        assert!(frames.globals().contains("X"));
    }

    #[test]
    fn test_global_shadows_local() {
        let mut frames = Frames::new();
        frames.enter("startup");
        frames.assign("X", Value::from("global"));
        frames.enter("task");
        frames.assign("X", Value::from("local"));
        assert_eq!(frames.lookup("X"), Some(Value::from("global")));
        assert_eq!(frames.depth(), 2);
    }

    #[test]
    fn test_only_innermost_frame_is_visible() {
        let mut frames = Frames::new();
        frames.enter("outer");
        frames.assign("A", Value::from("outer"));
        frames.enter("inner");
        assert_eq!(frames.lookup("A"), None);
        frames.leave();
        assert_eq!(frames.lookup("A"), Some(Value::from("outer")));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut scope = Scope::new();
        scope.set("NAME", Value::from("a"));
        assert!(scope.get("Name").is_none());
        assert_eq!(scope.len(), 1);
    }
}
