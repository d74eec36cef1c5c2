//! Depth-first traversal over program nodes
//!
//! [`walk`] calls the visitor on a node and then descends into every child,
//! whether or not the visitor did anything with the parent. Each node is
//! reached exactly once.

use crate::lang::ast::{Call, Command, Expr, Param, Subtask};
use crate::lang::program::{Program, Task};

/// A borrowed reference to any node in the tree
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Program(&'a Program),
    Task(&'a Task),
    Param(&'a Param),
    Subtask(&'a Subtask),
    Expr(&'a Expr),
    Call(&'a Call),
    Command(&'a Command),
}

impl<'a> Node<'a> {
    /// Direct children, in source order
    pub fn children(self) -> Vec<Node<'a>> {
        match self {
            Node::Program(program) => program.tasks().map(Node::Task).collect(),
            Node::Task(task) => {
                let mut children: Vec<Node<'a>> = task.params().iter().map(Node::Param).collect();
                if let Task::Defined(defined) = task {
                    children.extend(defined.subtasks.iter().map(Node::Subtask));
                }
                children
            }
            Node::Param(param) => param.default.iter().map(Node::Expr).collect(),
            Node::Subtask(subtask) => match subtask {
                Subtask::Assignment(assignment) => vec![Node::Expr(&assignment.value)],
                Subtask::Command(command) => vec![Node::Command(command)],
                Subtask::Call(call) => vec![Node::Call(call)],
            },
            Node::Expr(expr) => match expr {
                Expr::String(_) | Expr::Variable(_) => Vec::new(),
                Expr::Call(call) => vec![Node::Call(call)],
                Expr::Command(command) => vec![Node::Command(command)],
            },
            Node::Call(call) => call.args.iter().map(Node::Expr).collect(),
            Node::Command(_) => Vec::new(),
        }
    }
}

/// Visit `node` and all of its descendants, stopping at the first error
pub fn walk<'a, E, F>(node: Node<'a>, visit: &mut F) -> Result<(), E>
where
    F: FnMut(Node<'a>) -> Result<(), E>,
{
    visit(node)?;
    for child in node.children() {
        walk(child, visit)?;
    }
    Ok(())
}
