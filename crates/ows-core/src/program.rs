use std::collections::BTreeMap;
use std::rc::Rc;

use crate::ir::CommandNode;

/// Immutable result of compiling a set of source fragments.
#[derive(Debug, Clone, Default)]
pub struct CompiledProgram {
    pub labels: BTreeMap<String, usize>,
    pub line_labels: BTreeMap<usize, String>,
    /// Sparse: blank and comment-only lines have no entry.
    pub commands: BTreeMap<usize, Rc<CommandNode>>,
    pub start_line: usize,
    pub line_count: usize,
    pub pre_start_text: String,
    pub post_start_text: String,
    pub raw_text: String,
}

impl CompiledProgram {
    pub fn command_at(&self, line: usize) -> Option<&Rc<CommandNode>> {
        self.commands.get(&line)
    }

    pub fn label_line(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }

    pub fn label_at(&self, line: usize) -> Option<&str> {
        self.line_labels.get(&line).map(String::as_str)
    }
}

/// A single line compiled on its own, for hosts that assemble commands.
#[derive(Debug, Clone, Default)]
pub struct CompiledLine {
    pub label: Option<String>,
    pub command: Option<Rc<CommandNode>>,
}
