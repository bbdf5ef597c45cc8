use std::rc::Rc;

use ows_core::{CommandNode, OwsValue};

use crate::store::TempScope;

/// What a command hands back to whoever invoked it.
#[derive(Debug, Clone)]
pub enum Outcome {
    Value(OwsValue),
    /// Run this command in the caller's place.
    TailCall(Rc<CommandNode>),
    Jump(Jump),
    Signal(Signal),
}

impl Outcome {
    pub fn unit() -> Self {
        Self::Value(OwsValue::Unit)
    }
}

impl From<OwsValue> for Outcome {
    fn from(value: OwsValue) -> Self {
        Self::Value(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    GoTo,
    Do,
}

#[derive(Debug, Clone)]
pub struct Jump {
    pub kind: JumpKind,
    pub line: usize,
    pub from_line: usize,
    pub scope: TempScope,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    End,
    Return(OwsValue),
    ReturnAll(OwsValue),
    GoBack,
    Exit(FrameExit),
}

/// How an engine frame finished.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameExit {
    Ended,
    Returned(OwsValue),
    ReturnedAll(OwsValue),
    WentBack,
    /// Ran past the last line. Carries the last non-unit value produced.
    Completed(Option<OwsValue>),
}

/// An outcome with every tail call and jump already followed.
#[derive(Debug, Clone, PartialEq)]
pub enum Settled {
    Value(OwsValue),
    Signal(Signal),
}

impl From<Settled> for Outcome {
    fn from(settled: Settled) -> Self {
        match settled {
            Settled::Value(value) => Self::Value(value),
            Settled::Signal(signal) => Self::Signal(signal),
        }
    }
}
