use std::cell::OnceCell;
use std::rc::Rc;

use crate::error::OwsError;
use crate::types::CommandSignature;
use crate::value::{ElementKind, OwsValue};

#[derive(Debug, Clone)]
pub enum Param {
    Value(OwsValue),
    Deferred(Deferred),
    Command(Rc<CommandNode>),
    Operation(Rc<Operation>),
    Collection(Rc<CollectionLiteral>),
    Bindings(Rc<Vec<(String, Param)>>),
    Absent,
}

/// References resolved against the execution context when read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deferred {
    Scoped(String),
    LoopIndex,
    LoopObject,
}

impl Param {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Value(OwsValue::Text(value.into()))
    }

    pub fn number(value: f64) -> Self {
        Self::Value(OwsValue::number(value))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::Deferred(Deferred::Scoped(name.into()))
    }

    pub fn variable_name(&self) -> Option<&str> {
        match self {
            Self::Deferred(Deferred::Scoped(name)) => Some(name),
            _ => None,
        }
    }

    pub fn literal_text(&self) -> Option<&str> {
        match self {
            Self::Value(OwsValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOperator {
    Plus,
    Minus,
    Times,
    Divide,
    Power,
    Modulo,
    Squared,
}

impl MathOperator {
    pub fn is_unary(self) -> bool {
        matches!(self, Self::Squared)
    }

    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            Self::Plus => left + right,
            Self::Minus => left - right,
            Self::Times => left * right,
            Self::Divide => left / right,
            Self::Power => left.powf(right),
            Self::Modulo => left % right,
            Self::Squared => left * left,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Times => "*",
            Self::Divide => "/",
            Self::Power => "^",
            Self::Modulo => "%",
            Self::Squared => "SQUARED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Identity,
    Not,
    Equals,
    GreaterThan,
    LessThan,
    And,
    Or,
}

/// Operators whose meaning depends on the left operand's runtime kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbiguousOperator {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecializedOperator {
    Math(MathOperator),
    Concat,
    Union,
    Difference,
    And,
}

#[derive(Debug, Clone)]
pub enum Operation {
    Math {
        op: MathOperator,
        left: Param,
        right: Option<Param>,
    },
    Concat {
        left: Param,
        right: Param,
    },
    CollectionSet {
        additive: bool,
        left: Param,
        right: Param,
    },
    Condition {
        comparator: Comparator,
        left: Param,
        right: Option<Param>,
    },
    Unknown {
        operator: AmbiguousOperator,
        left: Param,
        right: Param,
        specialized: OnceCell<SpecializedOperator>,
    },
}

impl Operation {
    pub fn unknown(operator: AmbiguousOperator, left: Param, right: Param) -> Self {
        Self::Unknown {
            operator,
            left,
            right,
            specialized: OnceCell::new(),
        }
    }

    pub fn condition(comparator: Comparator, left: Param, right: Option<Param>) -> Self {
        Self::Condition {
            comparator,
            left,
            right,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectionLiteral {
    pub items: Vec<Param>,
    pub element: ElementKind,
    /// Written as a single operand without brackets.
    pub implicit: bool,
    /// `[ALL]` or `[*]`: every live instance of the element kind.
    pub all: bool,
}

#[derive(Debug, Clone)]
pub struct CommandNode {
    pub name: String,
    pub params: Vec<Param>,
    pub line: usize,
}

impl CommandNode {
    pub fn new(
        signature: &CommandSignature,
        params: Vec<Param>,
        line: usize,
    ) -> Result<Self, OwsError> {
        if params.len() != signature.params.len() {
            return Err(OwsError::with_line(
                "COMPILE_PARAMETER_COUNT",
                format!(
                    "{} takes {} parameter(s) but {} were given.",
                    signature.name,
                    signature.params.len(),
                    params.len()
                ),
                line,
            ));
        }
        Ok(Self {
            name: signature.name.clone(),
            params,
            line,
        })
    }

    pub fn param(&self, index: usize) -> &Param {
        self.params.get(index).unwrap_or(&Param::Absent)
    }
}
