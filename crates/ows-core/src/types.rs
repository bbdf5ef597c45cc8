use serde::{Deserialize, Serialize};

use crate::value::{ElementKind, ValueKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    pub unique_name: String,
}

impl Character {
    pub fn new(id: impl Into<String>, unique_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            unique_name: unique_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
}

impl Entity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// What a parameter slot expects. Drives how the compiler parses the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Any,
    Number,
    Text,
    Boolean,
    Collection(ElementKind),
    Command,
    Label,
    Name,
    Bindings,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandSyntax {
    #[default]
    Standard,
    GoTo,
    Set,
    SetFor,
    Unset,
    UnsetFor,
    Do,
    Conditional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSignature {
    pub name: String,
    pub params: Vec<ParamKind>,
    pub returns: Option<ValueKind>,
    pub syntax: CommandSyntax,
}

impl CommandSignature {
    pub fn new(name: impl Into<String>, params: Vec<ParamKind>) -> Self {
        Self {
            name: name.into(),
            params,
            returns: None,
            syntax: CommandSyntax::Standard,
        }
    }

    pub fn returning(mut self, kind: ValueKind) -> Self {
        self.returns = Some(kind);
        self
    }

    pub fn with_syntax(mut self, syntax: CommandSyntax) -> Self {
        self.syntax = syntax;
        self
    }
}

/// Read side of the command registry, as seen by the compiler.
pub trait CommandCatalog {
    fn signature(&self, name: &str) -> Option<&CommandSignature>;
    fn command_names(&self) -> Vec<&str>;

    fn contains(&self, name: &str) -> bool {
        self.signature(name).is_some()
    }
}

pub const RESERVED_KEYWORDS: &[&str] = &[
    "START",
    "ALL",
    "WITH",
    "WITHOUT",
    "TO",
    "AS",
    "IS",
    "PROGRAM",
    "WORLD",
    "ELSE",
    "TRUE",
    "FALSE",
    "LOOP-INDEX",
    "LOOP-OBJECT",
    "EQUALS",
    "GREATER-THAN",
    "LESS-THAN",
    "AND",
    "OR",
    "NOT",
    "PLUS",
    "MINUS",
    "TIMES",
    "X",
    "DIVIDED-BY",
    "TO-THE-POWER-OF",
    "MODULO",
    "SQUARED",
];

pub const START_LABEL: &str = "START";
pub const ATTACHED_ENTITY_VARIABLE: &str = "ENTITY-THIS-SCRIPT-IS-ATTACHED-TO";

pub fn is_reserved_keyword(name: &str) -> bool {
    RESERVED_KEYWORDS.contains(&name)
}

#[cfg(test)]
mod types_tests {
    use super::*;

    #[test]
    fn signature_builder_sets_hints() {
        let signature = CommandSignature::new("COUNT", vec![ParamKind::Collection(ElementKind::Any)])
            .returning(ValueKind::Number);
        assert_eq!(signature.returns, Some(ValueKind::Number));
        assert_eq!(signature.syntax, CommandSyntax::Standard);
        assert_eq!(signature.params.len(), 1);
    }

    #[test]
    fn reserved_keywords_cover_structural_words() {
        for word in ["START", "WITHOUT", "LOOP-INDEX", "TO-THE-POWER-OF"] {
            assert!(is_reserved_keyword(word), "{word} should be reserved");
        }
        assert!(!is_reserved_keyword("SCORE"));
    }
}
