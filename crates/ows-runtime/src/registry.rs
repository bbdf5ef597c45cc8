use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ows_core::{CommandCatalog, CommandSignature, OwsError};

use crate::builtins::register_builtins;
use crate::context::ExecutionContext;
use crate::outcome::Outcome;

pub type CommandFn =
    Arc<dyn Fn(&mut ExecutionContext<'_>) -> Result<Outcome, OwsError> + Send + Sync>;

/// A command archetype: how it is written and what it does.
#[derive(Clone)]
pub struct CommandType {
    pub signature: CommandSignature,
    execute: CommandFn,
}

impl CommandType {
    pub fn new<F>(signature: CommandSignature, execute: F) -> Self
    where
        F: Fn(&mut ExecutionContext<'_>) -> Result<Outcome, OwsError> + Send + Sync + 'static,
    {
        Self {
            signature,
            execute: Arc::new(execute),
        }
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn execute(&self, context: &mut ExecutionContext<'_>) -> Result<Outcome, OwsError> {
        (self.execute)(context)
    }
}

impl fmt::Debug for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandType")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, CommandType>,
}

impl CommandRegistry {
    /// An empty registry. Scripts compiled against it can only use host commands.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_builtins(&mut registry);
        registry
    }

    /// Adds a command, replacing any earlier one with the same name.
    pub fn register(&mut self, command: CommandType) -> &mut Self {
        self.commands.insert(command.name().to_string(), command);
        self
    }

    pub fn get(&self, name: &str) -> Option<&CommandType> {
        self.commands.get(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl CommandCatalog for CommandRegistry {
    fn signature(&self, name: &str) -> Option<&CommandSignature> {
        self.commands.get(name).map(|command| &command.signature)
    }

    fn command_names(&self) -> Vec<&str> {
        self.commands.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod registry_tests {
    use super::*;
    use ows_core::{CommandSyntax, ParamKind};

    #[test]
    fn builtins_cover_control_flow_and_variables() {
        let registry = CommandRegistry::with_builtins();
        for name in [
            "END",
            "GO-TO",
            "GOTO",
            "GO-BACK",
            "IF",
            "IF-NOT",
            "ELSE",
            "WHILE",
            "UNTIL",
            "FOR",
            "COUNTDOWN",
            "COUNTDOWN-WITH",
            "COUNT-UP",
            "COUNT-UP-WITH",
            "ALWAYS",
            "FOR-EACH",
            "RETURN",
            "END-AND-RETURN",
            "DO",
            "SET",
            "SET-LOCALLY",
            "SET-FOR-PROGRAM",
            "SET-FOR-WORLD",
            "SET-HERE",
            "SET-FOR",
            "SET-LOCALLY-FOR",
            "UN-SET",
            "UN-SET-LOCALLY",
            "UN-SET-FOR-PROGRAM",
            "UN-SET-FOR-WORLD",
            "UN-SET-FOR",
            "UN-SET-LOCALLY-FOR",
        ] {
            assert!(registry.contains(name), "{name} should be registered");
        }
        assert_eq!(
            registry.signature("IF").map(|signature| signature.syntax),
            Some(CommandSyntax::Conditional)
        );
        assert!(!registry.contains("SAY"));
    }

    #[test]
    fn register_replaces_existing_names() {
        let mut registry = CommandRegistry::with_builtins();
        let before = registry.len();
        registry.register(CommandType::new(
            CommandSignature::new("END", vec![ParamKind::Any]),
            |_context| Ok(Outcome::unit()),
        ));
        assert_eq!(registry.len(), before);
        assert_eq!(
            registry.signature("END").map(|signature| signature.params.len()),
            Some(1)
        );
        assert!(CommandRegistry::new().is_empty());
    }
}
