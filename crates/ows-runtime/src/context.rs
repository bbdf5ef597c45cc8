use std::rc::Rc;

use ows_core::{
    Character, Collection, CollectionLiteral, CommandNode, Deferred, ElementKind, Number, ObjectRef,
    OwsError, OwsValue, Param,
};
use tracing::trace;

use crate::engine::Program;
use crate::operators::evaluate_operation;
use crate::outcome::{FrameExit, Jump, JumpKind, Outcome, Settled, Signal};
use crate::store::{Tier, TempScope, Variable};

/// Everything a command can see while it runs: its own params, the actor, the
/// current line and the scope of the call level it runs in.
#[derive(Clone)]
pub struct ExecutionContext<'a> {
    program: &'a Program,
    command: Rc<CommandNode>,
    actor: &'a Character,
    line: usize,
    scope: TempScope,
    loop_index: Option<Number>,
    depth: usize,
}

impl<'a> ExecutionContext<'a> {
    pub(crate) fn new(
        program: &'a Program,
        command: Rc<CommandNode>,
        actor: &'a Character,
        scope: TempScope,
        depth: usize,
    ) -> Self {
        let line = command.line;
        Self {
            program,
            command,
            actor,
            line,
            scope,
            loop_index: None,
            depth,
        }
    }

    pub fn program(&self) -> &'a Program {
        self.program
    }

    pub fn command(&self) -> &CommandNode {
        &self.command
    }

    pub fn actor(&self) -> &'a Character {
        self.actor
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn scope(&self) -> &TempScope {
        &self.scope
    }

    pub fn loop_index(&self) -> Option<Number> {
        self.loop_index
    }

    pub fn error(&self, code: &str, message: impl Into<String>) -> OwsError {
        OwsError::with_line(code, message, self.line)
    }

    /// A copy of this context with LOOP-INDEX bound.
    pub fn with_loop_index(&self, index: Number) -> Self {
        Self {
            loop_index: Some(index),
            ..self.clone()
        }
    }

    fn child(&self, command: &Rc<CommandNode>) -> Self {
        Self {
            command: Rc::clone(command),
            ..self.clone()
        }
    }

    pub fn param(&self, index: usize) -> &Param {
        self.command.param(index)
    }

    pub fn execute(&self, node: &Rc<CommandNode>) -> Result<Outcome, OwsError> {
        let Some(command) = self.program.registry().get(&node.name) else {
            return Err(self.error(
                "ENGINE_UNKNOWN_COMMAND",
                format!("No command named {} is registered.", node.name),
            ));
        };
        let mut context = self.child(node);
        command.execute(&mut context)
    }

    /// Follows tail calls and jumps until a value or a signal is left.
    pub fn ultimate(&self, outcome: Outcome) -> Result<Settled, OwsError> {
        let limit = self.program.options().max_tail_calls;
        let mut followed = 0usize;
        let mut outcome = outcome;
        loop {
            outcome = match outcome {
                Outcome::Value(value) => return Ok(Settled::Value(value)),
                Outcome::Signal(signal) => return Ok(Settled::Signal(signal)),
                Outcome::TailCall(node) => {
                    followed += 1;
                    if followed > limit {
                        return Err(self.tail_call_limit(limit));
                    }
                    self.execute(&node)?
                }
                Outcome::Jump(jump) => {
                    followed += 1;
                    if followed > limit {
                        return Err(self.tail_call_limit(limit));
                    }
                    self.follow_jump(jump)?
                }
            };
        }
    }

    fn tail_call_limit(&self, limit: usize) -> OwsError {
        self.error(
            "ENGINE_TAIL_CALL_LIMIT",
            format!("More than {} chained commands on one line.", limit),
        )
    }

    pub fn settle(&self, node: &Rc<CommandNode>) -> Result<Settled, OwsError> {
        let outcome = self.execute(node)?;
        self.ultimate(outcome)
    }

    /// Runs a nested frame for the jump and maps how it ended back onto the
    /// line that requested it.
    fn follow_jump(&self, jump: Jump) -> Result<Outcome, OwsError> {
        trace!(kind = ?jump.kind, line = jump.line, from_line = jump.from_line, "follow jump");
        let exit = self.program.run_frame(
            jump.line,
            Some(jump.from_line),
            jump.scope,
            self.actor,
            self.depth + 1,
        )?;
        let outcome = match (jump.kind, exit) {
            (JumpKind::GoTo, FrameExit::WentBack) => Outcome::unit(),
            (JumpKind::GoTo, exit) => Outcome::Signal(Signal::Exit(exit)),
            (JumpKind::Do, FrameExit::Returned(value)) => Outcome::Value(value),
            (JumpKind::Do, FrameExit::WentBack | FrameExit::Completed(_)) => Outcome::unit(),
            (JumpKind::Do, FrameExit::Ended) => Outcome::Signal(Signal::End),
            (JumpKind::Do, FrameExit::ReturnedAll(value)) => {
                Outcome::Signal(Signal::ReturnAll(value))
            }
        };
        Ok(outcome)
    }

    /// The body command held in param `index`, run to its settled outcome.
    /// An absent optional command settles to unit.
    pub fn run_command_param(&self, index: usize) -> Result<Settled, OwsError> {
        match self.param(index) {
            Param::Command(node) => {
                let node = Rc::clone(node);
                self.settle(&node)
            }
            Param::Absent => Ok(Settled::Value(OwsValue::Unit)),
            _ => Err(self.error(
                "ENGINE_TYPE_MISMATCH",
                format!("{} expects a command in parameter {}.", self.command.name, index + 1),
            )),
        }
    }

    pub fn command_param(&self, index: usize) -> Option<&Rc<CommandNode>> {
        match self.param(index) {
            Param::Command(node) => Some(node),
            _ => None,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Variable> {
        self.program.lookup(name, &self.actor.id, &self.scope)
    }

    pub fn resolve(&self, name: &str) -> Result<Variable, OwsError> {
        self.lookup(name).ok_or_else(|| {
            self.error(
                "ENGINE_UNRESOLVED_VARIABLE",
                format!("Variable {} is not set.", name),
            )
        })
    }

    pub fn assign(&self, tier: Tier, name: &str, value: OwsValue) -> Result<(), OwsError> {
        self.assign_for(tier, name, value, &self.actor.id)
    }

    pub fn assign_for(
        &self,
        tier: Tier,
        name: &str,
        value: OwsValue,
        actor_id: &str,
    ) -> Result<(), OwsError> {
        self.program
            .assign(tier, name, value, actor_id, &self.scope)
            .map_err(|error| error.at_line(self.line))
    }

    pub fn unassign(&self, tier: Tier, name: &str) {
        self.program.unassign(tier, name, &self.actor.id, &self.scope);
    }

    pub fn unassign_for(&self, tier: Tier, name: &str, actor_id: &str) {
        self.program.unassign(tier, name, actor_id, &self.scope);
    }

    pub fn evaluate(&self, param: &Param) -> Result<OwsValue, OwsError> {
        match param {
            Param::Value(value) => Ok(value.clone()),
            Param::Deferred(Deferred::Scoped(name)) => {
                let variable = self.resolve(name)?;
                let value = variable.borrow().clone();
                Ok(value)
            }
            Param::Deferred(Deferred::LoopIndex) => self
                .loop_index
                .map(OwsValue::Number)
                .ok_or_else(|| {
                    self.error(
                        "ENGINE_LOOP_INDEX_UNBOUND",
                        "LOOP-INDEX is only bound inside COUNTDOWN and COUNT-UP bodies.",
                    )
                }),
            Param::Deferred(Deferred::LoopObject) => Err(self.error(
                "ENGINE_NOT_IMPLEMENTED",
                "LOOP-OBJECT is not supported yet.",
            )),
            Param::Command(node) => match self.settle(node)? {
                Settled::Value(value) => Ok(value),
                Settled::Signal(signal) => Err(self.error(
                    "ENGINE_CONTROL_FLOW_IN_VALUE",
                    format!(
                        "{} produced {:?} where a value was expected.",
                        node.name, signal
                    ),
                )),
            },
            Param::Operation(operation) => evaluate_operation(self, operation),
            Param::Collection(literal) => self.collection_literal(literal),
            Param::Bindings(_) => Err(self.error(
                "ENGINE_TYPE_MISMATCH",
                "WITH bindings cannot be used as a value.",
            )),
            Param::Absent => Ok(OwsValue::Unit),
        }
    }

    pub fn value(&self, index: usize) -> Result<OwsValue, OwsError> {
        self.evaluate(self.param(index))
    }

    fn mismatch(&self, index: usize, expected: &str, found: &OwsValue) -> OwsError {
        self.error(
            "ENGINE_TYPE_MISMATCH",
            format!(
                "{} expects a {} in parameter {}, found {}.",
                self.command.name,
                expected,
                index + 1,
                found.type_name()
            ),
        )
    }

    pub fn number(&self, index: usize) -> Result<Number, OwsError> {
        let value = self.value(index)?;
        value
            .as_number()
            .ok_or_else(|| self.mismatch(index, "number", &value))
    }

    pub fn text(&self, index: usize) -> Result<String, OwsError> {
        match self.value(index)? {
            OwsValue::Text(text) => Ok(text),
            other => Err(self.mismatch(index, "text", &other)),
        }
    }

    pub fn boolean(&self, index: usize) -> Result<bool, OwsError> {
        let value = self.value(index)?;
        value
            .as_bool()
            .ok_or_else(|| self.mismatch(index, "boolean", &value))
    }

    pub fn collection(&self, index: usize) -> Result<Collection, OwsError> {
        match self.value(index)? {
            OwsValue::Collection(collection) => Ok(collection),
            other => Err(self.mismatch(index, "collection", &other)),
        }
    }

    /// A name written literally in the source (variable or label slot).
    pub fn name(&self, index: usize) -> Result<String, OwsError> {
        self.param(index)
            .literal_text()
            .map(str::to_string)
            .ok_or_else(|| {
                self.error(
                    "ENGINE_TYPE_MISMATCH",
                    format!("{} expects a name in parameter {}.", self.command.name, index + 1),
                )
            })
    }

    /// The cell behind a bare variable reference in param `index`.
    pub fn variable(&self, index: usize) -> Result<Variable, OwsError> {
        match self.param(index).variable_name() {
            Some(name) => self.resolve(name),
            None => Err(self.error(
                "ENGINE_TYPE_MISMATCH",
                format!(
                    "{} expects a variable in parameter {}.",
                    self.command.name,
                    index + 1
                ),
            )),
        }
    }

    /// Line targeted by a label param. Falls back to a text variable holding
    /// the label name.
    pub fn label_target(&self, index: usize) -> Result<usize, OwsError> {
        let label = self.name(index)?;
        let compiled = self.program.compiled();
        if let Some(line) = compiled.label_line(&label) {
            return Ok(line);
        }
        if let Some(variable) = self.lookup(&label) {
            let target = variable.borrow().as_text().map(str::to_uppercase);
            if let Some(line) = target.and_then(|target| compiled.label_line(&target)) {
                return Ok(line);
            }
        }
        Err(self.error(
            "ENGINE_LABEL_NOT_FOUND",
            format!("No label named {}.", label),
        ))
    }

    /// Source line carried by a `Line` param, falling back to the current line.
    pub fn line_param(&self, index: usize) -> usize {
        match self.param(index) {
            Param::Value(OwsValue::Number(number)) if number.int() >= 0 => number.int() as usize,
            _ => self.line,
        }
    }

    pub fn jump(&self, kind: JumpKind, line: usize, from_line: usize, scope: TempScope) -> Outcome {
        Outcome::Jump(Jump {
            kind,
            line,
            from_line,
            scope,
        })
    }

    fn collection_literal(&self, literal: &CollectionLiteral) -> Result<OwsValue, OwsError> {
        let element = literal.element;
        if literal.all {
            let directory = self.program.directory();
            let items = match element {
                ElementKind::Character => directory
                    .characters()
                    .into_iter()
                    .map(|character| OwsValue::Object(ObjectRef::Character(character)))
                    .collect(),
                ElementKind::Entity => directory
                    .entities()
                    .into_iter()
                    .map(|entity| OwsValue::Object(ObjectRef::Entity(entity)))
                    .collect(),
                other => {
                    return Err(self.error(
                        "ENGINE_TYPE_MISMATCH",
                        format!("[ALL] cannot list {} values.", other.name()),
                    ))
                }
            };
            return Collection::typed(element, items)
                .map(OwsValue::Collection)
                .map_err(|error| error.at_line(self.line));
        }

        let mut items = Vec::with_capacity(literal.items.len());
        for item in &literal.items {
            let value = self.collection_item(item, element)?;
            if literal.implicit && literal.items.len() == 1 {
                if let OwsValue::Collection(collection) = value {
                    return Ok(OwsValue::Collection(collection));
                }
            }
            items.push(value);
        }
        Collection::typed(element, items)
            .map(OwsValue::Collection)
            .map_err(|error| error.at_line(self.line))
    }

    fn collection_item(&self, item: &Param, element: ElementKind) -> Result<OwsValue, OwsError> {
        if element.is_object() {
            if let Some(name) = item.variable_name() {
                if self.lookup(name).is_none() {
                    return self.directory_object(name, element);
                }
            }
        }
        let value = self.evaluate(item)?;
        match (&value, element.is_object()) {
            (OwsValue::Text(key), true) => self.directory_object(key, element),
            _ => Ok(value),
        }
    }

    fn directory_object(&self, key: &str, element: ElementKind) -> Result<OwsValue, OwsError> {
        let directory = self.program.directory();
        let found = match element {
            ElementKind::Character => directory.character(key).map(ObjectRef::Character),
            ElementKind::Entity => directory.entity(key).map(ObjectRef::Entity),
            _ => None,
        };
        found.map(OwsValue::Object).ok_or_else(|| {
            self.error(
                "ENGINE_OBJECT_NOT_FOUND",
                format!("No {} named {}.", element.name(), key),
            )
        })
    }
}
