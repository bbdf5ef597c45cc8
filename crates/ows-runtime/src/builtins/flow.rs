use std::rc::Rc;

use ows_core::{CommandSyntax, OwsError, Param, ParamKind};

use crate::outcome::{JumpKind, Signal};
use crate::store::TempScope;

use super::*;

pub(super) fn register(registry: &mut CommandRegistry) {
    command(registry, "END", Vec::new(), CommandSyntax::Standard, |_| {
        Ok(Outcome::Signal(Signal::End))
    });
    command(registry, "GO-BACK", Vec::new(), CommandSyntax::Standard, |_| {
        Ok(Outcome::Signal(Signal::GoBack))
    });
    for name in ["GO-TO", "GOTO"] {
        command(
            registry,
            name,
            vec![ParamKind::Label, ParamKind::Line],
            CommandSyntax::GoTo,
            go_to,
        );
    }
    command(
        registry,
        "DO",
        vec![ParamKind::Label, ParamKind::Bindings, ParamKind::Line],
        CommandSyntax::Do,
        call,
    );
    command(
        registry,
        "IF",
        vec![ParamKind::Boolean, ParamKind::Command, ParamKind::Command],
        CommandSyntax::Conditional,
        |context| branch(context, false),
    );
    command(
        registry,
        "IF-NOT",
        vec![ParamKind::Boolean, ParamKind::Command, ParamKind::Command],
        CommandSyntax::Conditional,
        |context| branch(context, true),
    );
    command(
        registry,
        "ELSE",
        vec![ParamKind::Command],
        CommandSyntax::Standard,
        |context| {
            Err(context.error(
                "ENGINE_ELSE_WITHOUT_IF",
                "ELSE must follow the command of an IF on the same line.",
            ))
        },
    );
    command(
        registry,
        "RETURN",
        vec![ParamKind::Any],
        CommandSyntax::Standard,
        |context| Ok(Outcome::Signal(Signal::Return(context.value(0)?))),
    );
    command(
        registry,
        "END-AND-RETURN",
        vec![ParamKind::Any],
        CommandSyntax::Standard,
        |context| Ok(Outcome::Signal(Signal::ReturnAll(context.value(0)?))),
    );
}

/// GO-TO keeps the caller's scope; the target frame sees the same bindings.
fn go_to(context: &mut ExecutionContext<'_>) -> Result<Outcome, OwsError> {
    let line = context.label_target(0)?;
    let from_line = context.line_param(1);
    Ok(context.jump(JumpKind::GoTo, line, from_line, context.scope().clone()))
}

/// DO runs the target in a fresh scope holding only the WITH bindings. A bare
/// variable binding aliases the caller's cell instead of copying it.
fn call(context: &mut ExecutionContext<'_>) -> Result<Outcome, OwsError> {
    let line = context.label_target(0)?;
    let scope = TempScope::new();
    if let Param::Bindings(bindings) = context.param(1) {
        let bindings = Rc::clone(bindings);
        for (name, value) in bindings.iter() {
            match value.variable_name() {
                Some(source) => scope.bind(name.as_str(), context.resolve(source)?),
                None => scope.set(name.as_str(), context.evaluate(value)?),
            }
        }
    }
    let from_line = context.line_param(2);
    Ok(context.jump(JumpKind::Do, line, from_line, scope))
}

/// The chosen branch runs in place of the IF, so its signals and jumps act
/// as if the branch had been written on its own.
fn branch(context: &mut ExecutionContext<'_>, negate: bool) -> Result<Outcome, OwsError> {
    let condition = context.boolean(0)?;
    let index = if condition != negate { 1 } else { 2 };
    match context.command_param(index) {
        Some(node) => Ok(Outcome::TailCall(Rc::clone(node))),
        None => Ok(Outcome::unit()),
    }
}
