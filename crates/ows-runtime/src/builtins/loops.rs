use ows_core::{CommandSyntax, ElementKind, Number, Operation, OwsError, OwsValue, Param, ParamKind};

use crate::store::Variable;

use super::*;

pub(super) fn register(registry: &mut CommandRegistry) {
    command(
        registry,
        "WHILE",
        vec![ParamKind::Boolean, ParamKind::Command],
        CommandSyntax::Standard,
        |context| while_loop(context, false),
    );
    command(
        registry,
        "UNTIL",
        vec![ParamKind::Boolean, ParamKind::Command],
        CommandSyntax::Standard,
        |context| while_loop(context, true),
    );
    command(
        registry,
        "FOR",
        vec![ParamKind::Boolean, ParamKind::Any, ParamKind::Command],
        CommandSyntax::Standard,
        for_loop,
    );
    command(
        registry,
        "COUNTDOWN",
        vec![ParamKind::Number, ParamKind::Command],
        CommandSyntax::Standard,
        |context| indexed(context, true),
    );
    command(
        registry,
        "COUNT-UP",
        vec![ParamKind::Number, ParamKind::Command],
        CommandSyntax::Standard,
        |context| indexed(context, false),
    );
    command(
        registry,
        "COUNTDOWN-WITH",
        vec![ParamKind::Any, ParamKind::Command],
        CommandSyntax::Standard,
        countdown_with,
    );
    command(
        registry,
        "COUNT-UP-WITH",
        vec![ParamKind::Any, ParamKind::Number, ParamKind::Command],
        CommandSyntax::Standard,
        count_up_with,
    );
    command(
        registry,
        "ALWAYS",
        vec![ParamKind::Command],
        CommandSyntax::Standard,
        always,
    );
    command(
        registry,
        "FOR-EACH",
        vec![
            ParamKind::Collection(ElementKind::Any),
            ParamKind::Command,
        ],
        CommandSyntax::Standard,
        |context| {
            Err(context.error(
                "ENGINE_NOT_IMPLEMENTED",
                "FOR-EACH is not supported yet.",
            ))
        },
    );
}

fn while_loop(context: &mut ExecutionContext<'_>, until: bool) -> Result<Outcome, OwsError> {
    let body = body(context, 1)?;
    while context.boolean(0)? != until {
        if let Some(signal) = body_signal(context.settle(&body)?) {
            return Ok(signal);
        }
    }
    Ok(Outcome::unit())
}

/// Name of the variable a FOR step such as `I + 1` writes back to.
fn step_target(context: &ExecutionContext<'_>) -> Result<String, OwsError> {
    if let Param::Operation(operation) = context.param(1) {
        let left = match &**operation {
            Operation::Math { left, .. } | Operation::Unknown { left, .. } => Some(left),
            _ => None,
        };
        if let Some(name) = left.and_then(Param::variable_name) {
            return Ok(name.to_string());
        }
    }
    Err(context.error(
        "ENGINE_TYPE_MISMATCH",
        "FOR expects a step that updates a variable, such as I + 1.",
    ))
}

fn for_loop(context: &mut ExecutionContext<'_>) -> Result<Outcome, OwsError> {
    let body = body(context, 2)?;
    let target = step_target(context)?;
    while context.boolean(0)? {
        if let Some(signal) = body_signal(context.settle(&body)?) {
            return Ok(signal);
        }
        let next = context.value(1)?;
        let variable = context.resolve(&target)?;
        *variable.borrow_mut() = next;
    }
    Ok(Outcome::unit())
}

/// COUNTDOWN binds LOOP-INDEX to n-1 down to 0, COUNT-UP to 0 up to n-1.
fn indexed(context: &mut ExecutionContext<'_>, descending: bool) -> Result<Outcome, OwsError> {
    let count = context.number(0)?.int().max(0);
    let body = body(context, 1)?;
    let run = |index: i64| -> Result<Option<Outcome>, OwsError> {
        let scoped = context.with_loop_index(Number::new(index as f64));
        Ok(body_signal(scoped.settle(&body)?))
    };
    if descending {
        for index in (0..count).rev() {
            if let Some(signal) = run(index)? {
                return Ok(signal);
            }
        }
    } else {
        for index in 0..count {
            if let Some(signal) = run(index)? {
                return Ok(signal);
            }
        }
    }
    Ok(Outcome::unit())
}

fn counter(context: &ExecutionContext<'_>, variable: &Variable) -> Result<f64, OwsError> {
    let value = variable.borrow().clone();
    value.as_number().map(|number| number.float()).ok_or_else(|| {
        context.error(
            "ENGINE_TYPE_MISMATCH",
            format!(
                "{} expects a number variable, found {}.",
                context.command().name,
                value.type_name()
            ),
        )
    })
}

fn countdown_with(context: &mut ExecutionContext<'_>) -> Result<Outcome, OwsError> {
    let variable = context.variable(0)?;
    let body = body(context, 1)?;
    loop {
        let current = counter(context, &variable)?;
        if current <= 0.0 {
            break;
        }
        *variable.borrow_mut() = OwsValue::number(current - 1.0);
        if let Some(signal) = body_signal(context.settle(&body)?) {
            return Ok(signal);
        }
    }
    Ok(Outcome::unit())
}

fn count_up_with(context: &mut ExecutionContext<'_>) -> Result<Outcome, OwsError> {
    let variable = context.variable(0)?;
    let end = context.number(1)?.float();
    let body = body(context, 2)?;
    while counter(context, &variable)? < end {
        if let Some(signal) = body_signal(context.settle(&body)?) {
            return Ok(signal);
        }
        let current = counter(context, &variable)?;
        *variable.borrow_mut() = OwsValue::number(current + 1.0);
    }
    Ok(Outcome::unit())
}

/// Only a signal from the body stops this loop.
fn always(context: &mut ExecutionContext<'_>) -> Result<Outcome, OwsError> {
    let body = body(context, 0)?;
    loop {
        if let Some(signal) = body_signal(context.settle(&body)?) {
            return Ok(signal);
        }
    }
}
