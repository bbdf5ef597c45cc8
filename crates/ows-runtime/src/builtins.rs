use std::rc::Rc;

use ows_core::{CommandNode, CommandSignature, CommandSyntax, OwsError, ParamKind};

use crate::context::ExecutionContext;
use crate::outcome::{Outcome, Settled};
use crate::registry::{CommandRegistry, CommandType};

mod flow;
mod loops;
mod variables;

pub(crate) fn register_builtins(registry: &mut CommandRegistry) {
    flow::register(registry);
    loops::register(registry);
    variables::register(registry);
}

fn command<F>(
    registry: &mut CommandRegistry,
    name: &str,
    params: Vec<ParamKind>,
    syntax: CommandSyntax,
    execute: F,
) where
    F: Fn(&mut ExecutionContext<'_>) -> Result<Outcome, OwsError> + Send + Sync + 'static,
{
    registry.register(CommandType::new(
        CommandSignature::new(name, params).with_syntax(syntax),
        execute,
    ));
}

fn body(context: &ExecutionContext<'_>, index: usize) -> Result<Rc<CommandNode>, OwsError> {
    context.command_param(index).cloned().ok_or_else(|| {
        context.error(
            "ENGINE_TYPE_MISMATCH",
            format!(
                "{} expects a command in parameter {}.",
                context.command().name,
                index + 1
            ),
        )
    })
}

/// Loop bodies stop the loop on any signal and hand it up unchanged.
fn body_signal(settled: Settled) -> Option<Outcome> {
    match settled {
        Settled::Value(_) => None,
        Settled::Signal(signal) => Some(Outcome::Signal(signal)),
    }
}
