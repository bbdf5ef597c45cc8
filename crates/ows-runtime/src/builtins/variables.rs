use ows_core::{CommandSyntax, ElementKind, ObjectRef, OwsError, OwsValue, ParamKind};

use crate::store::Tier;

use super::*;

const SET_COMMANDS: &[(&str, Tier)] = &[
    ("SET", Tier::CharacterGlobal),
    ("SET-LOCALLY", Tier::CharacterLocal),
    ("SET-FOR-PROGRAM", Tier::Program),
    ("SET-FOR-WORLD", Tier::World),
];

const UNSET_COMMANDS: &[(&str, Tier)] = &[
    ("UN-SET", Tier::CharacterGlobal),
    ("UN-SET-LOCALLY", Tier::CharacterLocal),
    ("UN-SET-FOR-PROGRAM", Tier::Program),
    ("UN-SET-FOR-WORLD", Tier::World),
];

const TARGETED_COMMANDS: &[(&str, &str, Tier)] = &[
    ("SET-FOR", "UN-SET-FOR", Tier::CharacterGlobal),
    ("SET-LOCALLY-FOR", "UN-SET-LOCALLY-FOR", Tier::CharacterLocal),
];

pub(super) fn register(registry: &mut CommandRegistry) {
    for &(name, tier) in SET_COMMANDS {
        command(
            registry,
            name,
            vec![ParamKind::Name, ParamKind::Any],
            CommandSyntax::Set,
            move |context| set(context, tier),
        );
    }
    command(
        registry,
        "SET-HERE",
        vec![ParamKind::Name, ParamKind::Any],
        CommandSyntax::Set,
        set_here,
    );
    for &(name, tier) in UNSET_COMMANDS {
        command(
            registry,
            name,
            vec![ParamKind::Name],
            CommandSyntax::Unset,
            move |context| {
                context.unassign(tier, &context.name(0)?);
                Ok(Outcome::unit())
            },
        );
    }
    let targets = ParamKind::Collection(ElementKind::Character);
    for &(set_name, unset_name, tier) in TARGETED_COMMANDS {
        command(
            registry,
            set_name,
            vec![targets, ParamKind::Name, ParamKind::Any],
            CommandSyntax::SetFor,
            move |context| set_for(context, tier),
        );
        command(
            registry,
            unset_name,
            vec![targets, ParamKind::Name],
            CommandSyntax::UnsetFor,
            move |context| unset_for(context, tier),
        );
    }
}

/// The value is copied; later writes to the source do not reach it.
fn set(context: &mut ExecutionContext<'_>, tier: Tier) -> Result<Outcome, OwsError> {
    let name = context.name(0)?;
    let value = context.value(1)?;
    context.assign(tier, &name, value)?;
    Ok(Outcome::unit())
}

/// Binds in the current call level only. `SET-HERE: A = B` with a bare
/// variable makes A another name for B's cell.
fn set_here(context: &mut ExecutionContext<'_>) -> Result<Outcome, OwsError> {
    let name = context.name(0)?;
    if let Some(source) = context.param(1).variable_name() {
        let variable = context.resolve(source)?;
        if !context.scope().contains(&name) {
            context.assign(Tier::Temp, &name, OwsValue::Unit)?;
        }
        context.scope().bind(name, variable);
        return Ok(Outcome::unit());
    }
    let value = context.value(1)?;
    context.assign(Tier::Temp, &name, value)?;
    Ok(Outcome::unit())
}

fn target_ids(context: &ExecutionContext<'_>) -> Result<Vec<String>, OwsError> {
    let targets = context.collection(0)?;
    targets
        .items()
        .iter()
        .map(|item| match item {
            OwsValue::Object(ObjectRef::Character(character)) => Ok(character.id.clone()),
            other => Err(context.error(
                "ENGINE_TYPE_MISMATCH",
                format!(
                    "{} expects characters, found {}.",
                    context.command().name,
                    other.type_name()
                ),
            )),
        })
        .collect()
}

fn set_for(context: &mut ExecutionContext<'_>, tier: Tier) -> Result<Outcome, OwsError> {
    let ids = target_ids(context)?;
    let name = context.name(1)?;
    let value = context.value(2)?;
    for id in ids {
        context.assign_for(tier, &name, value.clone(), &id)?;
    }
    Ok(Outcome::unit())
}

fn unset_for(context: &mut ExecutionContext<'_>, tier: Tier) -> Result<Outcome, OwsError> {
    let ids = target_ids(context)?;
    let name = context.name(1)?;
    for id in ids {
        context.unassign_for(tier, &name, &id);
    }
    Ok(Outcome::unit())
}
