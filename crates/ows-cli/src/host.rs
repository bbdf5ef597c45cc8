use std::collections::BTreeMap;

use ows_api::{
    Character, CommandRegistry, CommandSignature, CommandType, ObjectDirectory, Outcome,
    OwsError, OwsValue, ParamKind, StaticDirectory,
};

pub(crate) const DEFAULT_ACTOR_ID: &str = "player";

/// Builtins plus `SAY`, which writes `SAY:<text>` to stdout.
pub(crate) fn host_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::with_builtins();
    registry.register(CommandType::new(
        CommandSignature::new("SAY", vec![ParamKind::Any]),
        |context| {
            println!("SAY:{}", context.value(0)?);
            Ok(Outcome::unit())
        },
    ));
    registry
}

/// `NAME=VALUE`. VALUE is read as JSON when it parses, otherwise as text.
pub(crate) fn parse_binding(raw: &str) -> Result<(String, OwsValue), OwsError> {
    let Some((name, value)) = raw.split_once('=') else {
        return Err(OwsError::new(
            "CLI_BIND_INVALID",
            format!("Expected NAME=VALUE, got \"{}\".", raw),
        ));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(OwsError::new(
            "CLI_BIND_INVALID",
            format!("Binding \"{}\" has no name.", raw),
        ));
    }
    let value = serde_json::from_str::<OwsValue>(value)
        .unwrap_or_else(|_| OwsValue::text(value));
    Ok((name.to_string(), value))
}

pub(crate) fn parse_bindings(raw: &[String]) -> Result<BTreeMap<String, OwsValue>, OwsError> {
    raw.iter().map(|entry| parse_binding(entry)).collect()
}

/// Picks the acting character. Without an actors file the requested id (or
/// `player`) is added to the directory so scripts can name it.
pub(crate) fn resolve_actor(
    directory: &mut StaticDirectory,
    requested: Option<&str>,
    from_file: bool,
) -> Result<Character, OwsError> {
    if !from_file {
        let id = requested.unwrap_or(DEFAULT_ACTOR_ID);
        let actor = Character::new(id, id.to_uppercase());
        directory.characters.push(actor.clone());
        return Ok(actor);
    }
    let found = match requested {
        Some(key) => directory.character(key),
        None => directory.characters.first().cloned(),
    };
    found.ok_or_else(|| {
        OwsError::new(
            "CLI_ACTOR_NOT_FOUND",
            match requested {
                Some(key) => format!("No character \"{}\" in the actors file.", key),
                None => "The actors file lists no characters.".to_string(),
            },
        )
    })
}
