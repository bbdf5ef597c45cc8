use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

pub use ows_compiler::{compile_line, CompiledLine, CompiledProgram};
pub use ows_core::{
    Character, Collection, CommandSignature, CommandSyntax, ElementKind, Entity, ErrorKind,
    Number, ObjectRef, OwsError, OwsValue, ParamKind,
};
pub use ows_runtime::{
    CommandFn, CommandRegistry, CommandType, EngineOptions, ExecutionContext, ObjectDirectory,
    Outcome, Program, RuntimeWorld, StaticDirectory,
};

use tracing::debug;

#[derive(Clone, Default)]
pub struct CreateProgramOptions {
    /// Fragment name to text. Names starting with `_` hold pre-start lines.
    pub sources: BTreeMap<String, String>,
    pub registry: Option<Arc<CommandRegistry>>,
    pub world: Option<RuntimeWorld>,
    pub directory: Option<Arc<dyn ObjectDirectory>>,
    pub engine_options: Option<EngineOptions>,
}

pub fn compile(
    sources: &BTreeMap<String, String>,
    registry: &CommandRegistry,
) -> Result<CompiledProgram, OwsError> {
    ows_compiler::build(sources, registry)
}

/// Compiles `sources` and binds the result to a registry, world and
/// directory. Missing pieces default to the builtins, a fresh world, an
/// empty directory and [`EngineOptions::default`].
pub fn create_program(options: CreateProgramOptions) -> Result<Program, OwsError> {
    let registry = options
        .registry
        .unwrap_or_else(|| Arc::new(CommandRegistry::with_builtins()));
    let compiled = compile(&options.sources, &registry)?;
    debug!(
        fragments = options.sources.len(),
        commands = registry.len(),
        "created program"
    );

    Ok(Program::new(
        Rc::new(compiled),
        registry,
        options.world.unwrap_or_default(),
        options
            .directory
            .unwrap_or_else(|| Arc::new(StaticDirectory::default())),
        options.engine_options.unwrap_or_default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn actor() -> Character {
        Character::new("c1", "BOB")
    }

    fn create(sources: &[(&str, &str)]) -> Program {
        create_program(CreateProgramOptions {
            sources: map(sources),
            ..CreateProgramOptions::default()
        })
        .expect("program should build")
    }

    #[test]
    fn compile_reports_labels_and_lines() {
        let registry = CommandRegistry::with_builtins();
        let compiled = compile(
            &map(&[("main", "SET: A = 1\n[LOOP]: SET: A = A + 1\nRETURN: A")]),
            &registry,
        )
        .expect("compile should pass");
        assert_eq!(compiled.label_line("LOOP"), Some(1));
        assert!(compiled.command_at(2).is_some());
    }

    #[test]
    fn create_program_runs_with_defaults() {
        let program = create(&[("main", "SET: A = 2\nRETURN: A * 21")]);
        assert_eq!(
            program.run(&actor(), None, None).expect("run should pass"),
            Some(OwsValue::number(42.0))
        );
        assert_eq!(program.options(), EngineOptions::default());
    }

    #[test]
    fn set_for_world_of_a_command_name_fails_to_compile() {
        let error = create_program(CreateProgramOptions {
            sources: map(&[("main", "SET-FOR-WORLD: SET = 1")]),
            ..CreateProgramOptions::default()
        })
        .err()
        .expect("command name should conflict");
        assert_eq!(error.code, "COMPILE_NAME_CONFLICT");
        assert_eq!(error.kind(), ErrorKind::Compile);
    }

    #[test]
    fn compile_errors_are_compile_kind() {
        let error = create_program(CreateProgramOptions {
            sources: map(&[("main", "FLY: 1")]),
            ..CreateProgramOptions::default()
        })
        .err()
        .expect("unknown command should fail");
        assert_eq!(error.kind(), ErrorKind::Compile);
        assert_eq!(error.line, Some(0));
    }

    #[test]
    fn host_commands_extend_the_registry() {
        let heard = Arc::new(Mutex::new(Vec::new()));
        let sink = heard.clone();
        let mut registry = CommandRegistry::with_builtins();
        registry.register(CommandType::new(
            CommandSignature::new("SHOUT", vec![ParamKind::Text]),
            move |context| {
                let text = context.text(0)?;
                sink.lock().expect("sink lock").push(text.to_uppercase());
                Ok(Outcome::unit())
            },
        ));

        let program = create_program(CreateProgramOptions {
            sources: map(&[("main", "SHOUT: \"hello\"")]),
            registry: Some(Arc::new(registry)),
            ..CreateProgramOptions::default()
        })
        .expect("program should build");
        program.run(&actor(), None, None).expect("run should pass");
        assert_eq!(*heard.lock().expect("sink lock"), vec!["HELLO".to_string()]);
    }

    #[test]
    fn programs_share_an_injected_world() {
        let world = RuntimeWorld::new();
        let writer = create_program(CreateProgramOptions {
            sources: map(&[("main", "SET-FOR-WORLD: WEATHER = \"rain\"")]),
            world: Some(world.clone()),
            ..CreateProgramOptions::default()
        })
        .expect("writer should build");
        let reader = create_program(CreateProgramOptions {
            sources: map(&[("main", "RETURN: WEATHER")]),
            world: Some(world),
            ..CreateProgramOptions::default()
        })
        .expect("reader should build");

        writer.run(&actor(), None, None).expect("writer should run");
        assert_eq!(
            reader.run(&actor(), None, None).expect("reader should run"),
            Some(OwsValue::text("rain"))
        );
    }

    #[test]
    fn directory_feeds_collection_literals() {
        let directory = StaticDirectory::new(
            vec![Character::new("c1", "BOB"), Character::new("c2", "ALICE")],
            Vec::new(),
        );
        let program = create_program(CreateProgramOptions {
            sources: map(&[("main", "SET-FOR: [ALICE] : MOOD = 1")]),
            directory: Some(Arc::new(directory)),
            ..CreateProgramOptions::default()
        })
        .expect("program should build");
        program.run(&actor(), None, None).expect("run should pass");
        assert_eq!(
            program.world().character_variable("c2", "MOOD"),
            Some(OwsValue::number(1.0))
        );
    }
}
