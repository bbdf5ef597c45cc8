use std::sync::Arc;

use ows_api::{compile, create_program, CreateProgramOptions, OwsError, StaticDirectory};
use tracing::debug;

use crate::{
    host_registry, load_directory, load_sources_by_scripts_dir, map_cli_output_json,
    parse_bindings, resolve_actor, CheckArgs, RunArgs,
};

pub(crate) fn run_check(args: CheckArgs) -> Result<i32, OwsError> {
    let sources = load_sources_by_scripts_dir(&args.scripts_dir)?;
    let compiled = compile(&sources, &host_registry())?;
    let labels = serde_json::to_string(&compiled.labels).map_err(map_cli_output_json)?;

    println!("RESULT:OK");
    println!("LINES:{}", compiled.line_count);
    println!("LABELS_JSON:{}", labels);
    Ok(0)
}

pub(crate) fn run_script(args: RunArgs) -> Result<i32, OwsError> {
    let sources = load_sources_by_scripts_dir(&args.scripts_dir)?;
    let bindings = parse_bindings(&args.bind)?;

    let mut directory = match &args.actors {
        Some(path) => load_directory(path)?,
        None => StaticDirectory::default(),
    };
    let actor = resolve_actor(&mut directory, args.actor.as_deref(), args.actors.is_some())?;
    debug!(actor = %actor.id, bindings = bindings.len(), "running scripts");

    let program = create_program(CreateProgramOptions {
        sources,
        registry: Some(Arc::new(host_registry())),
        directory: Some(Arc::new(directory)),
        ..CreateProgramOptions::default()
    })?;
    let bindings = (!bindings.is_empty()).then_some(bindings);
    let value = program.run(&actor, args.start_label.as_deref(), bindings)?;
    let value = serde_json::to_string(&value).map_err(map_cli_output_json)?;

    println!("RESULT:OK");
    println!("VALUE_JSON:{}", value);
    Ok(0)
}
