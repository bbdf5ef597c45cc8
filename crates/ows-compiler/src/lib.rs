mod condition;
mod expression;
mod line_parser;
mod suggest;
mod token;

use std::collections::BTreeMap;
use std::rc::Rc;

pub use ows_core::{CompiledLine, CompiledProgram};

use ows_core::{CommandCatalog, OwsError};
use ows_parser::{fold_case, prepare_sources, split_label, strip_comment};
use tracing::debug;

use crate::line_parser::parse_line;

pub fn build(
    sources: &BTreeMap<String, String>,
    catalog: &dyn CommandCatalog,
) -> Result<CompiledProgram, OwsError> {
    let prepared = prepare_sources(sources)?;

    let mut commands = BTreeMap::new();
    for (index, text) in prepared.lines.iter().enumerate() {
        if text.trim().is_empty() {
            continue;
        }
        let command = parse_line(catalog, text, index).map_err(|error| {
            let message = format!("{} [line {}: {}]", error.message, index, text.trim());
            OwsError {
                message,
                ..error.at_line(index)
            }
        })?;
        commands.insert(index, Rc::new(command));
    }

    let mut line_labels: BTreeMap<usize, String> = BTreeMap::new();
    for (name, line) in &prepared.labels {
        let replace = line_labels
            .get(line)
            .map_or(true, |current| current == ows_core::START_LABEL);
        if replace {
            line_labels.insert(*line, name.clone());
        }
    }

    debug!(
        lines = prepared.lines.len(),
        commands = commands.len(),
        labels = prepared.labels.len(),
        start_line = prepared.start_line,
        "compiled program"
    );

    Ok(CompiledProgram {
        labels: prepared.labels,
        line_labels,
        commands,
        start_line: prepared.start_line,
        line_count: prepared.lines.len(),
        pre_start_text: prepared.pre_start_text,
        post_start_text: prepared.post_start_text,
        raw_text: prepared.raw_text,
    })
}

/// Compiles one line outside of a program, keeping its label if it has one.
pub fn compile_line(text: &str, catalog: &dyn CommandCatalog) -> Result<CompiledLine, OwsError> {
    let folded = fold_case(strip_comment(text));
    let (label, body) = match split_label(&folded, 0)? {
        Some(label) => (Some(label.name), label.command),
        None => (None, folded),
    };
    let command = if body.trim().is_empty() {
        None
    } else {
        Some(Rc::new(parse_line(catalog, &body, 0)?))
    };
    Ok(CompiledLine { label, command })
}

#[cfg(test)]
mod tests;
