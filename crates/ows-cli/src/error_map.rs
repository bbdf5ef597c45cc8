use ows_api::OwsError;
use std::fmt::Display;

fn map_error(code: &'static str, error: impl Display) -> OwsError {
    OwsError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: OwsError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.describe()).unwrap_or_else(|_| "\"Unknown error\"".to_string())
    );
    1
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> OwsError {
    map_error("CLI_SOURCE_PATH", error)
}

pub(crate) fn map_cli_source_scan(error: std::path::StripPrefixError) -> OwsError {
    map_error("CLI_SOURCE_SCAN", error)
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> OwsError {
    map_error("CLI_SOURCE_READ", error)
}

pub(crate) fn map_cli_actors_read(error: std::io::Error) -> OwsError {
    map_error("CLI_ACTORS_READ", error)
}

pub(crate) fn map_cli_actors_invalid(error: serde_json::Error) -> OwsError {
    map_error("CLI_ACTORS_INVALID", error)
}

pub(crate) fn map_cli_output_json(error: serde_json::Error) -> OwsError {
    map_error("CLI_OUTPUT_JSON", error)
}
