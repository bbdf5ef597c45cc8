use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use ows_api::{OwsError, StaticDirectory};
use tracing::debug;
use walkdir::WalkDir;

use crate::{
    map_cli_actors_invalid, map_cli_actors_read, map_cli_source_path, map_cli_source_read,
    map_cli_source_scan,
};

pub(crate) const SOURCE_EXTENSION: &str = ".ows";

pub(crate) fn load_sources_by_scripts_dir(
    scripts_dir: &str,
) -> Result<BTreeMap<String, String>, OwsError> {
    let scripts_root = resolve_scripts_dir(scripts_dir)?;
    let sources = read_sources_from_dir(&scripts_root)?;
    debug!(
        root = %scripts_root.display(),
        files = sources.len(),
        "loaded script sources"
    );
    Ok(sources)
}

pub(crate) fn resolve_scripts_dir(scripts_dir: &str) -> Result<PathBuf, OwsError> {
    let path = PathBuf::from(scripts_dir);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(map_cli_source_path)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(OwsError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("scripts-dir does not exist: {}", absolute.display()),
        ));
    }

    if !absolute.is_dir() {
        return Err(OwsError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("scripts-dir is not a directory: {}", absolute.display()),
        ));
    }

    Ok(absolute)
}

/// Fragments are keyed by their path relative to `scripts_dir`, so a file
/// named `_setup.ows` anywhere in the tree is still a pre-start fragment.
pub(crate) fn read_sources_from_dir(
    scripts_dir: &Path,
) -> Result<BTreeMap<String, String>, OwsError> {
    let mut sources = BTreeMap::new();

    for entry in WalkDir::new(scripts_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(path_str) = path.to_str() else {
            continue;
        };
        if !path_str.ends_with(SOURCE_EXTENSION) {
            continue;
        }

        let relative = path
            .strip_prefix(scripts_dir)
            .map_err(map_cli_source_scan)?
            .to_string_lossy()
            .replace('\\', "/");

        let content = fs::read_to_string(path).map_err(map_cli_source_read)?;
        sources.insert(relative, content);
    }

    if sources.is_empty() {
        return Err(OwsError::new(
            "CLI_SOURCE_EMPTY",
            format!("No {} files under {}", SOURCE_EXTENSION, scripts_dir.display()),
        ));
    }

    Ok(sources)
}

pub(crate) fn load_directory(path: &str) -> Result<StaticDirectory, OwsError> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(OwsError::new(
            "CLI_ACTORS_NOT_FOUND",
            format!("Actors file does not exist: {}", path.display()),
        ));
    }
    let raw = fs::read_to_string(path).map_err(map_cli_actors_read)?;
    serde_json::from_str(&raw).map_err(map_cli_actors_invalid)
}
