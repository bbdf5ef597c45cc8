use std::collections::BTreeMap;
use std::sync::OnceLock;

use ows_core::{is_reserved_keyword, OwsError, START_LABEL};
use regex::Regex;

use crate::text::{fold_case, split_statements, strip_comment};

const CONTINUATION: &str = "...";
const PRE_START_PREFIX: char = '_';

/// Source lines ready for the per-line command parse. `lines[i]` is the
/// command text of line `i` with any label prefix removed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreparedSource {
    pub lines: Vec<String>,
    pub labels: BTreeMap<String, usize>,
    pub start_line: usize,
    pub pre_start_text: String,
    pub post_start_text: String,
    pub raw_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelLine {
    pub name: String,
    pub command: String,
}

fn label_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^\s*\[([^\]:]*)\](.*)$").expect("label regex must compile"))
}

fn label_name_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[A-Z0-9_-]+$").expect("label name regex must compile"))
}

/// Splits fragments into the pre-start segment (file name starts with `_`)
/// and the main segment, each in name order.
pub fn order_fragments(sources: &BTreeMap<String, String>) -> (Vec<&str>, Vec<&str>) {
    let mut pre_start = Vec::new();
    let mut post_start = Vec::new();
    for (name, text) in sources {
        let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
        if file_name.starts_with(PRE_START_PREFIX) {
            pre_start.push(text.as_str());
        } else {
            post_start.push(text.as_str());
        }
    }
    (pre_start, post_start)
}

pub fn prepare_sources(sources: &BTreeMap<String, String>) -> Result<PreparedSource, OwsError> {
    let (pre_start, post_start) = order_fragments(sources);
    let pre_start_text = pre_start.join("\n");
    let post_start_text = post_start.join("\n");

    let mut lines = statements_of(&pre_start_text);
    let implicit_start = lines.len();
    let mut main_lines = statements_of(&post_start_text);
    trim_blank_edges(&mut main_lines);
    lines.extend(main_lines);
    join_continuations(&mut lines);

    let mut labels = BTreeMap::new();
    let mut explicit_start = None;
    for (index, line) in lines.iter_mut().enumerate() {
        let Some(label) = split_label(line, index)? else {
            continue;
        };
        if label.name == START_LABEL {
            if explicit_start.is_some() {
                return Err(OwsError::with_line(
                    "COMPILE_DUPLICATE_START",
                    "Multiple START labels detected. Only one START label is allowed per program.",
                    index,
                ));
            }
            explicit_start = Some(index);
        } else if labels.contains_key(&label.name) {
            return Err(OwsError::with_line(
                "COMPILE_DUPLICATE_LABEL",
                format!("Label \"{}\" is declared more than once.", label.name),
                index,
            ));
        }
        labels.insert(label.name, index);
        *line = label.command;
    }

    let start_line = explicit_start.unwrap_or(implicit_start);
    labels.insert(START_LABEL.to_string(), start_line);

    let raw_text = [pre_start_text.as_str(), post_start_text.as_str()]
        .iter()
        .filter(|text| !text.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n");

    Ok(PreparedSource {
        lines,
        labels,
        start_line,
        pre_start_text,
        post_start_text,
        raw_text,
    })
}

/// Recognises `[NAME]: command`. The command part may be empty.
pub fn split_label(line: &str, index: usize) -> Result<Option<LabelLine>, OwsError> {
    let Some(captures) = label_regex().captures(line) else {
        return Ok(None);
    };
    let name = captures
        .get(1)
        .map(|found| found.as_str().trim())
        .unwrap_or_default();
    let rest = captures
        .get(2)
        .map(|found| found.as_str().trim_start())
        .unwrap_or_default();
    if !label_name_regex().is_match(name) {
        return Err(OwsError::with_line(
            "COMPILE_INVALID_LABEL",
            format!("\"{}\" is not a valid label name.", name),
            index,
        ));
    }
    if name != START_LABEL && is_reserved_keyword(name) {
        return Err(OwsError::with_line(
            "COMPILE_RESERVED_KEYWORD",
            format!("Tried to use reserved keyword as label name: {}", name),
            index,
        ));
    }
    let command = rest.strip_prefix(':').unwrap_or(rest).trim().to_string();
    Ok(Some(LabelLine {
        name: name.to_string(),
        command,
    }))
}

fn statements_of(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .flat_map(|line| split_statements(strip_comment(line)))
        .map(|statement| fold_case(&statement))
        .collect()
}

fn trim_blank_edges(lines: &mut Vec<String>) {
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    let leading = lines
        .iter()
        .take_while(|line| line.trim().is_empty())
        .count();
    lines.drain(..leading);
}

/// Appends `...` lines onto the line before them. The consumed lines stay
/// behind as blanks so later line numbers do not shift.
fn join_continuations(lines: &mut [String]) {
    let mut index = 0;
    while index < lines.len() {
        let mut next = index + 1;
        while next < lines.len() && lines[next].trim_start().starts_with(CONTINUATION) {
            let tail = lines[next].trim_start()[CONTINUATION.len()..].trim().to_string();
            let current = &mut lines[index];
            current.push(' ');
            current.push_str(&tail);
            lines[next].clear();
            next += 1;
        }
        index = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn order_fragments_moves_underscore_files_before_start() {
        let sources = map(&[
            ("b.ows", "B"),
            ("lib/_setup.ows", "SETUP"),
            ("a.ows", "A"),
        ]);
        let (pre, post) = order_fragments(&sources);
        assert_eq!(pre, vec!["SETUP"]);
        assert_eq!(post, vec!["A", "B"]);
    }

    #[test]
    fn prepare_sources_places_implicit_start_after_setup() {
        let sources = map(&[
            ("_defs.ows", "set-for-world: limit = 3"),
            ("main.ows", "\n\nsay: \"hi\" # greet\nend\n\n"),
        ]);
        let prepared = prepare_sources(&sources).expect("prepare should pass");
        assert_eq!(prepared.start_line, 1);
        assert_eq!(prepared.labels.get("START"), Some(&1));
        assert_eq!(
            prepared.lines,
            vec![
                "SET-FOR-WORLD: LIMIT = 3".to_string(),
                "SAY: \"hi\" ".to_string(),
                "END".to_string(),
            ]
        );
        assert!(prepared.raw_text.contains("set-for-world"));
    }

    #[test]
    fn prepare_sources_extracts_labels_and_keeps_command() {
        let sources = map(&[("main.ows", "GO-TO: LOOP\n[loop]: say: 1\n[start]\nEND")]);
        let prepared = prepare_sources(&sources).expect("prepare should pass");
        assert_eq!(prepared.labels.get("LOOP"), Some(&1));
        assert_eq!(prepared.start_line, 2);
        assert_eq!(prepared.lines[1], "SAY: 1");
        assert_eq!(prepared.lines[2], "");
    }

    #[test]
    fn continuation_lines_join_and_leave_blanks() {
        let sources = map(&[("main.ows", "SAY: \"a\"\n... + \"b\"\n...+ \"c\"\nEND")]);
        let prepared = prepare_sources(&sources).expect("prepare should pass");
        assert_eq!(prepared.lines[0], "SAY: \"a\" + \"b\" + \"c\"");
        assert_eq!(prepared.lines[1], "");
        assert_eq!(prepared.lines[2], "");
        assert_eq!(prepared.lines[3], "END");
    }

    #[test]
    fn semicolons_split_statements() {
        let sources = map(&[("main.ows", "SET: A = 1; SET: B = 2\nEND")]);
        let prepared = prepare_sources(&sources).expect("prepare should pass");
        assert_eq!(prepared.lines.len(), 3);
        assert_eq!(prepared.lines[1].trim(), "SET: B = 2");
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let error = prepare_sources(&map(&[("main.ows", "[START]: END\n[START]: END")]))
            .expect_err("duplicate start should fail");
        assert_eq!(error.code, "COMPILE_DUPLICATE_START");
        assert_eq!(error.line, Some(1));

        let error = prepare_sources(&map(&[("main.ows", "[A]: END\n[A]: END")]))
            .expect_err("duplicate label should fail");
        assert_eq!(error.code, "COMPILE_DUPLICATE_LABEL");

        let error = prepare_sources(&map(&[("main.ows", "[WITH]: END")]))
            .expect_err("keyword label should fail");
        assert_eq!(error.code, "COMPILE_RESERVED_KEYWORD");

        let error = prepare_sources(&map(&[("main.ows", "[A B]: END")]))
            .expect_err("spaced label should fail");
        assert_eq!(error.code, "COMPILE_INVALID_LABEL");
    }
}
