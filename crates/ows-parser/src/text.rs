const QUOTE: char = '"';
const COMMENT: char = '#';
const STATEMENT_END: char = ';';

/// Upper-cases everything outside `"..."` literals.
pub fn fold_case(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_string = false;
    for ch in line.chars() {
        if ch == QUOTE {
            in_string = !in_string;
            out.push(ch);
        } else if in_string {
            out.push(ch);
        } else {
            out.extend(ch.to_uppercase());
        }
    }
    out
}

/// Byte offset of the first `needle` that is not inside a string literal.
pub fn find_outside_strings(text: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let mut in_string = false;
    for (index, ch) in text.char_indices() {
        if ch == QUOTE {
            in_string = !in_string;
            continue;
        }
        if !in_string && text[index..].starts_with(needle) {
            return Some(index);
        }
    }
    None
}

pub fn strip_comment(line: &str) -> &str {
    match find_outside_strings(line, "#") {
        Some(index) => &line[..index],
        None => line,
    }
}

/// Splits on `;` outside strings. Blank pieces are dropped only when a
/// terminator was present, so a blank line stays one blank statement.
pub fn split_statements(line: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut split = false;
    for ch in line.chars() {
        match ch {
            QUOTE => {
                in_string = !in_string;
                current.push(ch);
            }
            STATEMENT_END if !in_string => {
                split = true;
                pieces.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    pieces.push(current);
    if split {
        pieces.retain(|piece| !piece.trim().is_empty());
    }
    pieces
}
