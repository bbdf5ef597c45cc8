use ows_core::OwsError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Word(String),
    Number(f64),
    Text(String),
    Symbol(char),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offsets into the line.
    pub start: usize,
    pub end: usize,
}

const SYMBOLS: &[char] = &[
    ':', '[', ']', '(', ')', ',', '+', '-', '*', '/', '^', '%', '=', '<', '>', '&', '|', '!',
];

const NOT_PREFIX: &str = "NOT-";

fn is_word_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_'
}

pub(crate) fn tokenize(line: &str, line_number: usize) -> Result<Vec<Token>, OwsError> {
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let offset_at = |index: usize| chars.get(index).map(|(at, _)| *at).unwrap_or(line.len());
    let mut tokens = Vec::new();
    let mut index = 0;

    while index < chars.len() {
        let (start, ch) = chars[index];
        if ch.is_whitespace() {
            index += 1;
            continue;
        }

        if ch == '"' {
            let mut cursor = index + 1;
            while cursor < chars.len() && chars[cursor].1 != '"' {
                cursor += 1;
            }
            if cursor >= chars.len() {
                return Err(OwsError::with_line(
                    "COMPILE_UNTERMINATED_STRING",
                    format!("String literal starting at column {} is never closed.", start),
                    line_number,
                ));
            }
            let text = line[offset_at(index + 1)..offset_at(cursor)].to_string();
            tokens.push(Token {
                kind: TokenKind::Text(text),
                start,
                end: offset_at(cursor + 1),
            });
            index = cursor + 1;
            continue;
        }

        if ch.is_ascii_digit() {
            let mut cursor = index;
            let mut dots = 0;
            while cursor < chars.len() && (chars[cursor].1.is_ascii_digit() || chars[cursor].1 == '.') {
                if chars[cursor].1 == '.' {
                    dots += 1;
                }
                cursor += 1;
            }
            let literal = &line[start..offset_at(cursor)];
            let trailing_name = cursor < chars.len() && is_word_start(chars[cursor].1);
            if dots > 1 || trailing_name {
                return Err(OwsError::with_line(
                    "COMPILE_MALFORMED_NUMBER",
                    format!("\"{}\" is not a valid number.", literal),
                    line_number,
                ));
            }
            let value = literal.parse::<f64>().map_err(|_| {
                OwsError::with_line(
                    "COMPILE_MALFORMED_NUMBER",
                    format!("\"{}\" is not a valid number.", literal),
                    line_number,
                )
            })?;
            tokens.push(Token {
                kind: TokenKind::Number(value),
                start,
                end: offset_at(cursor),
            });
            index = cursor;
            continue;
        }

        if is_word_start(ch) {
            let mut cursor = index;
            while cursor < chars.len() && is_word_char(chars[cursor].1) {
                cursor += 1;
            }
            let end = offset_at(cursor);
            let word = &line[start..end];
            match word.strip_prefix(NOT_PREFIX) {
                Some(rest) if !rest.is_empty() => {
                    let split = start + NOT_PREFIX.len();
                    tokens.push(Token {
                        kind: TokenKind::Word(NOT_PREFIX.to_string()),
                        start,
                        end: split,
                    });
                    tokens.push(Token {
                        kind: TokenKind::Word(rest.to_string()),
                        start: split,
                        end,
                    });
                }
                _ => tokens.push(Token {
                    kind: TokenKind::Word(word.to_string()),
                    start,
                    end,
                }),
            }
            index = cursor;
            continue;
        }

        if SYMBOLS.contains(&ch) {
            tokens.push(Token {
                kind: TokenKind::Symbol(ch),
                start,
                end: start + ch.len_utf8(),
            });
            index += 1;
            continue;
        }

        return Err(OwsError::with_line(
            "COMPILE_UNEXPECTED_TOKEN",
            format!("Unexpected character '{}'.", ch),
            line_number,
        ));
    }

    Ok(tokens)
}
