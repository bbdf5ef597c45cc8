use std::rc::Rc;

use ows_core::{
    is_reserved_keyword, CommandCatalog, CommandNode, CommandSignature, CommandSyntax, ElementKind,
    OwsError, Param, ParamKind,
};

use crate::suggest::closest_name;
use crate::token::{tokenize, Token, TokenKind};

const SETTER_WORDS: &[&str] = &["TO", "IS", "AS", "EQUALS"];

/// Recursive-descent parser over the tokens of one logical line.
pub(crate) struct LineParser<'a> {
    pub(crate) catalog: &'a dyn CommandCatalog,
    text: &'a str,
    tokens: Vec<Token>,
    pub(crate) pos: usize,
    pub(crate) line: usize,
}

pub(crate) fn parse_line(
    catalog: &dyn CommandCatalog,
    text: &str,
    line: usize,
) -> Result<CommandNode, OwsError> {
    let mut parser = LineParser::new(catalog, text, line)?;
    let command = parser.parse_command()?;
    while parser.eat_symbol(':') {}
    if let Some(token) = parser.peek_token() {
        return Err(parser.error(
            "COMPILE_TRAILING_TEXT",
            format!("Unexpected text after command: {}", text[token.start..].trim()),
        ));
    }
    Ok(command)
}

impl<'a> LineParser<'a> {
    pub(crate) fn new(
        catalog: &'a dyn CommandCatalog,
        text: &'a str,
        line: usize,
    ) -> Result<Self, OwsError> {
        Ok(Self {
            catalog,
            text,
            tokens: tokenize(text, line)?,
            pos: 0,
            line,
        })
    }

    pub(crate) fn error(&self, code: &str, message: impl Into<String>) -> OwsError {
        OwsError::with_line(code, message, self.line)
    }

    pub(crate) fn peek_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub(crate) fn peek_token_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    pub(crate) fn peek(&self) -> Option<&TokenKind> {
        self.peek_at(0)
    }

    pub(crate) fn peek_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + offset).map(|token| &token.kind)
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub(crate) fn peek_symbol(&self, symbol: char) -> bool {
        matches!(self.peek(), Some(TokenKind::Symbol(found)) if *found == symbol)
    }

    pub(crate) fn eat_symbol(&mut self, symbol: char) -> bool {
        if self.peek_symbol(symbol) {
            self.pos += 1;
            return true;
        }
        false
    }

    pub(crate) fn peek_word(&self, word: &str) -> bool {
        matches!(self.peek(), Some(TokenKind::Word(found)) if found == word)
    }

    pub(crate) fn eat_word(&mut self, word: &str) -> bool {
        if self.peek_word(word) {
            self.pos += 1;
            return true;
        }
        false
    }

    /// Rest of the line from the current token, for error messages.
    pub(crate) fn remaining_text(&self) -> &str {
        self.peek_token()
            .map(|token| self.text[token.start..].trim())
            .unwrap_or_default()
    }

    pub(crate) fn unexpected(&self, expected: &str) -> OwsError {
        if self.at_end() {
            return self.error(
                "COMPILE_MISSING_VALUE",
                format!("Expected {} but the line ended.", expected),
            );
        }
        self.error(
            "COMPILE_UNEXPECTED_TOKEN",
            format!("Expected {} at: {}", expected, self.remaining_text()),
        )
    }

    fn expect_word(&mut self, expected: &str) -> Result<String, OwsError> {
        match self.peek() {
            Some(TokenKind::Word(word)) => {
                let word = word.clone();
                self.pos += 1;
                Ok(word)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn at_param_end(&self) -> bool {
        matches!(
            self.peek(),
            None | Some(TokenKind::Symbol(':' | ')' | ']' | ','))
        )
    }

    fn lookup_command(&self, name: &str) -> Result<&'a CommandSignature, OwsError> {
        let catalog = self.catalog;
        catalog.signature(name).ok_or_else(|| {
            let names = catalog.command_names();
            let message = match closest_name(name, &names) {
                Some(closest) => format!("Unknown command \"{}\". Did you mean \"{}\"?", name, closest),
                None => format!("Unknown command \"{}\".", name),
            };
            self.error("COMPILE_UNKNOWN_COMMAND", message)
        })
    }

    pub(crate) fn parse_command(&mut self) -> Result<CommandNode, OwsError> {
        let name = self.expect_word("a command name")?;
        let signature = self.lookup_command(&name)?;
        let (signature, params) = match signature.syntax {
            CommandSyntax::Standard | CommandSyntax::GoTo => {
                (signature, self.parse_standard_params(signature)?)
            }
            CommandSyntax::Set => (signature, self.parse_set_params()?),
            CommandSyntax::Unset => {
                self.eat_symbol(':');
                (signature, vec![Param::text(self.parse_variable_name()?)])
            }
            CommandSyntax::SetFor => self.parse_for_targets(signature, true)?,
            CommandSyntax::UnsetFor => self.parse_for_targets(signature, false)?,
            CommandSyntax::Do => (signature, self.parse_do_params()?),
            CommandSyntax::Conditional => (signature, self.parse_conditional_params()?),
        };
        CommandNode::new(signature, params, self.line)
    }

    fn parse_standard_params(
        &mut self,
        signature: &CommandSignature,
    ) -> Result<Vec<Param>, OwsError> {
        let mut params = Vec::with_capacity(signature.params.len());
        for kind in &signature.params {
            if *kind == ParamKind::Line {
                params.push(Param::number(self.line as f64));
                continue;
            }
            self.eat_symbol(':');
            if self.at_param_end() {
                return Err(self.error(
                    "COMPILE_PARAMETER_COUNT",
                    format!(
                        "{} expects {} parameter(s).",
                        signature.name,
                        signature
                            .params
                            .iter()
                            .filter(|kind| **kind != ParamKind::Line)
                            .count()
                    ),
                ));
            }
            params.push(self.parse_param(*kind)?);
        }
        Ok(params)
    }

    pub(crate) fn parse_param(&mut self, kind: ParamKind) -> Result<Param, OwsError> {
        match kind {
            ParamKind::Command => Ok(Param::Command(Rc::new(self.parse_command()?))),
            ParamKind::Label => Ok(Param::text(self.parse_label_name()?)),
            ParamKind::Name => Ok(Param::text(self.parse_variable_name()?)),
            ParamKind::Bindings => self.parse_bindings(),
            ParamKind::Line => Ok(Param::number(self.line as f64)),
            ParamKind::Collection(element) => self.parse_collection_param(element),
            ParamKind::Boolean => self.parse_condition_param(),
            ParamKind::Any | ParamKind::Number | ParamKind::Text => self.parse_value_param(),
        }
    }

    fn parse_label_name(&mut self) -> Result<String, OwsError> {
        let label = self.expect_word("a label name")?;
        if label != ows_core::START_LABEL && is_reserved_keyword(&label) {
            return Err(self.error(
                "COMPILE_RESERVED_KEYWORD",
                format!("Tried to use reserved keyword as label name: {}", label),
            ));
        }
        Ok(label)
    }

    pub(crate) fn parse_variable_name(&mut self) -> Result<String, OwsError> {
        let name = self.expect_word("a variable name")?;
        if is_reserved_keyword(&name) {
            return Err(self.error(
                "COMPILE_RESERVED_KEYWORD",
                format!("Tried to use reserved keyword as variable name: {}", name),
            ));
        }
        if self.catalog.contains(&name) {
            return Err(self.error(
                "COMPILE_NAME_CONFLICT",
                format!("\"{}\" is a command name and cannot name a variable.", name),
            ));
        }
        Ok(name)
    }

    fn eat_setter(&mut self) -> bool {
        if self.eat_symbol('=') {
            return true;
        }
        SETTER_WORDS.iter().any(|word| self.eat_word(word))
    }

    /// `NAME (=|TO|IS|AS|EQUALS) value`
    fn parse_assignment(&mut self) -> Result<(String, Param), OwsError> {
        let name = self.parse_variable_name()?;
        if !self.eat_setter() {
            return Err(self.unexpected("'=', TO, IS, AS or EQUALS"));
        }
        let value = self.parse_value_param()?;
        Ok((name, value))
    }

    fn parse_set_params(&mut self) -> Result<Vec<Param>, OwsError> {
        self.eat_symbol(':');
        let (name, value) = self.parse_assignment()?;
        Ok(vec![Param::text(name), value])
    }

    /// SET-FOR and UN-SET-FOR: a `WORLD`/`PROGRAM` selector switches to the
    /// matching tier command, anything else is a character collection.
    fn parse_for_targets(
        &mut self,
        signature: &'a CommandSignature,
        setting: bool,
    ) -> Result<(&'a CommandSignature, Vec<Param>), OwsError> {
        self.eat_symbol(':');
        let tier = if self.eat_word("WORLD") {
            Some("WORLD")
        } else if self.eat_word("PROGRAM") {
            Some("PROGRAM")
        } else {
            None
        };

        if let Some(tier) = tier {
            let prefix = if setting { "SET-FOR" } else { "UN-SET-FOR" };
            let redirected = self.lookup_command(&format!("{}-{}", prefix, tier))?;
            self.eat_symbol(':');
            let params = if setting {
                self.parse_assignment()
                    .map(|(name, value)| vec![Param::text(name), value])?
            } else {
                vec![Param::text(self.parse_variable_name()?)]
            };
            return Ok((redirected, params));
        }

        let targets = self.parse_collection_param(ElementKind::Character)?;
        self.eat_symbol(':');
        let mut params = vec![targets];
        if setting {
            let (name, value) = self.parse_assignment()?;
            params.push(Param::text(name));
            params.push(value);
        } else {
            params.push(Param::text(self.parse_variable_name()?));
        }
        Ok((signature, params))
    }

    /// `DO: LABEL [WITH [A = x, B]]`
    fn parse_do_params(&mut self) -> Result<Vec<Param>, OwsError> {
        self.eat_symbol(':');
        let label = self.parse_label_name()?;
        let checkpoint = self.pos;
        self.eat_symbol(':');
        let bindings = if self.eat_word("WITH") {
            self.eat_symbol(':');
            self.parse_bindings()?
        } else {
            self.pos = checkpoint;
            Param::Bindings(Rc::new(Vec::new()))
        };
        Ok(vec![
            Param::text(label),
            bindings,
            Param::number(self.line as f64),
        ])
    }

    fn parse_bindings(&mut self) -> Result<Param, OwsError> {
        if !self.eat_symbol('[') {
            return Err(self.unexpected("'[' to open the WITH bindings"));
        }
        let mut bindings = Vec::new();
        if self.eat_symbol(']') {
            return Ok(Param::Bindings(Rc::new(bindings)));
        }
        loop {
            let name = self.parse_variable_name()?;
            let value = if self.eat_setter() {
                self.parse_item_value()?
            } else {
                Param::variable(name.clone())
            };
            bindings.push((name, value));

            if self.eat_symbol(',') || self.eat_symbol('&') || self.eat_word("AND") {
                continue;
            }
            if self.eat_symbol(']') {
                break;
            }
            if self.at_end() {
                return Err(self.error(
                    "COMPILE_UNTERMINATED_COLLECTION",
                    "WITH bindings are missing a closing ']'.",
                ));
            }
            return Err(self.unexpected("',' or ']'"));
        }
        Ok(Param::Bindings(Rc::new(bindings)))
    }

    /// `IF: condition : command [: ELSE: command]`
    fn parse_conditional_params(&mut self) -> Result<Vec<Param>, OwsError> {
        self.eat_symbol(':');
        let condition = self.parse_condition_param()?;
        self.eat_symbol(':');
        let then_branch = Param::Command(Rc::new(self.parse_command()?));
        let checkpoint = self.pos;
        self.eat_symbol(':');
        let else_branch = if self.eat_word("ELSE") {
            self.eat_symbol(':');
            Param::Command(Rc::new(self.parse_command()?))
        } else {
            self.pos = checkpoint;
            Param::Absent
        };
        Ok(vec![condition, then_branch, else_branch])
    }
}
