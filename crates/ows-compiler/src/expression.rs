use std::rc::Rc;

use ows_core::{
    is_reserved_keyword, AmbiguousOperator, CollectionLiteral, Deferred, ElementKind,
    MathOperator, Operation, OwsError, OwsValue, Param, ValueKind,
};

use crate::line_parser::LineParser;
use crate::token::TokenKind;

/// Kind of an operand as far as the parser can tell before running it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StaticKind {
    Number,
    Text,
    Boolean,
    Collection,
    Unknown,
}

/// Whether `&`/`AND` are value operators (`Value`) or logical connectives
/// and item separators (`Logical`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Context {
    Value,
    Logical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fold {
    Math(MathOperator),
    Concat,
    Set { additive: bool },
    Ambiguous(AmbiguousOperator),
}

impl From<ValueKind> for StaticKind {
    fn from(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Number => Self::Number,
            ValueKind::Text => Self::Text,
            ValueKind::Boolean => Self::Boolean,
            ValueKind::Collection => Self::Collection,
            ValueKind::Object | ValueKind::Unit => Self::Unknown,
        }
    }
}

fn math_word(word: &str) -> Option<MathOperator> {
    match word {
        "TIMES" | "X" => Some(MathOperator::Times),
        "DIVIDED-BY" => Some(MathOperator::Divide),
        "TO-THE-POWER-OF" => Some(MathOperator::Power),
        "MODULO" => Some(MathOperator::Modulo),
        "SQUARED" => Some(MathOperator::Squared),
        _ => None,
    }
}

fn math_symbol(symbol: char) -> Option<MathOperator> {
    match symbol {
        '*' => Some(MathOperator::Times),
        '/' => Some(MathOperator::Divide),
        '^' => Some(MathOperator::Power),
        '%' => Some(MathOperator::Modulo),
        _ => None,
    }
}

fn operation(operation: Operation) -> Param {
    Param::Operation(Rc::new(operation))
}

impl<'a> LineParser<'a> {
    /// Any-typed slot: a value expression that turns into a condition when a
    /// comparator or connective follows it.
    pub(crate) fn parse_value_param(&mut self) -> Result<Param, OwsError> {
        if self.starts_condition() {
            return self.parse_or(None);
        }
        let (left, kind) = self.parse_value_expr(Context::Value)?;
        if kind == StaticKind::Boolean || self.peek_comparator().is_some() || self.peek_or() {
            return self.parse_or(Some(left));
        }
        Ok(left)
    }

    /// A collection item or binding value, where `,`, `&` and `AND` separate.
    pub(crate) fn parse_item_value(&mut self) -> Result<Param, OwsError> {
        let seed = if self.starts_condition() {
            self.parse_not()?
        } else {
            self.parse_value_expr(Context::Logical)?.0
        };
        if self.peek_comparator().is_some() {
            return self.parse_comparison(Some(seed));
        }
        Ok(seed)
    }

    pub(crate) fn starts_condition(&self) -> bool {
        self.peek_symbol('!')
            || self.peek_word("TRUE")
            || self.peek_word("FALSE")
            || self.peek_word("NOT")
            || self.peek_word("NOT-")
    }

    pub(crate) fn parse_value_expr(
        &mut self,
        context: Context,
    ) -> Result<(Param, StaticKind), OwsError> {
        let (mut left, mut kind) = self.parse_primary()?;
        while let Some(fold) = self.peek_fold(kind, context) {
            self.pos += 1;
            (left, kind) = match fold {
                Fold::Math(MathOperator::Squared) => (
                    operation(Operation::Math {
                        op: MathOperator::Squared,
                        left,
                        right: None,
                    }),
                    StaticKind::Number,
                ),
                Fold::Math(op) => {
                    let (right, _) = self.parse_primary()?;
                    (
                        operation(Operation::Math {
                            op,
                            left,
                            right: Some(right),
                        }),
                        StaticKind::Number,
                    )
                }
                Fold::Concat => {
                    let (right, _) = self.parse_primary()?;
                    (operation(Operation::Concat { left, right }), StaticKind::Text)
                }
                Fold::Set { additive } => {
                    let right = self.parse_collection_operand(ElementKind::Any)?;
                    (
                        operation(Operation::CollectionSet {
                            additive,
                            left,
                            right,
                        }),
                        StaticKind::Collection,
                    )
                }
                Fold::Ambiguous(op) => {
                    let (right, _) = self.parse_primary()?;
                    (
                        operation(Operation::unknown(op, left, right)),
                        StaticKind::Unknown,
                    )
                }
            };
        }
        Ok((left, kind))
    }

    fn peek_fold(&self, kind: StaticKind, context: Context) -> Option<Fold> {
        let (plus, minus, math, with, without) = match self.peek()? {
            TokenKind::Symbol('+') => (true, false, None, false, false),
            TokenKind::Symbol('&') if context == Context::Value => (true, false, None, false, false),
            TokenKind::Symbol('-') => (false, true, None, false, false),
            TokenKind::Symbol(symbol) => (false, false, Some(math_symbol(*symbol)?), false, false),
            TokenKind::Word(word) => match word.as_str() {
                "PLUS" => (true, false, None, false, false),
                "AND" if context == Context::Value => (true, false, None, false, false),
                "MINUS" => (false, true, None, false, false),
                "WITH" => (false, false, None, true, false),
                "WITHOUT" => (false, false, None, false, true),
                other => (false, false, Some(math_word(other)?), false, false),
            },
            _ => return None,
        };

        match kind {
            StaticKind::Number if plus => Some(Fold::Math(MathOperator::Plus)),
            StaticKind::Number if minus => Some(Fold::Math(MathOperator::Minus)),
            StaticKind::Number => math.map(Fold::Math),
            StaticKind::Text if plus => Some(Fold::Concat),
            StaticKind::Collection if plus || with => Some(Fold::Set { additive: true }),
            StaticKind::Collection if minus || without => Some(Fold::Set { additive: false }),
            StaticKind::Unknown if plus => Some(Fold::Ambiguous(AmbiguousOperator::Plus)),
            StaticKind::Unknown if minus => Some(Fold::Ambiguous(AmbiguousOperator::Minus)),
            StaticKind::Unknown if with => Some(Fold::Set { additive: true }),
            StaticKind::Unknown if without => Some(Fold::Set { additive: false }),
            StaticKind::Unknown => math.map(Fold::Math),
            _ => None,
        }
    }

    pub(crate) fn parse_primary(&mut self) -> Result<(Param, StaticKind), OwsError> {
        let Some(token) = self.peek_token().cloned() else {
            return Err(self.unexpected("a value"));
        };
        match token.kind {
            TokenKind::Symbol('(') => {
                self.pos += 1;
                let inner = self.parse_value_param()?;
                if !self.eat_symbol(')') {
                    return Err(self.error(
                        "COMPILE_UNTERMINATED_CONDITION",
                        "Missing closing ')'.",
                    ));
                }
                let kind = self.static_kind_of(&inner);
                Ok((inner, kind))
            }
            TokenKind::Symbol('[') => {
                let literal = self.parse_collection_literal(ElementKind::Any)?;
                Ok((Param::Collection(Rc::new(literal)), StaticKind::Collection))
            }
            TokenKind::Symbol('-') => {
                let negative = match self.negative_literal(token.end) {
                    Some(value) => value,
                    None => return Err(self.unexpected("a value")),
                };
                self.pos += 2;
                Ok((Param::number(-negative), StaticKind::Number))
            }
            TokenKind::Text(text) => {
                self.pos += 1;
                Ok((Param::Value(OwsValue::Text(text)), StaticKind::Text))
            }
            TokenKind::Number(value) => {
                self.pos += 1;
                Ok((Param::number(value), StaticKind::Number))
            }
            TokenKind::Word(word) => self.parse_word_primary(word),
            TokenKind::Symbol(_) => Err(self.unexpected("a value")),
        }
    }

    fn negative_literal(&self, minus_end: usize) -> Option<f64> {
        let next = self.peek_token_at(1)?;
        match next.kind {
            TokenKind::Number(value) if next.start == minus_end => Some(value),
            _ => None,
        }
    }

    fn parse_word_primary(&mut self, word: String) -> Result<(Param, StaticKind), OwsError> {
        match word.as_str() {
            "TRUE" | "FALSE" => {
                self.pos += 1;
                Ok((Param::Value(OwsValue::Boolean(word == "TRUE")), StaticKind::Boolean))
            }
            "LOOP-INDEX" => {
                self.pos += 1;
                Ok((Param::Deferred(Deferred::LoopIndex), StaticKind::Number))
            }
            "LOOP-OBJECT" => {
                self.pos += 1;
                Ok((Param::Deferred(Deferred::LoopObject), StaticKind::Unknown))
            }
            _ if self.catalog.contains(&word) => {
                let command = self.parse_command()?;
                let kind = self
                    .catalog
                    .signature(&word)
                    .and_then(|signature| signature.returns)
                    .map(StaticKind::from)
                    .unwrap_or(StaticKind::Unknown);
                Ok((Param::Command(Rc::new(command)), kind))
            }
            _ if is_reserved_keyword(&word) => Err(self.error(
                "COMPILE_UNEXPECTED_TOKEN",
                format!("Reserved keyword {} cannot be used as a value.", word),
            )),
            _ => {
                self.pos += 1;
                Ok((Param::variable(word), StaticKind::Unknown))
            }
        }
    }

    pub(crate) fn static_kind_of(&self, param: &Param) -> StaticKind {
        match param {
            Param::Value(value) => StaticKind::from(value.kind()),
            Param::Deferred(Deferred::LoopIndex) => StaticKind::Number,
            Param::Deferred(_) | Param::Bindings(_) | Param::Absent => StaticKind::Unknown,
            Param::Collection(_) => StaticKind::Collection,
            Param::Command(command) => self
                .catalog
                .signature(&command.name)
                .and_then(|signature| signature.returns)
                .map(StaticKind::from)
                .unwrap_or(StaticKind::Unknown),
            Param::Operation(operation) => match operation.as_ref() {
                Operation::Math { .. } => StaticKind::Number,
                Operation::Concat { .. } => StaticKind::Text,
                Operation::CollectionSet { .. } => StaticKind::Collection,
                Operation::Condition { .. } => StaticKind::Boolean,
                Operation::Unknown { .. } => StaticKind::Unknown,
            },
        }
    }

    /// Collection-typed slot: a literal or implicit single item, then any
    /// union/difference chain.
    pub(crate) fn parse_collection_param(
        &mut self,
        element: ElementKind,
    ) -> Result<Param, OwsError> {
        let mut left = self.parse_collection_operand(element)?;
        loop {
            let additive = match self.peek() {
                Some(TokenKind::Symbol('+' | '&')) => true,
                Some(TokenKind::Symbol('-')) => false,
                Some(TokenKind::Word(word)) => match word.as_str() {
                    "WITH" | "PLUS" | "AND" => true,
                    "WITHOUT" | "MINUS" => false,
                    _ => break,
                },
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_collection_operand(element)?;
            left = operation(Operation::CollectionSet {
                additive,
                left,
                right,
            });
        }
        Ok(left)
    }

    fn parse_collection_operand(
        &mut self,
        element: ElementKind,
    ) -> Result<Param, OwsError> {
        if self.peek_symbol('[') {
            let literal = self.parse_collection_literal(element)?;
            return Ok(Param::Collection(Rc::new(literal)));
        }
        let (item, _) = self.parse_primary()?;
        Ok(Param::Collection(Rc::new(CollectionLiteral {
            items: vec![item],
            element,
            implicit: true,
            all: false,
        })))
    }

    pub(crate) fn parse_collection_literal(
        &mut self,
        element: ElementKind,
    ) -> Result<CollectionLiteral, OwsError> {
        if !self.eat_symbol('[') {
            return Err(self.unexpected("'['"));
        }

        let wildcard = matches!(self.peek(), Some(TokenKind::Symbol('*')))
            || matches!(self.peek(), Some(TokenKind::Word(word)) if word == "ALL");
        if wildcard && matches!(self.peek_at(1), Some(TokenKind::Symbol(']'))) {
            self.pos += 2;
            if !element.is_object() {
                return Err(self.error(
                    "COMPILE_ALL_UNSUPPORTED",
                    format!(
                        "[ALL] is only available for characters and entities, not {}.",
                        element.name()
                    ),
                ));
            }
            return Ok(CollectionLiteral {
                items: Vec::new(),
                element,
                implicit: false,
                all: true,
            });
        }

        let mut items = Vec::new();
        if self.eat_symbol(']') {
            return Ok(CollectionLiteral {
                items,
                element,
                implicit: false,
                all: false,
            });
        }
        loop {
            items.push(self.parse_item_value()?);
            if self.eat_symbol(',') || self.eat_symbol('&') || self.eat_word("AND") {
                continue;
            }
            if self.eat_symbol(']') {
                break;
            }
            if self.at_end() {
                return Err(self.error(
                    "COMPILE_UNTERMINATED_COLLECTION",
                    "Collection is missing a closing ']'.",
                ));
            }
            return Err(self.unexpected("',' or ']'"));
        }
        Ok(CollectionLiteral {
            items,
            element,
            implicit: false,
            all: false,
        })
    }
}
