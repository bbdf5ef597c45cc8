use std::rc::Rc;

use ows_core::{Comparator, Operation, OwsError, Param};

use crate::expression::Context;
use crate::line_parser::LineParser;
use crate::token::TokenKind;

fn condition(comparator: Comparator, left: Param, right: Option<Param>) -> Param {
    Param::Operation(Rc::new(Operation::condition(comparator, left, right)))
}

fn is_condition(param: &Param) -> bool {
    matches!(param, Param::Operation(operation) if matches!(**operation, Operation::Condition { .. }))
}

// Binding, loosest first: `|`, `&`, comparisons, prefix NOT.
impl<'a> LineParser<'a> {
    /// Boolean slot. A lone operand becomes an IDENTITY check.
    pub(crate) fn parse_condition_param(&mut self) -> Result<Param, OwsError> {
        let parsed = self.parse_or(None)?;
        if is_condition(&parsed) {
            return Ok(parsed);
        }
        Ok(condition(Comparator::Identity, parsed, None))
    }

    pub(crate) fn parse_or(&mut self, seed: Option<Param>) -> Result<Param, OwsError> {
        let mut left = self.parse_and(seed)?;
        while self.eat_or() {
            let right = self.parse_and(None)?;
            left = condition(Comparator::Or, left, Some(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self, seed: Option<Param>) -> Result<Param, OwsError> {
        let mut left = self.parse_comparison(seed)?;
        while self.eat_symbol('&') || self.eat_word("AND") {
            let right = self.parse_comparison(None)?;
            left = condition(Comparator::And, left, Some(right));
        }
        Ok(left)
    }

    pub(crate) fn parse_comparison(&mut self, seed: Option<Param>) -> Result<Param, OwsError> {
        let mut left = match seed {
            Some(seed) => seed,
            None => self.parse_not()?,
        };
        while let Some(comparator) = self.peek_comparator() {
            self.pos += 1;
            let right = self.parse_not()?;
            left = condition(comparator, left, Some(right));
        }
        Ok(left)
    }

    pub(crate) fn parse_not(&mut self) -> Result<Param, OwsError> {
        if self.eat_symbol('!') || self.eat_word("NOT") || self.eat_word("NOT-") {
            let inner = self.parse_not()?;
            return Ok(condition(Comparator::Not, inner, None));
        }
        Ok(self.parse_value_expr(Context::Logical)?.0)
    }

    pub(crate) fn peek_comparator(&self) -> Option<Comparator> {
        match self.peek()? {
            TokenKind::Symbol('=') => Some(Comparator::Equals),
            TokenKind::Symbol('>') => Some(Comparator::GreaterThan),
            TokenKind::Symbol('<') => Some(Comparator::LessThan),
            TokenKind::Word(word) => match word.as_str() {
                "EQUALS" => Some(Comparator::Equals),
                "GREATER-THAN" => Some(Comparator::GreaterThan),
                "LESS-THAN" => Some(Comparator::LessThan),
                _ => None,
            },
            _ => None,
        }
    }

    pub(crate) fn peek_or(&self) -> bool {
        self.peek_symbol('|') || self.peek_word("OR")
    }

    fn eat_or(&mut self) -> bool {
        self.eat_symbol('|') || self.eat_word("OR")
    }
}
