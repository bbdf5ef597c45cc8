use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::OwsError;
use crate::types::{Character, Entity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OwsValue {
    Boolean(bool),
    Number(Number),
    Text(String),
    Collection(Collection),
    Object(ObjectRef),
    Unit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Number,
    Text,
    Boolean,
    Collection,
    Object,
    Unit,
}

impl OwsValue {
    pub fn number(value: f64) -> Self {
        Self::Number(Number::new(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Number(_) => ValueKind::Number,
            Self::Text(_) => ValueKind::Text,
            Self::Collection(_) => ValueKind::Collection,
            Self::Object(_) => ValueKind::Object,
            Self::Unit => ValueKind::Unit,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Self::Collection(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }
}

impl fmt::Display for OwsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(true) => f.write_str("TRUE"),
            Self::Boolean(false) => f.write_str("FALSE"),
            Self::Number(number) => write!(f, "{}", number),
            Self::Text(text) => f.write_str(text),
            Self::Collection(collection) => {
                f.write_str("[")?;
                for (index, item) in collection.items().iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Self::Object(object) => f.write_str(object.display_name()),
            Self::Unit => Ok(()),
        }
    }
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Collection => "collection",
            Self::Object => "object",
            Self::Unit => "unit",
        }
    }
}

/// A float with an integer view. Writing the integer view shifts the float by
/// the same delta, so the fractional part survives.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Number {
    value: f64,
}

impl Number {
    pub fn new(value: f64) -> Self {
        Self { value }
    }

    pub fn float(&self) -> f64 {
        self.value
    }

    pub fn int(&self) -> i64 {
        self.value.trunc() as i64
    }

    pub fn set_float(&mut self, value: f64) {
        self.value = value;
    }

    pub fn set_int(&mut self, value: i64) {
        let diff = self.int() - value;
        self.value -= diff as f64;
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Number> for f64 {
    fn from(value: Number) -> Self {
        value.value
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_finite() && self.value.fract() == 0.0 && self.value.abs() < 1e15 {
            write!(f, "{}", self.int())
        } else {
            write!(f, "{}", self.value)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ElementKind {
    #[default]
    Any,
    Number,
    Text,
    Boolean,
    Character,
    Entity,
    Collection,
}

impl ElementKind {
    pub fn accepts(self, value: &OwsValue) -> bool {
        match self {
            Self::Any => true,
            Self::Number => matches!(value, OwsValue::Number(_)),
            Self::Text => matches!(value, OwsValue::Text(_)),
            Self::Boolean => matches!(value, OwsValue::Boolean(_)),
            Self::Character => matches!(value, OwsValue::Object(ObjectRef::Character(_))),
            Self::Entity => matches!(value, OwsValue::Object(ObjectRef::Entity(_))),
            Self::Collection => matches!(value, OwsValue::Collection(_)),
        }
    }

    pub fn is_object(self) -> bool {
        matches!(self, Self::Character | Self::Entity)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Number => "number",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Character => "character",
            Self::Entity => "entity",
            Self::Collection => "collection",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<OwsValue>", into = "Vec<OwsValue>")]
pub struct Collection {
    items: Vec<OwsValue>,
    element: ElementKind,
}

impl Collection {
    pub fn new(element: ElementKind) -> Self {
        Self {
            items: Vec::new(),
            element,
        }
    }

    pub fn typed(element: ElementKind, items: Vec<OwsValue>) -> Result<Self, OwsError> {
        let mut collection = Self::new(element);
        for item in items {
            collection.push(item)?;
        }
        Ok(collection)
    }

    pub fn element(&self) -> ElementKind {
        self.element
    }

    pub fn items(&self) -> &[OwsValue] {
        &self.items
    }

    pub fn into_items(self) -> Vec<OwsValue> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, value: OwsValue) -> Result<(), OwsError> {
        if !self.element.accepts(&value) {
            return Err(OwsError::new(
                "ENGINE_COLLECTION_TYPE",
                format!(
                    "Cannot add a {} to a collection of {}.",
                    value.type_name(),
                    self.element.name()
                ),
            ));
        }
        self.items.push(value);
        Ok(())
    }

    /// Left items followed by right items, under the left constraint.
    pub fn union(&self, other: &Collection) -> Result<Collection, OwsError> {
        let mut merged = self.clone();
        for item in &other.items {
            merged.push(item.clone())?;
        }
        if merged.element == ElementKind::Any && other.element == self.element {
            merged.element = other.element;
        }
        Ok(merged)
    }

    /// Removes the first equal occurrence of each right item.
    pub fn difference(&self, other: &Collection) -> Collection {
        let mut remaining = self.clone();
        for item in &other.items {
            if let Some(index) = remaining.items.iter().position(|entry| entry == item) {
                remaining.items.remove(index);
            }
        }
        remaining
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl From<Vec<OwsValue>> for Collection {
    fn from(items: Vec<OwsValue>) -> Self {
        Self {
            items,
            element: ElementKind::Any,
        }
    }
}

impl From<Collection> for Vec<OwsValue> {
    fn from(value: Collection) -> Self {
        value.items
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ObjectRef {
    Character(Character),
    Entity(Entity),
}

impl ObjectRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Character(character) => &character.id,
            Self::Entity(entity) => &entity.id,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Character(character) => &character.unique_name,
            Self::Entity(entity) => &entity.name,
        }
    }
}
