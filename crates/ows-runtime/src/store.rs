use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use ows_core::OwsValue;

/// A named slot. Aliases share the cell, so writes through one name are seen
/// through every other.
pub type Variable = Rc<RefCell<OwsValue>>;

pub(crate) type Store = BTreeMap<String, Variable>;

pub(crate) fn new_variable(value: OwsValue) -> Variable {
    Rc::new(RefCell::new(value))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Temp,
    CharacterLocal,
    CharacterGlobal,
    Program,
    World,
}

impl Tier {
    pub fn name(self) -> &'static str {
        match self {
            Self::Temp => "temporary",
            Self::CharacterLocal => "character-local",
            Self::CharacterGlobal => "character-global",
            Self::Program => "program",
            Self::World => "world",
        }
    }

    pub fn is_character(self) -> bool {
        matches!(self, Self::CharacterLocal | Self::CharacterGlobal)
    }
}

/// Bindings visible to one call level. Cloning shares the same bindings.
#[derive(Debug, Clone, Default)]
pub struct TempScope(Rc<RefCell<Store>>);

impl TempScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Variable> {
        self.0.borrow().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.borrow().contains_key(name)
    }

    /// Makes `name` an alias of an existing cell.
    pub fn bind(&self, name: impl Into<String>, variable: Variable) {
        self.0.borrow_mut().insert(name.into(), variable);
    }

    /// Writes into the existing cell for `name`, or creates one.
    pub fn set(&self, name: impl Into<String>, value: OwsValue) {
        let name = name.into();
        let existing = self.get(&name);
        match existing {
            Some(variable) => *variable.borrow_mut() = value,
            None => {
                self.0.borrow_mut().insert(name, new_variable(value));
            }
        }
    }

    pub fn remove(&self, name: &str) -> bool {
        self.0.borrow_mut().remove(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }
}

#[derive(Debug, Default)]
pub(crate) struct WorldStores {
    pub(crate) world: Store,
    /// Keyed by character id.
    pub(crate) character_globals: BTreeMap<String, Store>,
}

/// World-global and character-global variables, shared by every program the
/// host hands the same handle to.
#[derive(Debug, Clone, Default)]
pub struct RuntimeWorld(Rc<RefCell<WorldStores>>);

impl RuntimeWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn world_variable(&self, name: &str) -> Option<OwsValue> {
        self.0
            .borrow()
            .world
            .get(name)
            .map(|variable| variable.borrow().clone())
    }

    pub fn character_variable(&self, character_id: &str, name: &str) -> Option<OwsValue> {
        self.0
            .borrow()
            .character_globals
            .get(character_id)
            .and_then(|store| store.get(name))
            .map(|variable| variable.borrow().clone())
    }

    pub fn world_names(&self) -> Vec<String> {
        self.0.borrow().world.keys().cloned().collect()
    }

    pub(crate) fn stores(&self) -> &RefCell<WorldStores> {
        &self.0
    }
}

#[derive(Debug, Default)]
pub(crate) struct ProgramStores {
    pub(crate) program: Store,
    /// Keyed by character id.
    pub(crate) character_locals: BTreeMap<String, Store>,
}

/// Removes `name` from the actor's map, dropping the map once it is empty.
pub(crate) fn remove_keyed(stores: &mut BTreeMap<String, Store>, actor_id: &str, name: &str) {
    let Some(store) = stores.get_mut(actor_id) else {
        return;
    };
    store.remove(name);
    if store.is_empty() {
        stores.remove(actor_id);
    }
}
