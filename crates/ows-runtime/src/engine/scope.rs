use ows_core::{is_reserved_keyword, CommandCatalog};

use crate::store::{new_variable, remove_keyed};

use super::*;

impl Program {
    /// First match wins: temp, character-local, character-global, program, world.
    pub(crate) fn lookup(&self, name: &str, actor_id: &str, scope: &TempScope) -> Option<Variable> {
        if let Some(variable) = scope.get(name) {
            return Some(variable);
        }
        if let Some(variable) = self.stored_variable(Tier::CharacterLocal, name, actor_id) {
            return Some(variable);
        }
        if let Some(variable) = self.stored_variable(Tier::CharacterGlobal, name, actor_id) {
            return Some(variable);
        }
        if let Some(variable) = self.stored_variable(Tier::Program, name, actor_id) {
            return Some(variable);
        }
        self.stored_variable(Tier::World, name, actor_id)
    }

    fn stored_variable(&self, tier: Tier, name: &str, actor_id: &str) -> Option<Variable> {
        match tier {
            Tier::Temp => None,
            Tier::CharacterLocal => self
                .stores
                .borrow()
                .character_locals
                .get(actor_id)
                .and_then(|store| store.get(name))
                .cloned(),
            Tier::CharacterGlobal => self
                .world
                .stores()
                .borrow()
                .character_globals
                .get(actor_id)
                .and_then(|store| store.get(name))
                .cloned(),
            Tier::Program => self.stores.borrow().program.get(name).cloned(),
            Tier::World => self.world.stores().borrow().world.get(name).cloned(),
        }
    }

    /// Writes `value` under `name` in `tier`. An existing name in the same tier
    /// is updated in place; a new name is checked against the other tiers first.
    pub(crate) fn assign(
        &self,
        tier: Tier,
        name: &str,
        value: OwsValue,
        actor_id: &str,
        scope: &TempScope,
    ) -> Result<(), OwsError> {
        let existing = match tier {
            Tier::Temp => scope.get(name),
            _ => self.stored_variable(tier, name, actor_id),
        };
        if let Some(variable) = existing {
            *variable.borrow_mut() = value;
            return Ok(());
        }

        self.check_new_name(tier, name)?;
        let variable = new_variable(value);
        match tier {
            Tier::Temp => scope.bind(name, variable),
            Tier::CharacterLocal => {
                self.stores
                    .borrow_mut()
                    .character_locals
                    .entry(actor_id.to_string())
                    .or_default()
                    .insert(name.to_string(), variable);
            }
            Tier::CharacterGlobal => {
                self.world
                    .stores()
                    .borrow_mut()
                    .character_globals
                    .entry(actor_id.to_string())
                    .or_default()
                    .insert(name.to_string(), variable);
            }
            Tier::Program => {
                self.stores
                    .borrow_mut()
                    .program
                    .insert(name.to_string(), variable);
            }
            Tier::World => {
                self.world
                    .stores()
                    .borrow_mut()
                    .world
                    .insert(name.to_string(), variable);
            }
        }
        trace!(name, tier = tier.name(), actor_id, "new variable");
        Ok(())
    }

    /// Removing a name that is not set does nothing.
    pub(crate) fn unassign(&self, tier: Tier, name: &str, actor_id: &str, scope: &TempScope) {
        match tier {
            Tier::Temp => {
                scope.remove(name);
            }
            Tier::CharacterLocal => {
                remove_keyed(&mut self.stores.borrow_mut().character_locals, actor_id, name)
            }
            Tier::CharacterGlobal => remove_keyed(
                &mut self.world.stores().borrow_mut().character_globals,
                actor_id,
                name,
            ),
            Tier::Program => {
                self.stores.borrow_mut().program.remove(name);
            }
            Tier::World => {
                self.world.stores().borrow_mut().world.remove(name);
            }
        }
    }

    fn check_new_name(&self, tier: Tier, name: &str) -> Result<(), OwsError> {
        if self.registry.contains(name) {
            return Err(OwsError::new(
                "ENGINE_NAME_CONFLICT",
                format!("{} is a command name and cannot name a variable.", name),
            ));
        }
        if is_reserved_keyword(name) {
            return Err(OwsError::new(
                "ENGINE_RESERVED_NAME",
                format!("{} is a reserved keyword and cannot name a variable.", name),
            ));
        }

        let world = self.world.stores().borrow();
        let stores = self.stores.borrow();
        let in_world = world.world.contains_key(name);
        let in_program = stores.program.contains_key(name);
        let in_characters = || {
            world
                .character_globals
                .values()
                .chain(stores.character_locals.values())
                .any(|store| store.contains_key(name))
        };
        let conflict = match tier {
            Tier::Temp => None,
            Tier::CharacterLocal | Tier::CharacterGlobal => {
                if in_world {
                    Some(Tier::World)
                } else if in_program {
                    Some(Tier::Program)
                } else {
                    None
                }
            }
            Tier::Program => {
                if in_world {
                    Some(Tier::World)
                } else if in_characters() {
                    Some(Tier::CharacterGlobal)
                } else {
                    None
                }
            }
            Tier::World => {
                if in_program {
                    Some(Tier::Program)
                } else if in_characters() {
                    Some(Tier::CharacterGlobal)
                } else {
                    None
                }
            }
        };
        match conflict {
            Some(existing) => Err(OwsError::new(
                "ENGINE_NAME_CONFLICT",
                format!(
                    "Cannot create {} variable {}: a {} variable already uses that name.",
                    tier.name(),
                    name,
                    existing.name()
                ),
            )),
            None => Ok(()),
        }
    }
}
