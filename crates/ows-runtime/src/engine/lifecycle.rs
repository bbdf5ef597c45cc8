use ows_core::{Entity, ObjectRef, ATTACHED_ENTITY_VARIABLE};
use tracing::instrument;

use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Tail calls and jumps followed for a single line before giving up.
    pub max_tail_calls: usize,
    /// Nested GO-TO/DO frames.
    pub max_frame_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_tail_calls: 10_000,
            max_frame_depth: 256,
        }
    }
}

/// A compiled script bound to its command registry and variable stores.
pub struct Program {
    pub(super) compiled: Rc<CompiledProgram>,
    pub(super) registry: Arc<CommandRegistry>,
    pub(super) world: RuntimeWorld,
    pub(super) directory: Arc<dyn ObjectDirectory>,
    pub(super) options: EngineOptions,
    pub(super) stores: RefCell<ProgramStores>,
}

impl Program {
    pub fn new(
        compiled: Rc<CompiledProgram>,
        registry: Arc<CommandRegistry>,
        world: RuntimeWorld,
        directory: Arc<dyn ObjectDirectory>,
        options: EngineOptions,
    ) -> Self {
        Self {
            compiled,
            registry,
            world,
            directory,
            options,
            stores: RefCell::new(ProgramStores::default()),
        }
    }

    pub fn compiled(&self) -> &CompiledProgram {
        &self.compiled
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn world(&self) -> &RuntimeWorld {
        &self.world
    }

    pub fn directory(&self) -> &dyn ObjectDirectory {
        self.directory.as_ref()
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Runs from `start_label` (or START) on behalf of `actor`. Host bindings
    /// land in the temp scope of the first frame.
    #[instrument(skip_all, fields(actor = %actor.id))]
    pub fn run(
        &self,
        actor: &Character,
        start_label: Option<&str>,
        bindings: Option<BTreeMap<String, OwsValue>>,
    ) -> Result<Option<OwsValue>, OwsError> {
        let scope = TempScope::new();
        for (name, value) in bindings.unwrap_or_default() {
            let name = name.to_uppercase();
            self.assign(Tier::Temp, &name, value, &actor.id, &scope)?;
        }
        self.run_in_scope(actor, start_label, scope)
    }

    /// Like [`Program::run`], with the entity the script is attached to bound
    /// as `ENTITY-THIS-SCRIPT-IS-ATTACHED-TO`.
    pub fn run_from_entity(
        &self,
        entity: &Entity,
        actor: &Character,
        bindings: Option<BTreeMap<String, OwsValue>>,
        start_label: Option<&str>,
    ) -> Result<Option<OwsValue>, OwsError> {
        let mut bindings = bindings.unwrap_or_default();
        bindings.insert(
            ATTACHED_ENTITY_VARIABLE.to_string(),
            OwsValue::Object(ObjectRef::Entity(entity.clone())),
        );
        self.run(actor, start_label, Some(bindings))
    }

    fn run_in_scope(
        &self,
        actor: &Character,
        start_label: Option<&str>,
        scope: TempScope,
    ) -> Result<Option<OwsValue>, OwsError> {
        let start = match start_label {
            Some(label) => match self.compiled.label_line(&label.to_uppercase()) {
                Some(line) => line,
                None => {
                    debug!(label, "unknown start label, running from START");
                    self.compiled.start_line
                }
            },
            None => self.compiled.start_line,
        };

        let exit = self.run_frame(start, None, scope, actor, 0)?;
        let result = match exit {
            FrameExit::Ended | FrameExit::WentBack => None,
            FrameExit::Returned(value) | FrameExit::ReturnedAll(value) => {
                (!value.is_unit()).then_some(value)
            }
            FrameExit::Completed(value) => value,
        };
        Ok(result)
    }

    pub fn program_variable(&self, name: &str) -> Option<OwsValue> {
        self.stores
            .borrow()
            .program
            .get(name)
            .map(|variable| variable.borrow().clone())
    }

    pub fn local_variable(&self, character_id: &str, name: &str) -> Option<OwsValue> {
        self.stores
            .borrow()
            .character_locals
            .get(character_id)
            .and_then(|store| store.get(name))
            .map(|variable| variable.borrow().clone())
    }

    /// What `name` resolves to for `actor` outside of any run.
    pub fn variable(&self, actor: &Character, name: &str) -> Option<OwsValue> {
        self.lookup(name, &actor.id, &TempScope::new())
            .map(|variable| variable.borrow().clone())
    }
}
