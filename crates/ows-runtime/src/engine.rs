use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use ows_core::{Character, CompiledProgram, OwsError, OwsValue};
use tracing::{debug, trace};

use crate::context::ExecutionContext;
use crate::directory::ObjectDirectory;
use crate::outcome::{FrameExit, Settled, Signal};
use crate::registry::CommandRegistry;
use crate::store::{ProgramStores, RuntimeWorld, TempScope, Tier, Variable};

mod frame;
mod lifecycle;
mod scope;

pub use lifecycle::{EngineOptions, Program};
