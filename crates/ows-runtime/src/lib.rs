mod builtins;
mod context;
mod directory;
mod engine;
mod operators;
mod outcome;
mod registry;
mod store;

pub use context::ExecutionContext;
pub use directory::{ObjectDirectory, StaticDirectory};
pub use engine::{EngineOptions, Program};
pub use outcome::{FrameExit, Jump, JumpKind, Outcome, Settled, Signal};
pub use registry::{CommandFn, CommandRegistry, CommandType};
pub use store::{RuntimeWorld, TempScope, Tier, Variable};
