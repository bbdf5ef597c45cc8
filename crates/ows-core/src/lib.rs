pub mod error;
pub mod ir;
pub mod program;
pub mod types;
pub mod value;

pub use error::{ErrorKind, OwsError};
pub use ir::*;
pub use program::{CompiledLine, CompiledProgram};
pub use types::*;
pub use value::*;
