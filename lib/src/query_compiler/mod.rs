// lib/src/query_compiler/mod.rs

pub mod compiler;
pub mod operation;
pub mod requests;

pub use compiler::compile;
pub use operation::{Clear, CompiledOperation, Filter, Projection, Target, Update, UpsertOptions};
pub use requests::{find_descriptor, get_descriptor, peek_descriptor, remove_descriptor, set_descriptor};
