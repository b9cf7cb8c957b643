// lib/src/query_exec_engine/mod.rs

pub mod query_exec_engine;

pub use query_exec_engine::{Outcome, QueryExecEngine};
