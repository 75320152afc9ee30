//! Drafter console application.
//!
//! ## Module Organization
//!
//! - `bootstrap`: Builds the store, collaborators and router from `Settings`
//! - `repl`: Line-oriented console session over the router

pub mod bootstrap;
pub mod repl;
