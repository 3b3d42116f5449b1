//! Execution pipeline stages (spec components F-K), run in sequence by `engine::Engine`.

pub mod aggregate;
pub mod fetch;
pub mod filter;
pub mod join;
pub mod project;
pub mod write;
