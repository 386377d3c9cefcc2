//! CLI subcommands.

pub mod cart;
pub mod products;
mod render;
