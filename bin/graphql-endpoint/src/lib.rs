#![deny(unused_crate_dependencies)]

pub mod cli;
pub mod schema;
