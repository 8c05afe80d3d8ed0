//! CLI command implementations.

pub mod dump;
pub mod inspect;
pub mod migrate;
pub mod rebuild_index;
pub mod verify;
