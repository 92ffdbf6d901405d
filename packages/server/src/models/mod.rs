pub mod file;
pub mod folder;
pub mod public;
pub mod share;
pub mod shared;
