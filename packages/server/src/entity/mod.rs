pub mod blob;
pub mod file;
pub mod folder;
pub mod share;
pub mod user;
