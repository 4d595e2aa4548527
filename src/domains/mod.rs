pub mod character;
pub mod chat;
pub mod memory;
pub mod relationship;
