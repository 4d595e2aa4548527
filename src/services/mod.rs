pub mod chat;
pub mod classifier;
pub mod keywords;
pub mod memory;
pub mod parse;
pub mod prompt;
pub mod relationship;
pub mod selector;
