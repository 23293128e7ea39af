mod command;
pub mod keymap;

pub use command::{Command, WriteMode};
pub use keymap::{bindings, resolve_key, Platform};
