// Host commands: always registered, independent of any cog.

pub mod admin;

pub mod help;

// Bot presence management
pub mod presence;

use crate::discord::Command;

pub fn host_commands() -> Vec<Command> {
    vec![admin::load(), admin::unload(), admin::reload(), help::help()]
}
