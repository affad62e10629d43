pub mod cli;
mod output;

pub use cli::{Cli, Commands};
pub use output::ConsoleOutput;
