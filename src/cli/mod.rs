pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{BuildArgs, CliArgs, ClassifyArgs, Commands, ConfigArgs, ScanArgs};
pub use output::{OutputFormat, OutputFormatter};
