pub mod cli;
pub mod logger;
pub mod style;
