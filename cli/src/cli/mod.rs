pub mod args;
pub mod runner;
