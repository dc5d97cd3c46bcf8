//! Command-line driver for pxdgen.

pub mod args;
pub mod config;
pub mod driver;
pub mod fs;
pub mod parser;
pub mod reporter;

#[cfg(test)]
#[path = "tests/args_tests.rs"]
mod args_tests;
#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod config_tests;
#[cfg(test)]
#[path = "tests/fs_tests.rs"]
mod fs_tests;
#[cfg(test)]
#[path = "tests/parser_tests.rs"]
mod parser_tests;
#[cfg(test)]
#[path = "tests/reporter_tests.rs"]
mod reporter_tests;
