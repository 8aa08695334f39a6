pub mod bench;
pub mod common;
pub mod em;
pub mod error;
pub mod hmm;
pub mod registry;
pub mod utils;
pub mod verify;

#[cfg(test)]
#[macro_use]
extern crate approx;
