#![warn(clippy::all)]

#[macro_use]
extern crate nom;
#[macro_use]
extern crate serde_derive;

pub mod extract;
pub mod features;
pub mod hypergraph;
pub mod util;
pub mod vocabulary;
