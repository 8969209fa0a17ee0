#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod bitpack;
pub mod bytecode;
pub mod error;
pub mod register;
pub mod segment;
pub mod symboltable;
pub mod uvm;

pub use error::UmError;
pub use uvm::{Status, UVM};
