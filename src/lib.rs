//! An interpreter for Intcode programs.
//!
//! A program is a flat array of integers that serves as both code and data.
//! [`Vm::run`] executes it to completion against a queue of inputs;
//! [`Vm::resume`] stops instead when input runs dry, so several machines can
//! be chained by pumping one's output into another's input.

#[macro_use]
extern crate log;

pub mod memory;
pub mod vm;

pub use memory::{AddressError, Memory, ParseError, Pointer, MAX_ADDRESS};
pub use vm::{Error, ErrorKind, Instruction, Mode, Param, RunResult, State, Status, Vm};
