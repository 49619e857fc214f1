#![cfg_attr(not(test), no_std)]

mod ast;
mod config;
mod error;
pub mod lexer;
mod machine;
mod parser;
pub mod planner;
mod segment;
mod stepper;
pub mod stepper_math;
mod xyz;

#[cfg(test)]
mod mocks;

pub use ast::*;
pub use config::MachineConfig;
pub use error::*;
pub use machine::{Machine, Outcome, Spindle};
pub use parser::parse;
pub use planner::{MovePlan, MoveReport};
pub use segment::{MotionSegment, MotionWindow};
pub use stepper::{Direction, Stepper, Steppers, Transport};
pub use xyz::*;
