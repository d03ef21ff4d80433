pub mod accounts;
pub mod collection;
pub mod controller;
pub mod lifecycle;
pub mod position;
pub mod token;
pub mod vault;

pub use controller::*;
pub use lifecycle::{Lifecycle, ResourcePhase, Transition};
