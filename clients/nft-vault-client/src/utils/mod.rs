pub mod token_utils;

pub use token_utils::*;
