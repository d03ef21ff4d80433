pub mod pipeline;
pub mod state;

pub use pipeline::*;
pub use state::*;
