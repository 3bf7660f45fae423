pub mod lead;
pub mod board;
pub mod activity;

pub use lead::*;
pub use board::*;
pub use activity::*;
