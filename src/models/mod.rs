// Core data models for Pipetrack
// These structs represent the domain entities

pub mod lead;
pub mod activity;

pub use lead::*;
pub use activity::*;
