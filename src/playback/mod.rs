pub mod action;
pub mod countdown;
pub mod engine;
pub mod executor;
pub mod snapshot;
pub mod state;
