pub mod config;
pub mod presenter;

pub use presenter::Emitter;
