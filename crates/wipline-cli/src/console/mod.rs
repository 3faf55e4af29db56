//! Terminal front end for the work-in-progress renderer

pub mod app;
pub mod demo;
pub mod replay;
pub mod sink;
pub mod terminal;

pub use app::Source;
