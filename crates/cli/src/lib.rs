//! FuelEU CLI - command orchestration over the compliance engine

pub mod commands;
pub mod context;

pub use context::AppContext;
