pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod io;
pub mod manifest;
pub mod persona;
pub mod registration;
pub mod runner;
pub mod scheduler;
pub mod service;

#[cfg(test)]
mod testing;

pub use error::{FleetError, Result};
