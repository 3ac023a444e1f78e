//! Database layer: connection init, models, and per-table query modules

pub mod init;
pub mod models;
pub mod players;
pub mod rules;
pub mod settings;

pub use init::init_database;
