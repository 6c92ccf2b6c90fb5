//! SQLite persistence for the intake service.

pub mod contacts;
pub mod db;
pub mod migrations;

pub use contacts::ContactRepository;
pub use db::Database;
