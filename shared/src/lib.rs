pub mod config;
pub mod database;
pub mod entity;
pub mod store;

pub use config::Config;
pub use database::get_db_connection;
pub use store::SeaOrmStore;
