pub mod error;
pub mod extract;
pub mod hf;
pub mod models;
pub mod routes;
pub mod store;
pub mod templates;
