pub mod access;
pub mod cache;
pub mod config;
pub mod error;
pub mod live;
pub mod loan;
pub mod schema;
pub mod store;
pub mod summary;
pub mod tracker;
pub mod translate;

pub use error::{Error, Result};
