pub mod schema;
pub mod store;

pub use store::{InsertStatus, Store};
