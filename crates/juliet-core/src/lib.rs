pub mod config;
pub mod corpus;
pub mod engine;
pub mod errors;
pub mod fingerprint;
pub mod model;
pub mod report;
pub mod storage;
pub mod tools;
