pub mod pool;
pub mod runner;

pub use pool::ExecutionPool;
pub use runner::Runner;
