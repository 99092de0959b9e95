pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod storage;
pub mod types;
