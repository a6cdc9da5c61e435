pub mod batch;
pub mod cli;
pub mod config;
pub mod crop;
pub mod engine;
pub mod error;
pub mod layout;
pub mod logging;
pub mod pipeline;
pub mod postprocess;
pub mod report;
pub mod util;
