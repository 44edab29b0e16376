pub mod backend;
pub mod config;
pub mod document;
pub mod error;
pub mod labels;
pub mod logging;
pub mod workspace;
