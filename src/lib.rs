pub mod cli;
pub mod domain;
pub mod parsing;
pub mod plugin;
pub mod query;
pub mod reporting;
pub mod storage;
