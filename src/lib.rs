pub mod cli;
pub mod data;
pub mod job;
pub mod optimizer;
pub mod parallel;
