pub mod analyze;
pub mod export;
pub mod prune;
pub mod report;
pub mod run;
pub mod stats;
