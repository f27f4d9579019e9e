pub mod interactions;
pub mod predictions;
pub mod report;
pub mod samples;
