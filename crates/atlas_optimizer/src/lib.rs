pub mod clustering;
pub mod geometry;
pub mod job_manager;
pub mod partition;
pub mod pipeline;
pub mod problem;
pub mod reassembly;
pub mod solution;
pub mod wrappers;

#[cfg(test)]
pub(crate) mod test_utils;
