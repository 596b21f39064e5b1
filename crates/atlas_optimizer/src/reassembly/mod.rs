pub mod cumulated;
pub mod density_repair;
pub mod merge;
