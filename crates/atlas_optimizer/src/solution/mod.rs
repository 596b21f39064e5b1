pub mod cost_details;
pub mod progress;
pub mod route;
pub mod solution;
pub mod step;
