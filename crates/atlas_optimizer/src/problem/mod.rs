pub mod configuration;
pub mod initial_route;
pub mod location;
pub mod matrix;
pub mod point;
pub mod relation;
pub mod service;
pub mod shipment;
pub mod time_window;
pub mod unit;
pub mod vehicle;
pub mod vehicle_routing_problem;
pub mod work_item;
