pub mod electric_vehicle_routing_problem;
pub mod location;
pub mod node;
pub mod promise_matrix;
pub mod relatedness;
pub mod station_ranking;
pub mod travel_matrices;
pub mod vehicle;

/// Tolerance for every floating-point comparison done by the solver.
pub const PRECISION: f64 = 0.001;
