use thiserror::Error;

use crate::{
    problem::node::NodeIdx,
    solver::{eval::route_status::Feasibility, solution::route_id::RouteIdx},
};

/// Rejected instance data.
#[derive(Debug, Error, PartialEq)]
pub enum ProblemError {
    #[error("Problem has no depot")]
    MissingDepot,
    #[error("Problem has more than one depot: {0} and {1}")]
    MultipleDepots(NodeIdx, NodeIdx),
    #[error("Travel matrices cover {matrices} nodes but the problem has {nodes}")]
    MatrixSizeMismatch { nodes: usize, matrices: usize },
    #[error("Node {0} has an inverted time window [{1}, {2}]")]
    InvalidTimeWindow(NodeIdx, f64, f64),
    #[error("Node {0} has a negative demand")]
    NegativeDemand(NodeIdx),
    #[error("Invalid vehicle parameter {name}: {value}")]
    InvalidVehicle { name: &'static str, value: f64 },
}

#[derive(Debug, Error)]
pub enum SolverError {
    /// A customer served alone cannot satisfy the constraints, the instance is broken.
    #[error("Single-customer route [depot, {0}, depot] is infeasible")]
    InfeasibleSingleCustomerRoute(NodeIdx),
    #[error("Invalid solver parameter: {0}")]
    InvalidParams(String),
    #[error("Invalid solver parameters json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Cannot build the local search thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("Solution verification failed: {0}")]
    Verification(#[from] VerificationError),
}

/// A solution that breaks a structural invariant.
#[derive(Debug, Error, PartialEq)]
pub enum VerificationError {
    #[error("Route {route} is infeasible ({feasibility:?})")]
    InfeasibleRoute {
        route: RouteIdx,
        feasibility: Feasibility,
    },
    #[error("Route {route} caches cost {cached} but costs {actual}")]
    StaleRouteCost {
        route: RouteIdx,
        cached: f64,
        actual: f64,
    },
    #[error("Customer {customer} is visited {visits} times")]
    CustomerVisits { customer: NodeIdx, visits: usize },
}
