pub mod cdns;
pub mod eval;
pub mod ls;
pub mod recreate;
pub mod ruin;
pub mod solution;
pub mod solver;
pub mod solver_params;
pub mod station;
