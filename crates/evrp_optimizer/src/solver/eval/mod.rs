pub mod node_sequence;
pub mod route_status;
