pub mod electrify;
pub mod improvement;
pub mod parallel_insertion;
pub mod sequential_insertion;
