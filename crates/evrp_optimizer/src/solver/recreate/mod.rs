pub mod greedy_insertion;
pub mod insertion_table;
pub mod recreate_context;
pub mod recreate_solution;
pub mod recreate_strategy;
pub mod regret_insertion;
