pub mod inter_or_opt;
pub mod local_search;
pub mod r#move;
pub mod move_evaluation;
pub mod or_opt;
pub mod two_exchange;
pub mod two_opt;
pub mod two_opt_star;
