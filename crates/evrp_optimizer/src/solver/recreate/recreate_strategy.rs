use std::fmt::Display;

use rand::Rng;

use crate::{error::SolverError, solver::solution::solution::Solution};

use super::{
    greedy_insertion::GreedyInsertion, recreate_context::RecreateContext,
    recreate_solution::RecreateSolution, regret_insertion::RegretInsertion,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecreateStrategy {
    Greedy,
    Regret,
}

impl Display for RecreateStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Greedy => write!(f, "GreedyInsertion"),
            Self::Regret => write!(f, "RegretInsertion"),
        }
    }
}

impl RecreateSolution for RecreateStrategy {
    fn recreate_solution<R>(
        &self,
        solution: &mut Solution,
        context: RecreateContext<R>,
    ) -> Result<(), SolverError>
    where
        R: Rng,
    {
        match self {
            RecreateStrategy::Greedy => GreedyInsertion.recreate_solution(solution, context),
            RecreateStrategy::Regret => RegretInsertion.recreate_solution(solution, context),
        }
    }
}
