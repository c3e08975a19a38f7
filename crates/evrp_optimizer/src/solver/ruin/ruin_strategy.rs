use std::fmt::Display;

use rand::Rng;

use crate::solver::solution::solution::Solution;

use super::{
    ruin_context::RuinContext, ruin_random::RuinRandom, ruin_related::RuinRelated,
    ruin_solution::RuinSolution,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuinStrategy {
    Random,
    Related,
}

impl Display for RuinStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Random => write!(f, "RandomRemoval"),
            Self::Related => write!(f, "RelatedRemoval"),
        }
    }
}

impl RuinSolution for RuinStrategy {
    fn ruin_solution<R>(&self, solution: &mut Solution, context: RuinContext<R>)
    where
        R: Rng,
    {
        match self {
            RuinStrategy::Random => RuinRandom.ruin_solution(solution, context),
            RuinStrategy::Related => RuinRelated.ruin_solution(solution, context),
        }
    }
}
