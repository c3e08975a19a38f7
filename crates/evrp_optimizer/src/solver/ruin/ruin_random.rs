use rand::{Rng, seq::SliceRandom};

use crate::solver::solution::solution::Solution;

use super::{
    ruin_context::RuinContext,
    ruin_solution::{RuinSolution, remove_customers},
};

/// Removes `round(n * U(lower, upper)) + 1` customers picked uniformly.
pub struct RuinRandom;

impl RuinSolution for RuinRandom {
    fn ruin_solution<R>(&self, solution: &mut Solution, mut context: RuinContext<R>)
    where
        R: Rng,
    {
        let problem = context.problem;
        let mut customers = problem.customers().to_vec();
        if customers.is_empty() {
            return;
        }

        customers.shuffle(context.rng);
        let count = (context.draw_removal_count(customers.len()) + 1).min(customers.len());

        let mut removed = vec![false; problem.num_nodes()];
        for customer in &customers[..count] {
            removed[customer.get()] = true;
        }

        remove_customers(problem, solution, &removed, context.electrifier, context.rng);
    }
}
