use rand::Rng;

use crate::{
    error::SolverError,
    problem::PRECISION,
    solver::{
        recreate::insertion_table::{InsertionTable, InsertionTarget},
        solution::solution::Solution,
    },
};

use super::{recreate_context::RecreateContext, recreate_solution::RecreateSolution};

/// Repeatedly inserts the customer whose cheapest insertion is the cheapest overall.
pub struct GreedyInsertion;

impl RecreateSolution for GreedyInsertion {
    fn recreate_solution<R>(
        &self,
        solution: &mut Solution,
        RecreateContext {
            problem,
            rng,
            electrifier,
        }: RecreateContext<R>,
    ) -> Result<(), SolverError>
    where
        R: Rng,
    {
        let customers = solution.unassigned_customers(problem);
        let mut table = InsertionTable::new(problem, solution, customers, electrifier, rng)?;

        while !table.is_empty() {
            let mut best: Option<(usize, InsertionTarget, f64)> = None;
            for slot in 0..table.len() {
                let (target, cost) = table.best_target(slot);
                if best.is_none_or(|(_, _, best_cost)| cost - best_cost < -PRECISION) {
                    best = Some((slot, target, cost));
                }
            }

            let Some((slot, target, _)) = best else {
                break;
            };

            table.insert(problem, solution, slot, target, rng);
        }

        solution.compute_cost();
        Ok(())
    }
}
