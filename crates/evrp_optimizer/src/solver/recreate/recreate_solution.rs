use rand::Rng;

use crate::{error::SolverError, solver::solution::solution::Solution};

use super::recreate_context::RecreateContext;

pub trait RecreateSolution {
    /// Inserts every unassigned customer.
    fn recreate_solution<R>(
        &self,
        solution: &mut Solution,
        context: RecreateContext<R>,
    ) -> Result<(), SolverError>
    where
        R: Rng;
}
