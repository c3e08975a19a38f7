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

/// Inserts first the customer that loses the most when it does not get its best option.
///
/// The regret of a customer is the gap between its two cheapest options, a new route being
/// one of them. When no customer has a regret, the customer that is cheapest to serve alone
/// opens a new route.
pub struct RegretInsertion;

impl RegretInsertion {
    fn regret(table: &InsertionTable, slot: usize) -> f64 {
        let mut best = f64::INFINITY;
        let mut second = f64::INFINITY;

        let options = std::iter::once(table.new_route_cost(slot)).chain(
            table
                .route_insertions(slot)
                .map(|(_, insertion)| insertion.delta),
        );

        for cost in options {
            if cost < best {
                second = best;
                best = cost;
            } else if cost < second {
                second = cost;
            }
        }

        if second.is_finite() {
            second - best
        } else {
            0.0
        }
    }
}

impl RecreateSolution for RegretInsertion {
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
            let mut max_regret = 0.0;
            let mut selected = None;
            for slot in 0..table.len() {
                let regret = Self::regret(&table, slot);
                if regret - max_regret > PRECISION {
                    max_regret = regret;
                    selected = Some(slot);
                }
            }

            let (slot, target) = match selected {
                Some(slot) => (slot, table.best_target(slot).0),
                None => {
                    let mut cheapest = 0;
                    for slot in 1..table.len() {
                        if table.new_route_cost(slot) - table.new_route_cost(cheapest) < -PRECISION
                        {
                            cheapest = slot;
                        }
                    }
                    (cheapest, InsertionTarget::NewRoute)
                }
            };

            table.insert(problem, solution, slot, target, rng);
        }

        solution.compute_cost();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};

    use crate::{
        problem::{
            electric_vehicle_routing_problem::ElectricVehicleRoutingProblem, node::NodeIdx,
        },
        solver::{solution::route_id::RouteIdx, station::electrify::RouteElectrifier},
        test_utils::{TEST_DISPATCH_COST, create_line_problem, create_scenario_problem},
    };

    use super::*;

    fn recreate(
        problem: &ElectricVehicleRoutingProblem,
        solution: &mut Solution,
    ) -> Result<(), SolverError> {
        let mut electrifier = RouteElectrifier::new(false);
        let mut rng = SmallRng::seed_from_u64(0);

        RegretInsertion.recreate_solution(
            solution,
            RecreateContext {
                problem,
                rng: &mut rng,
                electrifier: &mut electrifier,
            },
        )
    }

    #[test]
    fn test_constructs_from_empty() {
        let problem = create_line_problem(3, &[], 200.0);
        let mut solution = Solution::new();

        recreate(&problem, &mut solution).unwrap();

        // several visiting orders tie on a line
        assert_eq!(solution.len(), 1);
        assert_eq!(solution.route(RouteIdx::new(0)).len(), 3);
        assert_eq!(solution.cost(), TEST_DISPATCH_COST + 60.0);
        assert!(solution.verify(&problem).is_ok());
    }

    #[test]
    fn test_inserts_station_when_needed() {
        let problem = create_scenario_problem(25.0);
        let mut solution = Solution::new();

        recreate(&problem, &mut solution).unwrap();

        assert_eq!(solution.len(), 1);
        assert!(solution.route(RouteIdx::new(0)).contains_station());
        assert_eq!(solution.cost(), TEST_DISPATCH_COST + 40.0);
        assert!(solution.verify(&problem).is_ok());
    }

    #[test]
    fn test_unservable_customer_is_an_error() {
        let problem = create_line_problem(2, &[(500.0, 500.0)], 25.0);
        let mut solution = Solution::new();

        let result = recreate(&problem, &mut solution);

        assert!(matches!(
            result,
            Err(SolverError::InfeasibleSingleCustomerRoute(customer)) if customer == NodeIdx::new(2)
        ));
    }
}
