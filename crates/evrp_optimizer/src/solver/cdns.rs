use rand::Rng;
use tracing::{debug, info, instrument};

use crate::{
    error::SolverError,
    problem::{PRECISION, electric_vehicle_routing_problem::ElectricVehicleRoutingProblem},
    solver::{
        ls::local_search::{LocalSearch, LocalSearchDiscipline},
        recreate::{
            recreate_context::RecreateContext, recreate_solution::RecreateSolution,
            recreate_strategy::RecreateStrategy,
        },
        ruin::{ruin_context::RuinContext, ruin_solution::RuinSolution, ruin_strategy::RuinStrategy},
        solution::solution::Solution,
        solver_params::SolverParams,
        station::electrify::RouteElectrifier,
    },
};

/// Cross-domain neighbourhood search: alternates between the customer domain (local search
/// on station free sequences) and the station domain (electrification), escaping local
/// optima with destroy and repair rounds.
///
/// Relies on removing the stations of a feasible solution leaving a feasible station free
/// problem: every route keeps its customer sequence and only its stations are recomputed.
pub struct CrossDomainSearch<'a> {
    problem: &'a ElectricVehicleRoutingProblem,
    params: &'a SolverParams,
    pool: &'a rayon::ThreadPool,
    electrifier: RouteElectrifier,
}

impl<'a> CrossDomainSearch<'a> {
    pub fn new(
        problem: &'a ElectricVehicleRoutingProblem,
        params: &'a SolverParams,
        pool: &'a rayon::ThreadPool,
    ) -> Self {
        CrossDomainSearch {
            problem,
            params,
            pool,
            electrifier: RouteElectrifier::new(params.station.parallel_insertion),
        }
    }

    #[instrument(skip_all, level = "debug")]
    pub fn run<R>(&mut self, solution: &mut Solution, rng: &mut R) -> Result<(), SolverError>
    where
        R: Rng,
    {
        self.descend(solution, rng);
        info!("Local optimum: {} routes, cost {}", solution.len(), solution.cost());

        let params = self.params;
        let perturbation = &params.perturbation;
        let ruins = perturbation.ruin_strategies();
        let recreates = perturbation.recreate_strategies();
        if ruins.is_empty() || recreates.is_empty() {
            return Ok(());
        }

        let mut no_improvement = 0;
        while no_improvement < perturbation.escape_local_optima {
            let combinations: Vec<(RuinStrategy, RecreateStrategy)> =
                if perturbation.random_combination {
                    vec![(
                        ruins[rng.random_range(0..ruins.len())],
                        recreates[rng.random_range(0..recreates.len())],
                    )]
                } else {
                    ruins
                        .iter()
                        .flat_map(|&ruin| recreates.iter().map(move |&recreate| (ruin, recreate)))
                        .collect()
                };

            let mut best: Option<Solution> = None;
            for (ruin, recreate) in combinations {
                let candidate = self.perturb(solution, ruin, recreate, rng)?;
                debug!("{} + {}: cost {}", ruin, recreate, candidate.cost());

                if best
                    .as_ref()
                    .is_none_or(|best| candidate.cost() - best.cost() < -PRECISION)
                {
                    best = Some(candidate);
                }
            }

            match best {
                Some(best) if best.cost() - solution.cost() < -PRECISION => {
                    info!(
                        "Escaped local optimum: cost {} -> {}",
                        solution.cost(),
                        best.cost()
                    );
                    *solution = best;
                    no_improvement = 0;
                }
                _ => no_improvement += 1,
            }
        }

        Ok(())
    }

    /// Destroys and repairs a copy of `solution`, then descends from it.
    fn perturb<R>(
        &mut self,
        solution: &Solution,
        ruin: RuinStrategy,
        recreate: RecreateStrategy,
        rng: &mut R,
    ) -> Result<Solution, SolverError>
    where
        R: Rng,
    {
        let mut candidate = solution.clone();

        ruin.ruin_solution(
            &mut candidate,
            RuinContext {
                params: &self.params.perturbation,
                problem: self.problem,
                rng: &mut *rng,
                electrifier: &mut self.electrifier,
            },
        );

        recreate.recreate_solution(
            &mut candidate,
            RecreateContext {
                problem: self.problem,
                rng: &mut *rng,
                electrifier: &mut self.electrifier,
            },
        )?;

        self.descend(&mut candidate, rng);
        Ok(candidate)
    }

    /// Re-electrification followed by the enabled local search disciplines.
    fn descend<R>(&mut self, solution: &mut Solution, rng: &mut R)
    where
        R: Rng,
    {
        self.reelectrify(solution, rng);

        let local_search_params = &self.params.local_search;
        let mut local_search = LocalSearch::new(
            self.problem,
            local_search_params,
            self.params.station.parallel_insertion,
            self.pool,
        );

        if local_search_params.aggressive {
            local_search.find_local_optima(solution, LocalSearchDiscipline::Aggressive, rng);
        }

        if local_search_params.conservative {
            local_search.find_local_optima(solution, LocalSearchDiscipline::Conservative, rng);
        }

        solution.compute_cost();
    }

    /// Recomputes the stations of every route from its customers, keeping the result only
    /// when every route succeeds and the total is cheaper.
    fn reelectrify<R>(&mut self, solution: &mut Solution, rng: &mut R)
    where
        R: Rng,
    {
        let mut electrified = solution.clone();
        for index in 0..electrified.len() {
            if !self
                .electrifier
                .electrify_route(self.problem, electrified.route_mut(index.into()), rng)
            {
                return;
            }
        }

        if electrified.compute_cost() - solution.cost() < -PRECISION {
            debug!(
                "Re-electrification: cost {} -> {}",
                solution.cost(),
                electrified.cost()
            );
            *solution = electrified;
        }
    }
}
