use fxhash::FxHashMap;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, instrument};

use crate::{
    problem::{PRECISION, electric_vehicle_routing_problem::ElectricVehicleRoutingProblem},
    solver::{
        ls::{
            r#move::{Move, MoveKind, apply_move},
            move_evaluation::{evaluate_move, evaluate_move_reconciled},
        },
        solution::{route_id::RouteIdx, solution::Solution},
        solver_params::LocalSearchParams,
        station::electrify::RouteElectrifier,
    },
};

type PairKey = (MoveKind, RouteIdx, RouteIdx);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalSearchDiscipline {
    /// Moves are selected and applied on customer sequences, touched routes are electrified
    /// afterwards. The best feasible solution met along the way is kept.
    Aggressive,
    /// Moves are electrified while being evaluated and only applied when the electrified
    /// routes are cheaper.
    Conservative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocalSearchState {
    Scanning,
    Selecting,
    Applying,
    Terminated,
}

pub struct LocalSearch<'a> {
    problem: &'a ElectricVehicleRoutingProblem,
    params: &'a LocalSearchParams,
    parallel_insertion: bool,
    pool: &'a rayon::ThreadPool,
    /// Best improving move per (kind, route pair), `None` when the pair has none.
    cache: FxHashMap<PairKey, Option<Move>>,
}

impl<'a> LocalSearch<'a> {
    pub fn new(
        problem: &'a ElectricVehicleRoutingProblem,
        params: &'a LocalSearchParams,
        parallel_insertion: bool,
        pool: &'a rayon::ThreadPool,
    ) -> Self {
        LocalSearch {
            problem,
            params,
            parallel_insertion,
            pool,
            cache: FxHashMap::default(),
        }
    }

    /// Applies best improving moves until none is left. Returns the number of applied moves.
    #[instrument(skip_all, level = "debug")]
    pub fn find_local_optima<R>(
        &mut self,
        solution: &mut Solution,
        discipline: LocalSearchDiscipline,
        rng: &mut R,
    ) -> usize
    where
        R: Rng,
    {
        self.cache.clear();

        let mut electrifier = RouteElectrifier::new(self.parallel_insertion);
        let mut best_feasible = match discipline {
            LocalSearchDiscipline::Aggressive => Some(solution.clone()),
            LocalSearchDiscipline::Conservative => None,
        };

        let mut state = LocalSearchState::Scanning;
        let mut selected: Option<(PairKey, Move)> = None;
        let mut applied = 0;

        loop {
            state = match state {
                LocalSearchState::Scanning => {
                    self.scan(solution, discipline, rng);
                    LocalSearchState::Selecting
                }
                LocalSearchState::Selecting => {
                    selected = self.select(solution);
                    if selected.is_some() {
                        LocalSearchState::Applying
                    } else {
                        LocalSearchState::Terminated
                    }
                }
                LocalSearchState::Applying => match selected.take() {
                    Some((key, mv)) => {
                        if self.apply(solution, key, &mv, discipline, &mut electrifier, rng) {
                            applied += 1;

                            if let Some(best) = best_feasible.as_mut()
                                && solution.cost() - best.cost() < -PRECISION
                            {
                                *best = solution.clone();
                            }

                            LocalSearchState::Scanning
                        } else {
                            LocalSearchState::Terminated
                        }
                    }
                    None => LocalSearchState::Terminated,
                },
                LocalSearchState::Terminated => break,
            };
        }

        if let Some(best) = best_feasible {
            *solution = best;
        }

        debug!(
            "Local search ({:?}) applied {} moves, cost {}",
            discipline,
            applied,
            solution.cost()
        );

        applied
    }

    /// Enabled (kind, pair) keys in selection order: kinds first, then pairs.
    fn keys(&self, routes: usize) -> Vec<PairKey> {
        let mut keys = Vec::new();
        for kind in MoveKind::ALL {
            if !kind.is_enabled(self.params) {
                continue;
            }

            for i in 0..routes {
                let partners = if kind.is_intra_route() {
                    i..i + 1
                } else {
                    i + 1..routes
                };

                for j in partners {
                    keys.push((kind, RouteIdx::new(i), RouteIdx::new(j)));
                }
            }
        }
        keys
    }

    /// Fills the cache for every key it does not hold yet.
    fn scan<R>(&mut self, solution: &Solution, discipline: LocalSearchDiscipline, rng: &mut R)
    where
        R: Rng,
    {
        let jobs: Vec<(PairKey, u64)> = self
            .keys(solution.len())
            .into_iter()
            .filter(|key| !self.cache.contains_key(key))
            .map(|key| (key, rng.next_u64()))
            .collect();

        if jobs.is_empty() {
            return;
        }

        let problem = self.problem;
        let params = self.params;
        let parallel_insertion = self.parallel_insertion;

        let results = self.pool.install(|| {
            jobs.par_iter()
                .map(|&(key, seed)| {
                    let mut rng = SmallRng::seed_from_u64(seed);
                    let mut electrifier = RouteElectrifier::new(parallel_insertion);
                    let best = best_move(
                        problem,
                        solution,
                        params,
                        key,
                        discipline,
                        &mut electrifier,
                        &mut rng,
                    );
                    (key, best)
                })
                .collect::<Vec<_>>()
        });

        self.cache.extend(results);
    }

    fn select(&mut self, solution: &Solution) -> Option<(PairKey, Move)> {
        let mut best_delta = 0.0;
        let mut best_key = None;

        for key in self.keys(solution.len()) {
            if let Some(Some(mv)) = self.cache.get(&key)
                && mv.delta_cost - best_delta < -PRECISION
            {
                best_delta = mv.delta_cost;
                best_key = Some(key);
            }
        }

        let key = best_key?;
        let mv = self.cache.get_mut(&key).and_then(Option::take)?;
        Some((key, mv))
    }

    fn apply<R>(
        &mut self,
        solution: &mut Solution,
        (kind, r1, r2): PairKey,
        mv: &Move,
        discipline: LocalSearchDiscipline,
        electrifier: &mut RouteElectrifier,
        rng: &mut R,
    ) -> bool
    where
        R: Rng,
    {
        debug!(
            "Apply {} ({}, {}) (d={}) {:?}",
            kind.name(),
            r1,
            r2,
            mv.delta_cost,
            mv.second
        );

        let routes_before = solution.len();
        let touched_before = mv.touched_routes();
        let touched = apply_move(self.problem, solution, mv);

        if solution.len() != routes_before {
            self.cache.clear();
        } else {
            self.cache.retain(|(_, a, b), _| {
                !touched_before.contains(a) && !touched_before.contains(b)
            });
        }

        if discipline == LocalSearchDiscipline::Aggressive {
            for route in touched {
                if !electrifier.electrify_route(self.problem, solution.route_mut(route), rng) {
                    debug!("Route {} cannot be electrified after {}", route, kind.name());
                    return false;
                }
            }
            solution.compute_cost();
        }

        true
    }
}

/// Most improving move of one kind for one route pair.
fn best_move<R>(
    problem: &ElectricVehicleRoutingProblem,
    solution: &Solution,
    params: &LocalSearchParams,
    (kind, r1, r2): PairKey,
    discipline: LocalSearchDiscipline,
    electrifier: &mut RouteElectrifier,
    rng: &mut R,
) -> Option<Move>
where
    R: Rng,
{
    let mut best: Option<Move> = None;
    let mut best_delta = 0.0;

    kind.generate_moves(problem, solution, (r1, r2), params, |mut mv| {
        match discipline {
            LocalSearchDiscipline::Aggressive => evaluate_move(problem, solution, &mut mv),
            LocalSearchDiscipline::Conservative => {
                evaluate_move_reconciled(problem, solution, &mut mv, electrifier, rng)
            }
        }

        if mv.delta_cost - best_delta < -PRECISION {
            best_delta = mv.delta_cost;
            best = Some(mv);
        }
    });

    best
}
