use fixedbitset::FixedBitSet;
use rand::Rng;

use crate::{
    problem::{electric_vehicle_routing_problem::ElectricVehicleRoutingProblem, node::NodeIdx},
    solver::eval::route_status::evaluate_substituting_stations,
};

const MAX_GENERATIONS: usize = 5;
const POPULATION_FACTOR: usize = 3;
const MUTATION_RATE: f64 = 0.02;
const RESET_RATE: f64 = 0.2;

#[derive(Debug, Clone, Default)]
struct Individual {
    /// One bit per gap of the customer sequence: insert the best ranked station there.
    genes: FixedBitSet,
    nodes: Vec<NodeIdx>,
    cost: f64,
}

impl Individual {
    fn reset(&mut self, dimension: usize) {
        if self.genes.len() != dimension {
            self.genes = FixedBitSet::with_capacity(dimension);
        } else {
            self.genes.clear();
        }
        self.nodes.clear();
        self.cost = f64::INFINITY;
    }

    /// Builds the node list encoded by the genes and evaluates it, swapping stations that
    /// don't work for lower ranked ones. Returns whether the result is feasible.
    fn decode(&mut self, problem: &ElectricVehicleRoutingProblem, customers: &[NodeIdx]) -> bool {
        self.nodes.clear();
        self.nodes.extend_from_slice(customers);

        for gap in (1..customers.len()).rev() {
            if !self.genes.contains(gap - 1) {
                continue;
            }

            let ranking = problem.station_ranking();
            if let Some(station) = ranking.best(self.nodes[gap - 1], self.nodes[gap]) {
                self.nodes.insert(gap, station);
            }
        }

        let evaluation = evaluate_substituting_stations(problem, &mut self.nodes, None);
        self.cost = evaluation.cost;
        evaluation.is_feasible()
    }
}

/// Micro genetic algorithm deciding, for every gap of a customer sequence at once, whether a
/// charging station goes there.
///
/// Buffers are kept between calls, one value can electrify any number of routes.
#[derive(Debug, Default)]
pub struct ParallelStationInsertion {
    population: Vec<Individual>,
    child: Individual,
}

impl ParallelStationInsertion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Best feasible electrified sequence found for `customers` and its cost, or `None` when
    /// no feasible individual could be generated.
    pub fn run<R>(
        &mut self,
        problem: &ElectricVehicleRoutingProblem,
        customers: &[NodeIdx],
        rng: &mut R,
    ) -> Option<(Vec<NodeIdx>, f64)>
    where
        R: Rng,
    {
        let dimension = customers.len().saturating_sub(1);
        if dimension == 0 {
            return None;
        }

        let population_size = dimension * POPULATION_FACTOR;
        let stall_budget = population_size * MAX_GENERATIONS;

        if self.population.len() < population_size {
            self.population
                .resize_with(population_size, Individual::default);
        }
        for individual in &mut self.population[..population_size] {
            individual.reset(dimension);
        }
        self.child.reset(dimension);

        if !self.initialize(problem, customers, population_size, stall_budget, rng) {
            return None;
        }

        for _ in 0..MAX_GENERATIONS {
            if !self.evolve(problem, customers, population_size, stall_budget, rng) {
                break;
            }
        }

        self.population[..population_size]
            .iter()
            .filter(|individual| individual.cost.is_finite())
            .min_by(|a, b| a.cost.total_cmp(&b.cost))
            .map(|best| (best.nodes.clone(), best.cost))
    }

    fn initialize<R>(
        &mut self,
        problem: &ElectricVehicleRoutingProblem,
        customers: &[NodeIdx],
        population_size: usize,
        stall_budget: usize,
        rng: &mut R,
    ) -> bool
    where
        R: Rng,
    {
        let dimension = customers.len() - 1;

        for i in 0..population_size {
            let mut attempts = 0;
            loop {
                let individual = &mut self.population[i];
                for gene in 0..dimension {
                    individual.genes.set(gene, rng.random_bool(0.5));
                }

                if individual.decode(problem, customers) {
                    break;
                }

                attempts += 1;
                if attempts > stall_budget {
                    if i == 0 {
                        return false;
                    }

                    // Fill the rest with copies of accepted individuals.
                    for k in i..population_size {
                        let source = rng.random_range(0..i);
                        let (accepted, rest) = self.population.split_at_mut(i);
                        rest[k - i].clone_from(&accepted[source]);
                    }
                    return true;
                }
            }
        }

        true
    }

    /// One generation. Returns false when no feasible child could be produced at all.
    fn evolve<R>(
        &mut self,
        problem: &ElectricVehicleRoutingProblem,
        customers: &[NodeIdx],
        population_size: usize,
        stall_budget: usize,
        rng: &mut R,
    ) -> bool
    where
        R: Rng,
    {
        let dimension = customers.len() - 1;

        for i in 0..population_size {
            let mut attempts = 0;
            loop {
                let first = rng.random_range(0..population_size);
                let mut second = rng.random_range(0..population_size - 1);
                if second >= first {
                    second += 1;
                }

                // Genes where both parents differ.
                self.child.genes.clone_from(&self.population[first].genes);
                self.child
                    .genes
                    .symmetric_difference_with(&self.population[second].genes);

                for gene in 0..dimension {
                    if rng.random_bool(MUTATION_RATE) {
                        self.child.genes.toggle(gene);
                    }
                    if self.child.genes.contains(gene) && rng.random_bool(RESET_RATE) {
                        self.child.genes.set(gene, false);
                    }
                }

                if self.child.decode(problem, customers) {
                    break;
                }

                attempts += 1;
                if attempts > stall_budget {
                    return i > 0;
                }
            }

            if self.child.cost < self.population[i].cost {
                std::mem::swap(&mut self.child, &mut self.population[i]);
            }
        }

        true
    }
}
