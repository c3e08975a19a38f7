use serde::Deserialize;

use crate::{
    error::SolverError,
    solver::{recreate::recreate_strategy::RecreateStrategy, ruin::ruin_strategy::RuinStrategy},
};

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub enum Threads {
    Single,
    Auto,
    Multi(usize),
}

impl Threads {
    pub fn number_of_threads(&self) -> usize {
        match self {
            Threads::Single => 1,
            Threads::Multi(num) => *num,
            Threads::Auto => std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LocalSearchParams {
    pub two_opt: bool,
    pub two_opt_star: bool,
    /// Enables both the intra-route and the inter-route or-opt.
    pub or_opt: bool,
    pub two_exchange: bool,
    /// Longest segment moved by or-opt.
    pub or_opt_len: usize,
    /// Longest segment swapped by 2-exchange.
    pub exchange_len: usize,
    /// Apply moves on customer sequences and electrify afterwards.
    pub aggressive: bool,
    /// Only apply moves whose electrified routes are cheaper.
    pub conservative: bool,
    pub threads: Threads,
}

impl Default for LocalSearchParams {
    fn default() -> Self {
        LocalSearchParams {
            two_opt: false,
            two_opt_star: true,
            or_opt: false,
            two_exchange: false,
            or_opt_len: 3,
            exchange_len: 2,
            aggressive: true,
            conservative: true,
            threads: Threads::Auto,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct StationParams {
    /// Runs the micro-GA next to greedy station insertion.
    pub parallel_insertion: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PerturbationParams {
    /// Consecutive non improving destroy and repair rounds before giving up. 0 disables them.
    pub escape_local_optima: usize,
    pub random_removal: bool,
    pub related_removal: bool,
    pub greedy_insertion: bool,
    pub regret_insertion: bool,
    /// Share of customers removed is drawn from `[removal_lower, removal_upper]`.
    pub removal_lower: f64,
    pub removal_upper: f64,
    /// Try a single random (destroy, repair) pair per round instead of every pair.
    pub random_combination: bool,
}

impl Default for PerturbationParams {
    fn default() -> Self {
        PerturbationParams {
            escape_local_optima: 1,
            random_removal: true,
            related_removal: true,
            greedy_insertion: true,
            regret_insertion: true,
            removal_lower: 0.2,
            removal_upper: 0.4,
            random_combination: false,
        }
    }
}

impl PerturbationParams {
    pub fn ruin_strategies(&self) -> Vec<RuinStrategy> {
        let mut strategies = Vec::with_capacity(2);
        if self.random_removal {
            strategies.push(RuinStrategy::Random);
        }
        if self.related_removal {
            strategies.push(RuinStrategy::Related);
        }
        strategies
    }

    pub fn recreate_strategies(&self) -> Vec<RecreateStrategy> {
        let mut strategies = Vec::with_capacity(2);
        if self.greedy_insertion {
            strategies.push(RecreateStrategy::Greedy);
        }
        if self.regret_insertion {
            strategies.push(RecreateStrategy::Regret);
        }
        strategies
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SolverParams {
    pub seed: u64,
    pub local_search: LocalSearchParams,
    pub station: StationParams,
    pub perturbation: PerturbationParams,
}

impl Default for SolverParams {
    fn default() -> Self {
        SolverParams {
            seed: 42,
            local_search: LocalSearchParams::default(),
            station: StationParams::default(),
            perturbation: PerturbationParams::default(),
        }
    }
}

impl SolverParams {
    /// Parses a possibly partial json configuration, missing fields take their default.
    pub fn from_json(json: &str) -> Result<Self, SolverError> {
        let params: SolverParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), SolverError> {
        let local_search = &self.local_search;
        if local_search.or_opt_len == 0 {
            return Err(SolverError::InvalidParams(
                "or_opt_len must be at least 1".to_owned(),
            ));
        }

        if local_search.exchange_len == 0 {
            return Err(SolverError::InvalidParams(
                "exchange_len must be at least 1".to_owned(),
            ));
        }

        if local_search.threads == Threads::Multi(0) {
            return Err(SolverError::InvalidParams(
                "threads must be at least 1".to_owned(),
            ));
        }

        let perturbation = &self.perturbation;
        let (lower, upper) = (perturbation.removal_lower, perturbation.removal_upper);
        if !(0.0..=1.0).contains(&lower) || !(0.0..=1.0).contains(&upper) || lower > upper {
            return Err(SolverError::InvalidParams(format!(
                "removal ratios must satisfy 0 <= lower <= upper <= 1, got [{lower}, {upper}]"
            )));
        }

        if perturbation.escape_local_optima > 0
            && (perturbation.ruin_strategies().is_empty()
                || perturbation.recreate_strategies().is_empty())
        {
            return Err(SolverError::InvalidParams(
                "escape_local_optima needs at least one removal and one insertion operator"
                    .to_owned(),
            ));
        }

        Ok(())
    }
}
