use rand::Rng;

use crate::{
    problem::electric_vehicle_routing_problem::ElectricVehicleRoutingProblem,
    solver::{solver_params::PerturbationParams, station::electrify::RouteElectrifier},
};

pub struct RuinContext<'a, R>
where
    R: Rng,
{
    pub params: &'a PerturbationParams,
    pub problem: &'a ElectricVehicleRoutingProblem,
    pub rng: &'a mut R,
    pub electrifier: &'a mut RouteElectrifier,
}

impl<R> RuinContext<'_, R>
where
    R: Rng,
{
    /// `round(n * U(removal_lower, removal_upper))` for `n` customers.
    pub fn draw_removal_count(&mut self, customers: usize) -> usize {
        let ratio = self
            .rng
            .random_range(self.params.removal_lower..=self.params.removal_upper);
        (customers as f64 * ratio).round() as usize
    }
}
