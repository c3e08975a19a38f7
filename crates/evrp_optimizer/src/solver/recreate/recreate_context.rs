use rand::Rng;

use crate::{
    problem::electric_vehicle_routing_problem::ElectricVehicleRoutingProblem,
    solver::station::electrify::RouteElectrifier,
};

pub struct RecreateContext<'a, R>
where
    R: Rng,
{
    pub problem: &'a ElectricVehicleRoutingProblem,
    pub rng: &'a mut R,
    pub electrifier: &'a mut RouteElectrifier,
}
