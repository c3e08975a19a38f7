use smallvec::SmallVec;

use crate::{
    problem::{electric_vehicle_routing_problem::ElectricVehicleRoutingProblem, node::NodeIdx},
    solver::{
        ls::{
            inter_or_opt::InterOrOptOperator, or_opt::OrOptOperator,
            two_exchange::TwoExchangeOperator, two_opt::TwoOptOperator,
            two_opt_star::TwoOptStarOperator,
        },
        solution::{route::Route, route_id::RouteIdx, solution::Solution},
        solver_params::LocalSearchParams,
    },
};

/// Enumerates the moves of one neighbourhood for a pair of routes.
///
/// Intra-route operators only produce moves when `r1 == r2`, inter-route operators only when
/// `r1 != r2`. Positions refer to the customer sequences of the routes.
pub trait LocalSearchOperator {
    const KIND: MoveKind;

    fn generate_moves<C>(
        problem: &ElectricVehicleRoutingProblem,
        solution: &Solution,
        pair: (RouteIdx, RouteIdx),
        params: &LocalSearchParams,
        consumer: C,
    ) where
        C: FnMut(Move);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MoveKind {
    /// Swaps two consecutive customers of a route.
    TwoOpt,
    /// Exchanges the tails of two routes.
    TwoOptStar,
    /// Moves a segment elsewhere in its route or into a new route.
    OrOpt,
    /// Moves a segment of a route into another route.
    InterOrOpt,
    /// Swaps a segment of a route with a segment of another route.
    TwoExchange,
}

impl MoveKind {
    pub const ALL: [MoveKind; 5] = [
        MoveKind::TwoOpt,
        MoveKind::TwoOptStar,
        MoveKind::OrOpt,
        MoveKind::InterOrOpt,
        MoveKind::TwoExchange,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MoveKind::TwoOpt => "2-Opt",
            MoveKind::TwoOptStar => "2-Opt*",
            MoveKind::OrOpt => "Or-Opt",
            MoveKind::InterOrOpt => "Inter Or-Opt",
            MoveKind::TwoExchange => "2-Exchange",
        }
    }

    pub fn is_intra_route(&self) -> bool {
        matches!(self, MoveKind::TwoOpt | MoveKind::OrOpt)
    }

    pub fn is_enabled(&self, params: &LocalSearchParams) -> bool {
        match self {
            MoveKind::TwoOpt => params.two_opt,
            MoveKind::TwoOptStar => params.two_opt_star,
            MoveKind::OrOpt | MoveKind::InterOrOpt => params.or_opt,
            MoveKind::TwoExchange => params.two_exchange,
        }
    }

    pub fn generate_moves<C>(
        &self,
        problem: &ElectricVehicleRoutingProblem,
        solution: &Solution,
        pair: (RouteIdx, RouteIdx),
        params: &LocalSearchParams,
        consumer: C,
    ) where
        C: FnMut(Move),
    {
        match self {
            MoveKind::TwoOpt => {
                TwoOptOperator::generate_moves(problem, solution, pair, params, consumer)
            }
            MoveKind::TwoOptStar => {
                TwoOptStarOperator::generate_moves(problem, solution, pair, params, consumer)
            }
            MoveKind::OrOpt => {
                OrOptOperator::generate_moves(problem, solution, pair, params, consumer)
            }
            MoveKind::InterOrOpt => {
                InterOrOptOperator::generate_moves(problem, solution, pair, params, consumer)
            }
            MoveKind::TwoExchange => {
                TwoExchangeOperator::generate_moves(problem, solution, pair, params, consumer)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentSource {
    Route(RouteIdx),
    /// A lone depot visit, used to open and close new routes.
    Depot,
}

/// Positions `start..=end` of a route's customer sequence, walked backwards when
/// `start > end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub source: SegmentSource,
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn new(route: RouteIdx, start: usize, end: usize) -> Self {
        Segment {
            source: SegmentSource::Route(route),
            start,
            end,
        }
    }

    pub fn depot() -> Self {
        Segment {
            source: SegmentSource::Depot,
            start: 0,
            end: 0,
        }
    }

    fn extend_into(
        &self,
        problem: &ElectricVehicleRoutingProblem,
        solution: &Solution,
        nodes: &mut Vec<NodeIdx>,
    ) {
        match self.source {
            SegmentSource::Depot => nodes.push(problem.depot()),
            SegmentSource::Route(route) => {
                let customers = solution.route(route).customers();
                if self.start <= self.end {
                    nodes.extend_from_slice(&customers[self.start..=self.end]);
                } else {
                    nodes.extend(customers[self.end..=self.start].iter().rev());
                }
            }
        }
    }
}

pub type Segments = SmallVec<[Segment; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    Existing(RouteIdx),
    New,
}

/// A local search move: the new customer sequences of at most two routes, described as
/// concatenations of segments of the current sequences.
#[derive(Debug, Clone)]
pub struct Move {
    pub kind: MoveKind,
    pub first: RouteIdx,
    pub second: Option<RouteTarget>,
    pub first_segments: Segments,
    pub second_segments: Segments,
    pub delta_cost: f64,
    /// Electrified routes computed while evaluating the move, `[first, second]`.
    pub reconciled: Option<Vec<Route>>,
}

impl Move {
    pub fn intra_route(kind: MoveKind, route: RouteIdx, segments: Segments) -> Self {
        Move {
            kind,
            first: route,
            second: None,
            first_segments: segments,
            second_segments: Segments::new(),
            delta_cost: f64::INFINITY,
            reconciled: None,
        }
    }

    pub fn inter_route(
        kind: MoveKind,
        first: RouteIdx,
        second: RouteTarget,
        first_segments: Segments,
        second_segments: Segments,
    ) -> Self {
        Move {
            kind,
            first,
            second: Some(second),
            first_segments,
            second_segments,
            delta_cost: f64::INFINITY,
            reconciled: None,
        }
    }

    /// Existing routes changed by the move.
    pub fn touched_routes(&self) -> SmallVec<[RouteIdx; 2]> {
        let mut routes = SmallVec::new();
        routes.push(self.first);
        if let Some(RouteTarget::Existing(second)) = self.second {
            routes.push(second);
        }
        routes
    }

    /// Customer sequences of the targets after the move.
    pub fn build_sequences(
        &self,
        problem: &ElectricVehicleRoutingProblem,
        solution: &Solution,
    ) -> (Vec<NodeIdx>, Option<Vec<NodeIdx>>) {
        let build = |segments: &Segments| {
            let mut nodes = Vec::new();
            for segment in segments {
                segment.extend_into(problem, solution, &mut nodes);
            }
            nodes
        };

        let first = build(&self.first_segments);
        let second = self.second.map(|_| build(&self.second_segments));

        (first, second)
    }
}

/// Applies `mv` to `solution`. Targets get the electrified routes stored in the move when
/// there are some, otherwise their new customer sequence without stations. Routes left
/// without customers are dropped.
///
/// Returns the indices, after the drop, of the targets that still exist.
pub fn apply_move(
    problem: &ElectricVehicleRoutingProblem,
    solution: &mut Solution,
    mv: &Move,
) -> Vec<RouteIdx> {
    let (first_nodes, second_nodes) = mv.build_sequences(problem, solution);

    let (first_route, second_route) = match &mv.reconciled {
        Some(routes) => (routes[0].clone(), routes.get(1).cloned()),
        None => (
            Route::from_nodes(problem, first_nodes),
            second_nodes.map(|nodes| Route::from_nodes(problem, nodes)),
        ),
    };

    let mut targets = vec![mv.first];
    *solution.route_mut(mv.first) = first_route;

    match (mv.second, second_route) {
        (Some(RouteTarget::Existing(second)), Some(route)) => {
            *solution.route_mut(second) = route;
            targets.push(second);
        }
        (Some(RouteTarget::New), Some(route)) => {
            targets.push(solution.push(route));
        }
        _ => {}
    }

    let mapping = solution.remove_empty_routes();
    solution.compute_cost();

    targets
        .into_iter()
        .filter_map(|route| mapping[route.get()])
        .collect()
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use crate::test_utils::{TestRoute, create_line_problem, create_test_solution, ids};

    use super::*;

    #[test]
    fn test_reversed_segment() {
        let problem = create_line_problem(4, &[], 200.0);
        let solution = create_test_solution(
            &problem,
            vec![TestRoute {
                nodes: vec![0, 1, 2, 3, 4, 0],
            }],
        );
        let r = RouteIdx::new(0);

        let mv = Move::intra_route(
            MoveKind::TwoOpt,
            r,
            smallvec![Segment::new(r, 0, 1), Segment::new(r, 4, 2), Segment::new(r, 5, 5)],
        );

        let (first, second) = mv.build_sequences(&problem, &solution);
        assert_eq!(first, ids(&[0, 1, 4, 3, 2, 0]));
        assert_eq!(second, None);
    }

    #[test]
    fn test_apply_move_to_new_route() {
        let problem = create_line_problem(3, &[], 200.0);
        let mut solution = create_test_solution(
            &problem,
            vec![TestRoute {
                nodes: vec![0, 1, 2, 3, 0],
            }],
        );
        let r = RouteIdx::new(0);

        let mv = Move::inter_route(
            MoveKind::OrOpt,
            r,
            RouteTarget::New,
            smallvec![Segment::new(r, 0, 1), Segment::new(r, 3, 4)],
            smallvec![Segment::depot(), Segment::new(r, 2, 2), Segment::depot()],
        );

        let touched = apply_move(&problem, &mut solution, &mv);

        assert_eq!(touched, vec![RouteIdx::new(0), RouteIdx::new(1)]);
        assert_eq!(solution.route(RouteIdx::new(0)).customers(), &ids(&[0, 1, 3, 0]));
        assert_eq!(solution.route(RouteIdx::new(1)).customers(), &ids(&[0, 2, 0]));
        assert!(solution.verify(&problem).is_ok());
    }

    #[test]
    fn test_apply_move_drops_emptied_route() {
        let problem = create_line_problem(3, &[], 200.0);
        let mut solution = create_test_solution(
            &problem,
            vec![
                TestRoute {
                    nodes: vec![0, 1, 0],
                },
                TestRoute {
                    nodes: vec![0, 2, 3, 0],
                },
            ],
        );
        let (r1, r2) = (RouteIdx::new(0), RouteIdx::new(1));

        // move customer 1 in front of customer 2
        let mv = Move::inter_route(
            MoveKind::InterOrOpt,
            r1,
            RouteTarget::Existing(r2),
            smallvec![Segment::new(r1, 0, 0), Segment::new(r1, 2, 2)],
            smallvec![Segment::new(r2, 0, 0), Segment::new(r1, 1, 1), Segment::new(r2, 1, 3)],
        );

        let touched = apply_move(&problem, &mut solution, &mv);

        assert_eq!(touched, vec![RouteIdx::new(0)]);
        assert_eq!(solution.len(), 1);
        assert_eq!(solution.route(RouteIdx::new(0)).customers(), &ids(&[0, 1, 2, 3, 0]));
        assert_eq!(solution.cost(), 100.0 + 60.0);
    }
}
