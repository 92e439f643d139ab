use std::io::{self, Write};
use tracing::*;

use crate::data::*;
use crate::encoder::RideVars;
use crate::feasibility::Feasibility;
use crate::solver::Solution;

/// Rides of one vehicle in the order they are driven.
pub type Route = Vec<RideIdx>;

fn next_ride(feas: &Feasibility, vars: &RideVars, sol: &Solution, i: RideIdx) -> Option<RideIdx> {
    feas.successors(i).iter()
        .copied()
        .find(|&k| vars.transition.get(&(i, k)).map_or(false, |&x| sol.is_selected(x)))
}

/// Walks the selected transitions from each selected start ride, one route per vehicle.
///
/// Start rides are handed out in index order and each is used once.  Vehicles left over
/// once the start rides are exhausted get an empty route.  A walk stops at the first ride
/// without a selected outgoing transition, or at a ride that has already been routed.
#[instrument(level="debug", skip(feas, vars, sol))]
pub fn reconstruct(n_vehicles: usize, feas: &Feasibility, vars: &RideVars, sol: &Solution) -> Vec<Route> {
    let n = vars.start.len();
    let mut visited = vec![false; n];
    let mut starts = (0..n).filter(|&i| sol.is_selected(vars.start[i]));
    let mut routes = Vec::with_capacity(n_vehicles);

    for v in 0..n_vehicles {
        let mut route = Route::new();
        let mut node = starts.by_ref().find(|&i| !visited[i]);
        while let Some(i) = node {
            if visited[i] {
                warn!(vehicle=v, ride=i, "ride reached twice, route truncated");
                break;
            }
            visited[i] = true;
            route.push(i);
            node = next_ride(feas, vars, sol, i);
        }
        trace!(vehicle=v, ?route);
        routes.push(route);
    }

    let unused = starts.filter(|&i| !visited[i]).count();
    if unused > 0 {
        warn!(unused, "more selected start rides than vehicles");
    }
    routes
}

/// One line per vehicle: its index followed by its rides.
pub fn write_routes(mut w: impl Write, routes: &[Route]) -> io::Result<()> {
    for (v, route) in routes.iter().enumerate() {
        write!(w, "{}", v)?;
        for i in route {
            write!(w, " {}", i)?;
        }
        writeln!(w)?;
    }
    Ok(())
}
