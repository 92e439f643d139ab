//! Independent checks of a solved assignment and the routes read from it.
use std::fmt;
use tracing::*;

use crate::data::*;
use crate::encoder::RideVars;
use crate::feasibility::Feasibility;
use crate::routes::Route;
use crate::solver::Solution;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Violation {
    FleetCap { started: usize, vehicles: usize },
    EnteredTwice { ride: RideIdx, incoming: i64 },
    FlowImbalance { ride: RideIdx, incoming: i64, outgoing: i64 },
    DelayOutOfRange { ride: RideIdx, delay: i64 },
    BonusWithDelay { ride: RideIdx, delay: i64 },
    BonusNotPerformed { ride: RideIdx },
    RoutedTwice { ride: RideIdx },
    PerformedNotRouted { ride: RideIdx },
    RoutedNotPerformed { ride: RideIdx },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

fn selected_count<'a>(sol: &Solution, vars: impl IntoIterator<Item=&'a crate::mip::Var>) -> i64 {
    vars.into_iter().filter(|&&v| sol.is_selected(v)).count() as i64
}

/// Everything wrong with `sol` and `routes`; empty when the assignment is consistent.
#[instrument(level="debug", skip_all)]
pub fn check(data: &RideInstance, feas: &Feasibility, vars: &RideVars, sol: &Solution, routes: &[Route]) -> Vec<Violation> {
    let mut violations = Vec::new();

    let started = selected_count(sol, &vars.start) as usize;
    if started > data.n_vehicles {
        violations.push(Violation::FleetCap { started, vehicles: data.n_vehicles });
    }

    let mut in_route = vec![0usize; data.n_rides()];
    for &i in routes.iter().flatten() {
        in_route[i] += 1;
    }

    for (i, r) in data.rides.iter().enumerate() {
        let incoming = selected_count(sol, &[vars.start[i]])
            + selected_count(sol, feas.predecessors(i).iter().map(|j| &vars.transition[&(*j, i)]));
        let outgoing = selected_count(sol, &[vars.end[i]])
            + selected_count(sol, feas.successors(i).iter().map(|j| &vars.transition[&(i, *j)]));
        let delay = sol.int_value(vars.delay[i]);

        if incoming > 1 {
            violations.push(Violation::EnteredTwice { ride: i, incoming });
        }
        if incoming != outgoing {
            violations.push(Violation::FlowImbalance { ride: i, incoming, outgoing });
        }
        if delay < 0 || delay > r.max_delay {
            violations.push(Violation::DelayOutOfRange { ride: i, delay });
        }
        if sol.is_selected(vars.bonus[i]) {
            if delay != 0 {
                violations.push(Violation::BonusWithDelay { ride: i, delay });
            }
            if incoming == 0 {
                violations.push(Violation::BonusNotPerformed { ride: i });
            }
        }
        match (incoming > 0, in_route[i]) {
            (_, k) if k > 1 => violations.push(Violation::RoutedTwice { ride: i }),
            (true, 0) => violations.push(Violation::PerformedNotRouted { ride: i }),
            (false, 1) => violations.push(Violation::RoutedNotPerformed { ride: i }),
            _ => {},
        }
    }

    for v in &violations {
        warn!(%v, "inconsistent solution");
    }
    violations
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;
    use crate::feasibility::precompute;
    use crate::routes::reconstruct;
    use crate::solver::SolveStatus;
    use anyhow::Result;

    const EXAMPLE: &str = "3 4 2 3 2 10\n0 0 1 3 2 9\n1 2 1 0 0 9\n2 0 2 2 0 9\n";

    #[test]
    fn consistent_and_broken() -> Result<()> {
        let data = parse_instance(EXAMPLE, "t")?;
        let feas = precompute(&data);
        let enc = encode(&data, &feas);
        let v = &enc.vars;

        let mut values = vec![0.0; enc.model.num_vars()];
        for x in &[v.start[0], v.transition[&(0, 1)], v.end[1], v.start[2], v.end[2], v.bonus[0]] {
            values[x.index()] = 1.0;
        }
        values[v.delay[1].index()] = 7.0;
        values[v.delay[2].index()] = 2.0;
        let sol = Solution::new(SolveStatus::Optimal, 10.0, values.clone());
        let routes = reconstruct(2, &feas, v, &sol);
        assert_eq!(check(&data, &feas, v, &sol, &routes), vec![]);

        // bonus on a delayed ride, and ride 1 left without an exit
        values[v.bonus[2].index()] = 1.0;
        values[v.end[1].index()] = 0.0;
        let sol = Solution::new(SolveStatus::Optimal, 10.0, values);
        let routes = reconstruct(2, &feas, v, &sol);
        let found = check(&data, &feas, v, &sol, &routes);
        assert!(found.contains(&Violation::BonusWithDelay { ride: 2, delay: 2 }));
        assert!(found.contains(&Violation::FlowImbalance { ride: 1, incoming: 1, outgoing: 0 }));
        Ok(())
    }

    #[test]
    fn fleet_cap_and_unrouted() -> Result<()> {
        let data = parse_instance(EXAMPLE, "t")?;
        let feas = precompute(&data);
        let enc = encode(&data, &feas);
        let v = &enc.vars;
        let mut values = vec![0.0; enc.model.num_vars()];
        for i in 0..3 {
            values[v.start[i].index()] = 1.0;
            values[v.end[i].index()] = 1.0;
        }
        let sol = Solution::new(SolveStatus::Optimal, 0.0, values);
        let routes = reconstruct(2, &feas, v, &sol);
        let found = check(&data, &feas, v, &sol, &routes);
        assert!(found.contains(&Violation::FleetCap { started: 3, vehicles: 2 }));
        assert!(found.contains(&Violation::PerformedNotRouted { ride: 2 }));
        Ok(())
    }
}
