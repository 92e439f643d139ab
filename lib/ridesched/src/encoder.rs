//! Routing, timing and bonus logic of the ride assignment problem as an integer program.
use std::collections::HashMap;
use tracing::*;

use crate::*;
use crate::data::*;
use crate::feasibility::Feasibility;
use crate::mip::{LinExpr, Model, Var};

/// Decision variables, indexed by ride.
///
/// `transition` only has entries for valid pairs; a missing key means the pair can never be
/// chained.
#[derive(Debug, Clone)]
pub struct RideVars {
    pub start: Vec<Var>,
    pub end: Vec<Var>,
    pub delay: Vec<Var>,
    pub bonus: Vec<Var>,
    pub transition: Map<(RideIdx, RideIdx), Var>,
}

impl RideVars {
    /// `start(i) + Σ transition(j, i)`: 1 iff ride `i` is performed.
    pub fn incoming(&self, feas: &Feasibility, i: RideIdx) -> LinExpr {
        let mut e = LinExpr::from(self.start[i]);
        e += feas.predecessors(i).iter().map(|&j| self.transition[&(j, i)]).sum::<LinExpr>();
        e
    }

    /// `end(i) + Σ transition(i, j)`.
    pub fn outgoing(&self, feas: &Feasibility, i: RideIdx) -> LinExpr {
        let mut e = LinExpr::from(self.end[i]);
        e += feas.successors(i).iter().map(|&j| self.transition[&(i, j)]).sum::<LinExpr>();
        e
    }
}

pub struct EncodedModel {
    pub model: Model,
    pub vars: RideVars,
    pub size_info: HashMap<String, isize>,
}

fn add_variables(model: &mut Model, data: &RideInstance, feas: &Feasibility) -> RideVars {
    let n = data.n_rides();
    let mut vars = RideVars {
        start: Vec::with_capacity(n),
        end: Vec::with_capacity(n),
        delay: Vec::with_capacity(n),
        bonus: Vec::with_capacity(n),
        transition: Map::with_capacity_and_hasher(feas.num_valid(), Default::default()),
    };

    for (i, r) in data.rides.iter().enumerate() {
        vars.start.push(model.add_binary(format!("start_{}", i)));
        vars.end.push(model.add_binary(format!("end_{}", i)));
        vars.delay.push(model.add_integer(format!("delay_{}", i), 0, r.max_delay));
        vars.bonus.push(model.add_binary(format!("bonus_{}", i)));
        for &j in feas.successors(i) {
            vars.transition.insert((i, j), model.add_binary(format!("x_{}_{}", i, j)));
        }
    }
    vars
}

/// A first ride cannot start before the vehicle gets there from the origin.  With
/// start = 0 the constraint is es + d + (sd - es) >= sd, which always holds.
#[inline]
fn start_big_m(r: &Ride) -> Time {
    r.start_distance - r.earliest_start
}

/// Smallest M that makes the sequencing constraint of `i -> j` vacuous when the
/// transition is unused, for every delay in range.  The binding case is
/// `delay(i) = max_delay(i)`, `delay(j) = 0`.
#[inline]
fn sequencing_big_m(ri: &Ride, rj: &Ride, distance: Time) -> Time {
    ri.max_delay + distance + ri.earliest_end - rj.earliest_start
}

#[instrument(level="info", skip(data, feas), fields(id=%data.id))]
pub fn encode(data: &RideInstance, feas: &Feasibility) -> EncodedModel {
    debug_assert_eq!(data.n_rides(), feas.n_rides());
    let mut model = Model::new(&data.id);
    let vars = add_variables(&mut model, data, feas);

    // at most one route per vehicle
    let started: LinExpr = vars.start.iter().copied().sum();
    model.add_constr("fleet".to_string(), started.le(data.n_vehicles as i64));

    for (i, ri) in data.rides.iter().enumerate() {
        let _s = trace_span!("ride_constraints", i).entered();
        let incoming = vars.incoming(feas, i);
        let outgoing = vars.outgoing(feas, i);
        let (delay, bonus, start) = (vars.delay[i], vars.bonus[i], vars.start[i]);

        model.add_constr(format!("enter_once_{}", i), incoming.clone().le(1));
        model.add_constr(format!("flow_{}", i), incoming.clone().equal(outgoing));
        model.add_constr(format!("bonus_taken_{}", i), incoming.ge(bonus));
        model.add_constr(format!("bonus_delay_{}", i), ((1 - bonus) * ri.max_delay).ge(delay));

        let big_m = start_big_m(ri);
        model.add_constr(
            format!("start_time_{}", i),
            (ri.earliest_start + delay + (1 - start) * big_m).ge(ri.start_distance),
        );

        for &j in feas.successors(i) {
            let rj = &data.rides[j];
            let d = feas.distance(i, j);
            let x = vars.transition[&(i, j)];
            let big_m = sequencing_big_m(ri, rj, d);
            trace!(j, d, big_m);
            model.add_constr(
                format!("seq_time_{}_{}", i, j),
                (ri.earliest_end + delay + d).le(rj.earliest_start + vars.delay[j] + (1 - x) * big_m),
            );
        }
    }

    let objective: LinExpr = data.rides.iter().enumerate()
        .map(|(i, r)| vars.bonus[i] * data.bonus + vars.start[i] * r.length)
        .chain(feas.arcs().map(|(i, j)| vars.transition[&(i, j)] * data.rides[j].length))
        .sum();
    model.set_objective(objective);

    let mut size_info = HashMap::default();
    size_info.insert("rides".to_string(), data.n_rides() as isize);
    size_info.insert("valid_transitions".to_string(), feas.num_valid() as isize);
    size_info.insert("variables".to_string(), model.num_vars() as isize);
    size_info.insert("constraints".to_string(), model.num_constrs() as isize);
    for (name, _) in model.constraints() {
        let family = name.trim_end_matches(|c: char| c == '_' || c.is_ascii_digit());
        *size_info.entry(format!("constraints.{}", family)).or_insert(0) += 1;
    }
    info!(vars=model.num_vars(), constraints=model.num_constrs(), "model built");

    EncodedModel { model, vars, size_info }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::feasibility::precompute;
    use crate::mip::{Sense, VarType};
    use crate::{init_test_logging, test_utils};
    use anyhow::Result;
    use proptest::prelude::*;

    fn constr<'a>(enc: &'a EncodedModel, name: &str) -> &'a mip::Constraint {
        &enc.model.constraints().iter().find(|(n, _)| n == name).unwrap().1
    }

    fn build(text: &str) -> Result<(RideInstance, Feasibility, EncodedModel)> {
        init_test_logging(None::<&str>);
        let data = parse_instance(text, "t")?;
        let feas = precompute(&data);
        let enc = encode(&data, &feas);
        Ok((data, feas, enc))
    }

    #[test]
    fn sparse_transitions() -> Result<()> {
        let (_, _, enc) = build("10 10 2 2 1 40\n0 0 9 9 0 30\n0 0 0 1 0 6\n")?;
        assert!(!enc.vars.transition.contains_key(&(0, 1)));
        assert!(enc.vars.transition.contains_key(&(1, 0)));
        assert!(enc.model.vars().iter().all(|v| v.name != "x_0_1"));
        // 4 per ride plus one transition
        assert_eq!(enc.model.num_vars(), 9);
        // fleet + 5 per ride + one sequencing constraint
        assert_eq!(enc.model.num_constrs(), 12);
        Ok(())
    }

    #[test]
    fn variable_domains() -> Result<()> {
        let (data, _, enc) = build("3 4 2 3 2 10\n0 0 1 3 2 9\n1 2 1 0 0 9\n2 0 2 2 0 9\n")?;
        for (i, r) in data.rides.iter().enumerate() {
            let d = enc.model.var(enc.vars.delay[i]);
            assert_eq!((d.vtype, d.lb, d.ub), (VarType::Integer, 0, r.max_delay));
            assert_eq!(enc.model.var(enc.vars.bonus[i]).vtype, VarType::Binary);
        }
        assert_eq!(enc.size_info["valid_transitions"], 4);
        Ok(())
    }

    #[test]
    fn constraint_family_counts() -> Result<()> {
        let (_, _, enc) = build("3 4 2 3 2 10\n0 0 1 3 2 9\n1 2 1 0 0 9\n2 0 2 2 0 9\n")?;
        let count = |family: &str| enc.size_info[&format!("constraints.{}", family)];
        assert_eq!(count("fleet"), 1);
        for family in &["enter_once", "flow", "bonus_taken", "bonus_delay", "start_time"] {
            assert_eq!(count(family), 3, "{}", family);
        }
        assert_eq!(count("seq_time"), 4);
        let total: isize = enc.size_info.iter()
            .filter(|(k, _)| k.starts_with("constraints."))
            .map(|(_, &v)| v)
            .sum();
        assert_eq!(total, enc.size_info["constraints"]);
        Ok(())
    }

    #[test]
    fn timing_constraints() -> Result<()> {
        let (data, _, enc) = build("3 4 2 3 2 10\n0 0 1 3 2 9\n1 2 1 0 0 9\n2 0 2 2 0 9\n")?;
        let v = &enc.vars;

        // ride 1: es 0, sd 3 -> d1 - 3 start_1 >= 0
        let c = constr(&enc, "start_time_1");
        assert_eq!(c.sense, Sense::Ge);
        assert_eq!(c.rhs, 0);
        assert_eq!(c.expr.terms(), &[(v.delay[1], 1), (v.start[1], -3)]);

        // 0 -> 1: ee0 6, d 1, es1 0, md0 3 => M = 10; d0 - d1 + 10 x01 <= 3
        let c = constr(&enc, "seq_time_0_1");
        assert_eq!(c.sense, Sense::Le);
        assert_eq!(c.rhs, 3);
        assert_eq!(c.expr.terms(), &[(v.delay[0], 1), (v.delay[1], -1), (v.transition[&(0, 1)], 10)]);

        // bonus forces zero delay: md * bonus + d <= md
        let c = constr(&enc, "bonus_delay_0");
        assert!(c.is_satisfied(|x| if x == v.bonus[0] { 1.0 } else { 0.0 }, 1e-9));
        assert!(!c.is_satisfied(|x| if x == v.bonus[0] || x == v.delay[0] { 1.0 } else { 0.0 }, 1e-9));
        assert!(c.is_satisfied(|x| if x == v.delay[0] { data.rides[0].max_delay as f64 } else { 0.0 }, 1e-9));
        Ok(())
    }

    #[test]
    fn objective_terms() -> Result<()> {
        let (data, _, enc) = build("3 4 2 3 2 10\n0 0 1 3 2 9\n1 2 1 0 0 9\n2 0 2 2 0 9\n")?;
        let obj = enc.model.objective();
        let coeff = |x: Var| obj.terms().iter().find(|(v, _)| *v == x).map(|(_, c)| *c);
        let v = &enc.vars;
        assert_eq!(coeff(v.bonus[0]), Some(data.bonus));
        assert_eq!(coeff(v.start[0]), Some(4));
        // reward sits on the edge entering the ride
        assert_eq!(coeff(v.transition[&(0, 1)]), Some(2));
        assert_eq!(coeff(v.transition[&(1, 0)]), Some(4));
        assert_eq!(coeff(v.end[0]), None);
        assert_eq!(coeff(v.delay[0]), None);
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]
        #[test]
        fn big_m_vacuous_and_tight(
            data in test_utils::instance(6, 2),
            seeds in prop::collection::vec(0..1000i64, 6),
        ) {
            let feas = precompute(&data);
            let enc = encode(&data, &feas);
            let v = &enc.vars;
            let n = data.n_rides();
            // every binary at 0, delays as given
            let assignment = |delays: &[i64]| {
                let mut values = vec![0.0; enc.model.num_vars()];
                for (i, &d) in delays.iter().enumerate() {
                    values[v.delay[i].index()] = d as f64;
                }
                values
            };

            let delays: Vec<i64> = (0..n).map(|i| seeds[i] % (data.rides[i].max_delay + 1)).collect();
            let values = assignment(&delays);
            for (name, c) in enc.model.constraints() {
                if name.starts_with("start_time") || name.starts_with("seq_time") {
                    prop_assert!(c.is_satisfied(|x| values[x.index()], 1e-9), "{} violated", name);
                }
            }

            let values = assignment(&vec![0; n]);
            for (i, r) in data.rides.iter().enumerate() {
                let tighter = (r.earliest_start + v.delay[i] + (1 - v.start[i]) * (start_big_m(r) - 1))
                    .ge(r.start_distance);
                prop_assert!(!tighter.is_satisfied(|x| values[x.index()], 1e-9));
            }

            for (i, j) in feas.arcs() {
                let (ri, rj) = (&data.rides[i], &data.rides[j]);
                let d = feas.distance(i, j);
                let m = sequencing_big_m(ri, rj, d);
                let x = v.transition[&(i, j)];
                let c = constr(&enc, &format!("seq_time_{}_{}", i, j));
                let coeff = c.expr.terms().iter().find(|(y, _)| *y == x).map_or(0, |&(_, k)| k);
                prop_assert_eq!(coeff, m);

                let mut extreme = vec![0; n];
                extreme[i] = ri.max_delay;
                let values = assignment(&extreme);
                prop_assert!(c.is_satisfied(|y| values[y.index()], 1e-9), "seq_time_{}_{} violated", i, j);

                let tighter = (ri.earliest_end + v.delay[i] + d)
                    .le(rj.earliest_start + v.delay[j] + (1 - x) * (m - 1));
                prop_assert!(!tighter.is_satisfied(|y| values[y.index()], 1e-9));
            }
        }
    }
}
