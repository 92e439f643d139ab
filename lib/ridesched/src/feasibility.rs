//! Which ride may directly follow which, given travel distances and time windows.
use ndarray::Array2;
use rayon::prelude::*;
use tracing::*;

use crate::data::*;

/// Pairwise transition data for an instance.  Computed once and read-only afterwards.
///
/// `distance[[i, j]]` is the distance from the drop-off of `i` to the pickup of `j` and is
/// filled for every pair.  `valid[[i, j]]` holds iff `i != j` and a vehicle starting `i` at
/// its earliest start can still reach `j` before `j`'s latest start.  Only valid pairs ever
/// become model variables, and `successors`/`predecessors` index exactly those.
#[derive(Debug, Clone)]
pub struct Feasibility {
    pub distance: Array2<Time>,
    pub valid: Array2<bool>,
    successors: Vec<Vec<RideIdx>>,
    predecessors: Vec<Vec<RideIdx>>,
}

impl Feasibility {
    #[inline]
    pub fn n_rides(&self) -> usize {
        self.successors.len()
    }

    #[inline]
    pub fn distance(&self, i: RideIdx, j: RideIdx) -> Time {
        self.distance[[i, j]]
    }

    #[inline]
    pub fn is_valid(&self, i: RideIdx, j: RideIdx) -> bool {
        self.valid[[i, j]]
    }

    /// Rides that may follow `i`, in ascending order.
    #[inline]
    pub fn successors(&self, i: RideIdx) -> &[RideIdx] {
        &self.successors[i]
    }

    /// Rides that `i` may follow, in ascending order.
    #[inline]
    pub fn predecessors(&self, i: RideIdx) -> &[RideIdx] {
        &self.predecessors[i]
    }

    pub fn num_valid(&self) -> usize {
        self.successors.iter().map(Vec::len).sum()
    }

    /// All valid `(i, j)` pairs, row by row.
    pub fn arcs<'a>(&'a self) -> impl Iterator<Item=(RideIdx, RideIdx)> + 'a {
        self.successors.iter()
            .enumerate()
            .flat_map(|(i, succ)| succ.iter().map(move |&j| (i, j)))
    }
}

#[inline]
fn can_follow(ri: &Ride, rj: &Ride, distance: Time) -> bool {
    ri.earliest_end + distance <= rj.latest_start
}

#[instrument(level="info", skip(data), fields(id=%data.id, rides=data.n_rides()))]
pub fn precompute(data: &RideInstance) -> Feasibility {
    let n = data.n_rides();

    let rows: Vec<(Vec<Time>, Vec<bool>)> = data.rides.par_iter()
        .enumerate()
        .map(|(i, ri)| {
            let mut dist = Vec::with_capacity(n);
            let mut valid = Vec::with_capacity(n);
            for (j, rj) in data.rides.iter().enumerate() {
                let d = ri.end.dist(&rj.start);
                dist.push(d);
                valid.push(i != j && can_follow(ri, rj, d));
            }
            (dist, valid)
        })
        .collect();

    let distance = Array2::from_shape_fn((n, n), |(i, j)| rows[i].0[j]);
    let valid = Array2::from_shape_fn((n, n), |(i, j)| rows[i].1[j]);

    let successors: Vec<Vec<RideIdx>> = rows.iter()
        .map(|(_, v)| v.iter().enumerate().filter_map(|(j, &ok)| if ok { Some(j) } else { None }).collect())
        .collect();

    let mut predecessors = vec![Vec::new(); n];
    for (i, succ) in successors.iter().enumerate() {
        for &j in succ {
            predecessors[j].push(i);
        }
    }

    let feas = Feasibility { distance, valid, successors, predecessors };
    info!(valid = feas.num_valid(), "{} of {} ordered pairs are valid transitions", feas.num_valid(), n * n.saturating_sub(1));
    return feas;
}
