//! Replays routes the way the game scores them.
use std::cmp::max;
use tracing::*;

use crate::data::*;
use crate::routes::Route;

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct Score {
    pub distance: i64,
    pub bonus: i64,
    pub rides_completed: usize,
    pub rides_on_time: usize,
}

impl Score {
    #[inline]
    pub fn total(&self) -> i64 {
        self.distance + self.bonus
    }
}

/// Each vehicle leaves [`ORIGIN`] at time 0 and serves its rides in order, starting each as
/// soon as it has arrived and the ride's earliest start has passed.  A ride earns its length
/// if it is finished by its latest end, plus the instance bonus if it started exactly at its
/// earliest start.  Late rides are still driven but earn nothing.
#[instrument(level="debug", skip_all)]
pub fn score(data: &RideInstance, routes: &[Route]) -> Score {
    let mut s = Score::default();
    for route in routes {
        let (mut t, mut pos) = (0, ORIGIN);
        for &i in route {
            let r = data.ride(i);
            let begin = max(t + pos.dist(&r.start), r.earliest_start);
            let finish = begin + r.length;
            if finish <= r.latest_end {
                s.distance += r.length;
                s.rides_completed += 1;
                if begin == r.earliest_start {
                    s.bonus += data.bonus;
                    s.rides_on_time += 1;
                }
            } else {
                trace!(ride=i, begin, finish, "late");
            }
            t = finish;
            pos = r.end;
        }
    }
    s
}
