use std::path::Path;
use anyhow::Result;

pub use instances::dataset::rides::{
  Time,
  Coord,
  RideIdx,
  Pos,
  Ride,
  RideInstance,
  ORIGIN,
};
pub use instances::InputParseError;

pub trait RideInstanceExt {
  fn ride(&self, i: RideIdx) -> &Ride;
  fn transition_distance(&self, i: RideIdx, j: RideIdx) -> Time;
  fn score_upper_bound(&self) -> i64;
}

impl RideInstanceExt for RideInstance {
  #[inline]
  fn ride(&self, i: RideIdx) -> &Ride {
    &self.rides[i]
  }

  /// Distance from the drop-off of `i` to the pickup of `j`.
  #[inline]
  fn transition_distance(&self, i: RideIdx, j: RideIdx) -> Time {
    self.rides[i].end.dist(&self.rides[j].start)
  }

  /// Every ride performed, every ride on time.
  fn score_upper_bound(&self) -> i64 {
    self.rides.iter().map(|r| r.length + self.bonus).sum()
  }
}

pub fn load_instance(path: impl AsRef<Path>) -> Result<RideInstance> {
  instances::dataset::load_instance(path)
}

pub fn parse_instance(text: &str, id: &str) -> Result<RideInstance> {
  instances::dataset::parse_instance(text, id)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::EXAMPLE;

  #[test]
  fn example_distances() -> Result<()> {
    let data = load_instance(EXAMPLE)?;
    assert_eq!(data.transition_distance(0, 1), 1);
    assert_eq!(data.transition_distance(0, 2), 4);
    assert_eq!(data.transition_distance(2, 0), 4);
    assert_eq!(data.score_upper_bound(), 8 + 3 * 2);
    Ok(())
  }

  #[test]
  #[should_panic]
  fn fail_load_instance() {
    load_instance("non-existent.in").unwrap();
  }
}
