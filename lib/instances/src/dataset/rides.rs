use std::borrow::Cow;
use crate::InputParseError;
use crate::raw::{
  FromRaw,
  metrics::{Manhattan, Metric},
  rides::{Hashcode, RawRide},
};

pub type Time = i64;
pub type Coord = i64;
pub type RideIdx = usize;

/// Where every vehicle is at time 0.
pub const ORIGIN: Pos = Pos { x: 0, y: 0 };

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Pos {
  pub x: Coord,
  pub y: Coord,
}

impl Pos {
  #[inline]
  pub fn new(x: Coord, y: Coord) -> Self { Pos { x, y } }

  #[inline]
  pub fn dist(&self, other: &Pos) -> Time {
    Manhattan::compute((self.x, self.y), (other.x, other.y))
  }
}

/// A ride request together with the timing quantities derived from it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Ride {
  pub start: Pos,
  pub end: Pos,
  pub earliest_start: Time,
  pub latest_end: Time,
  pub length: Time,
  pub latest_start: Time,
  pub earliest_end: Time,
  /// How many turns the start may slip past `earliest_start`.
  pub max_delay: Time,
  /// Distance from [`ORIGIN`] to the pickup.
  pub start_distance: Time,
}

impl Ride {
  pub fn new(start: Pos, end: Pos, earliest_start: Time, latest_end: Time) -> Self {
    let length = start.dist(&end);
    let latest_start = latest_end - length;
    Ride {
      start,
      end,
      earliest_start,
      latest_end,
      length,
      latest_start,
      earliest_end: earliest_start + length,
      max_delay: latest_start - earliest_start,
      start_distance: ORIGIN.dist(&start),
    }
  }
}

impl From<RawRide> for Ride {
  fn from(r: RawRide) -> Self {
    Ride::new(Pos::new(r.start.0, r.start.1), Pos::new(r.end.0, r.end.1), r.earliest_start, r.latest_end)
  }
}


#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct RideInstance {
  pub id: String,
  pub rows: usize,
  pub cols: usize,
  pub n_vehicles: usize,
  pub bonus: i64,
  pub n_turns: Time,
  pub rides: Vec<Ride>,
}

impl FromRaw<Hashcode> for RideInstance {
  fn from_raw(raw: Hashcode, id: Cow<str>) -> RideInstance {
    RideInstance {
      id: id.into_owned(),
      rows: raw.rows,
      cols: raw.cols,
      n_vehicles: raw.num_vehicles,
      bonus: raw.bonus,
      n_turns: raw.num_turns,
      rides: raw.rides.into_iter().map(Ride::from).collect(),
    }
  }
}

impl RideInstance {
  #[inline]
  pub fn n_rides(&self) -> usize { self.rides.len() }

  #[inline]
  pub fn on_grid(&self, p: &Pos) -> bool {
    0 <= p.x && p.x < self.rows as Coord && 0 <= p.y && p.y < self.cols as Coord
  }

  /// Rejects rides that leave the grid or cannot be completed even when started at
  /// `earliest_start`.
  pub fn validate(&self) -> Result<(), InputParseError> {
    for (ride, r) in self.rides.iter().enumerate() {
      if let Some(p) = [r.start, r.end].iter().find(|p| !self.on_grid(p)) {
        return Err(InputParseError::OffGrid { ride, pos: (p.x, p.y), rows: self.rows, cols: self.cols });
      }
      if r.max_delay < 0 {
        return Err(InputParseError::NegativeSlack { ride, max_delay: r.max_delay });
      }
    }
    Ok(())
  }
}
