/// The instance file exactly as written: header fields and one record per ride.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Hashcode {
  pub rows: usize,
  pub cols: usize,
  pub num_vehicles: usize,
  pub num_rides: usize,
  pub bonus: i64,
  pub num_turns: i64,
  pub rides: Vec<RawRide>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RawRide {
  pub start: (i64, i64),
  pub end: (i64, i64),
  pub earliest_start: i64,
  pub latest_end: i64,
}
