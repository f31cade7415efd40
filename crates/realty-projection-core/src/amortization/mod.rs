pub mod params;
pub mod schedule;
