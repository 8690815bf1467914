/// Odometer-order cartesian product over per-layer variant counts.
pub mod odometer;
