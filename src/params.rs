use crate::error::{RoutingError, RoutingResult};
use chrono::TimeDelta;

/// Upper bound of the Muskingum weighting factor.
pub const MAX_X: f64 = 0.5;

/// Physical description of a single reach.
///
/// * `k` - storage time constant; roughly the travel time of a flood wave
///   through the reach.
/// * `x` - weighting between inflow and outflow in the storage relation.
///   * x = 0 : storage depends on outflow only (linear reservoir).
///   * x = 0.5 : storage depends on inflow and outflow equally (pure translation
///     when `k` equals the time step).
/// * `time_step` - uniform spacing of the inflow series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReachParams {
    pub k: TimeDelta,
    pub x: f64,
    pub time_step: TimeDelta,
}

impl ReachParams {
    pub fn new(k: TimeDelta, x: f64, time_step: TimeDelta) -> Self {
        ReachParams { k, x, time_step }
    }

    pub fn k_seconds(&self) -> f64 {
        seconds(self.k)
    }

    pub fn time_step_seconds(&self) -> f64 {
        seconds(self.time_step)
    }
}

/// Duration in seconds, nanosecond resolution.
pub fn seconds(duration: TimeDelta) -> f64 {
    duration.num_seconds() as f64 + f64::from(duration.subsec_nanos()) / 1e9
}

/// Check reach parameters and series shape before any routing is attempted.
pub fn validate(reach: &ReachParams, sub_reaches: usize, inflow_len: usize) -> RoutingResult<()> {
    // Checked on the converted values so routing never sees a zero duration.
    if !(reach.k_seconds() > 0.0) {
        return Err(RoutingError::invalid(
            "k",
            format!("must be positive, got {}s", reach.k_seconds()),
        ));
    }
    if !(reach.time_step_seconds() > 0.0) {
        return Err(RoutingError::invalid(
            "time_step",
            format!("must be positive, got {}s", reach.time_step_seconds()),
        ));
    }
    // Written as a negated range check so NaN is rejected as well.
    if !(0.0..=MAX_X).contains(&reach.x) {
        return Err(RoutingError::invalid(
            "x",
            format!("must be between 0 and {MAX_X} (inclusive), got {}", reach.x),
        ));
    }
    if sub_reaches < 1 {
        return Err(RoutingError::invalid("sub_reaches", "must be at least 1"));
    }
    if inflow_len == 0 {
        return Err(RoutingError::invalid("inflow", "series is empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reach() -> ReachParams {
        ReachParams::new(TimeDelta::hours(1), 0.25, TimeDelta::minutes(15))
    }

    fn rejected_name(result: RoutingResult<()>) -> &'static str {
        match result {
            Err(RoutingError::InvalidParameter { name, .. }) => name,
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn accepts_valid_parameters() {
        assert!(validate(&reach(), 1, 4).is_ok());
        assert!(validate(&reach(), 12, 1).is_ok());
    }

    #[test]
    fn accepts_x_bounds() {
        for x in [0.0, MAX_X] {
            let r = ReachParams { x, ..reach() };
            assert!(validate(&r, 1, 4).is_ok(), "x={x} should be accepted");
        }
    }

    #[test]
    fn rejects_non_positive_k() {
        for k in [TimeDelta::zero(), TimeDelta::seconds(-60)] {
            let r = ReachParams { k, ..reach() };
            assert_eq!(rejected_name(validate(&r, 1, 4)), "k");
        }
    }

    #[test]
    fn rejects_non_positive_time_step() {
        let r = ReachParams {
            time_step: TimeDelta::zero(),
            ..reach()
        };
        assert_eq!(rejected_name(validate(&r, 1, 4)), "time_step");
    }

    #[test]
    fn rejects_x_out_of_range() {
        for x in [-0.01, 0.51, f64::NAN] {
            let r = ReachParams { x, ..reach() };
            assert_eq!(rejected_name(validate(&r, 1, 4)), "x");
        }
    }

    #[test]
    fn rejects_zero_sub_reaches() {
        assert_eq!(rejected_name(validate(&reach(), 0, 4)), "sub_reaches");
    }

    #[test]
    fn rejects_empty_inflow() {
        assert_eq!(rejected_name(validate(&reach(), 1, 0)), "inflow");
    }

    #[test]
    fn converts_durations_to_seconds() {
        assert_eq!(reach().k_seconds(), 3600.0);
        assert_eq!(reach().time_step_seconds(), 900.0);
        assert_eq!(seconds(TimeDelta::milliseconds(1500)), 1.5);
    }

    #[test]
    fn keeps_sub_millisecond_precision() {
        assert_eq!(seconds(TimeDelta::microseconds(1500)), 0.0015);
        assert_eq!(seconds(TimeDelta::microseconds(500)), 0.0005);
        assert_eq!(seconds(TimeDelta::nanoseconds(1)), 1e-9);
        assert_eq!(seconds(TimeDelta::microseconds(-500)), -0.0005);
    }

    #[test]
    fn accepts_sub_millisecond_durations() {
        let r = ReachParams::new(
            TimeDelta::microseconds(500),
            0.25,
            TimeDelta::microseconds(500),
        );
        assert!(validate(&r, 1, 3).is_ok());
        assert!(r.k_seconds() > 0.0);
        assert!(r.time_step_seconds() > 0.0);
    }
}
