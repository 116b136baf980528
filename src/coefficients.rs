use crate::error::{RoutingError, RoutingResult};
use crate::params::ReachParams;

/// Weights applied to the current inflow, previous inflow and previous outflow.
///
/// Derived once per (sub-)reach. `c0 + c1 + c2 == 1` up to rounding, which is
/// what keeps the recurrence mass conserving at steady state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutingCoefficients {
    pub c0: f64,
    pub c1: f64,
    pub c2: f64,
}

impl RoutingCoefficients {
    /// Derive coefficients from K and the time step (both in seconds) and X.
    ///
    /// ```text
    /// denom = 2K(1 - X) + dt
    /// C0 = (dt - 2KX) / denom
    /// C1 = (dt + 2KX) / denom
    /// C2 = (2K(1 - X) - dt) / denom
    /// ```
    pub fn derive(k: f64, x: f64, dt: f64) -> RoutingResult<Self> {
        let storage = 2.0 * k * (1.0 - x);
        let wedge = 2.0 * k * x;
        let denom = storage + dt;
        if denom == 0.0 {
            return Err(RoutingError::DegenerateCoefficients { k, x, time_step: dt });
        }

        Ok(RoutingCoefficients {
            c0: (dt - wedge) / denom,
            c1: (dt + wedge) / denom,
            c2: (storage - dt) / denom,
        })
    }

    pub fn for_reach(reach: &ReachParams) -> RoutingResult<Self> {
        Self::derive(reach.k_seconds(), reach.x, reach.time_step_seconds())
    }

    /// Outflow for one step of the recurrence.
    #[inline(always)]
    pub fn apply(&self, inflow: f64, previous_inflow: f64, previous_outflow: f64) -> f64 {
        self.c0 * inflow + self.c1 * previous_inflow + self.c2 * previous_outflow
    }

    pub fn sum(&self) -> f64 {
        self.c0 + self.c1 + self.c2
    }

    /// True when no coefficient is negative, i.e. 2KX <= dt <= 2K(1 - X).
    pub fn is_stable(&self) -> bool {
        self.c0 >= 0.0 && self.c1 >= 0.0 && self.c2 >= 0.0
    }
}
