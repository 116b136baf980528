use crate::coefficients::RoutingCoefficients;
use crate::error::{RoutingError, RoutingResult};
use crate::muskingum::route_reach;
use crate::params::{ReachParams, validate};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Route an inflow series through `sub_reaches` Muskingum reaches in series.
///
/// The storage constant is split evenly, each sub-reach getting `K / N` with
/// the same X and time step. Stage 1 starts from `initial_outflow`; every later
/// stage routes the previous stage's outflow and starts in equilibrium with its
/// own first sample.
///
/// With `sub_reaches == 1` this is exactly [`route_reach`] with the full K.
/// Only the sub-reach count is checked here; see [`route_with_initial`] for
/// full validation.
pub fn cascade(
    inflow: &[f64],
    reach: &ReachParams,
    sub_reaches: usize,
    initial_outflow: f64,
) -> RoutingResult<Vec<f64>> {
    let dt = reach.time_step_seconds();

    if sub_reaches == 0 {
        return Err(RoutingError::invalid("sub_reaches", "must be at least 1"));
    }
    if sub_reaches == 1 {
        let coefficients = RoutingCoefficients::derive(reach.k_seconds(), reach.x, dt)?;
        check_stability(&coefficients, reach.k_seconds(), dt);
        return Ok(route_reach(inflow, &coefficients, initial_outflow));
    }

    let k_sub = reach.k_seconds() / sub_reaches as f64;
    let coefficients = RoutingCoefficients::derive(k_sub, reach.x, dt)?;
    check_stability(&coefficients, k_sub, dt);

    let mut outflow = route_reach(inflow, &coefficients, initial_outflow);
    for stage in 2..=sub_reaches {
        let Some(&stage_initial) = outflow.first() else {
            break;
        };
        debug!(stage, sub_reaches, stage_initial, "Routing sub-reach");
        outflow = route_reach(&outflow, &coefficients, stage_initial);
    }

    Ok(outflow)
}

/// Route with an explicit outflow at time index -1.
///
/// Fails with `InvalidParameter` before any computation when the reach,
/// sub-reach count or series length is invalid.
pub fn route_with_initial(
    inflow: &[f64],
    reach: &ReachParams,
    sub_reaches: usize,
    initial_outflow: f64,
) -> RoutingResult<Vec<f64>> {
    validate(reach, sub_reaches, inflow.len())?;
    cascade(inflow, reach, sub_reaches, initial_outflow)
}

/// Route an inflow series, defaulting the initial outflow to `inflow[0]`.
///
/// This is the only place the default is resolved; omitting the initial
/// outflow is identical to passing the first inflow sample explicitly.
///
/// # Example
///
/// ```
/// use chrono::TimeDelta;
/// use muskingum_rs::{ReachParams, route};
///
/// let reach = ReachParams::new(TimeDelta::hours(1), 0.25, TimeDelta::minutes(15));
/// let outflow = route(&[1.0, 2.0, 3.0, 5.0, 4.0, 2.0, 1.0], &reach, 1, None).unwrap();
/// assert_eq!(outflow.len(), 7);
/// ```
pub fn route(
    inflow: &[f64],
    reach: &ReachParams,
    sub_reaches: usize,
    initial_outflow: Option<f64>,
) -> RoutingResult<Vec<f64>> {
    validate(reach, sub_reaches, inflow.len())?;
    let initial_outflow = initial_outflow.unwrap_or(inflow[0]);
    cascade(inflow, reach, sub_reaches, initial_outflow)
}

/// Route several independent series through the same reach in parallel.
///
/// Series share no state, so each one is routed on its own rayon task. The
/// result keeps the input order. The first failing series aborts the batch.
pub fn route_many<S>(
    series: &[S],
    reach: &ReachParams,
    sub_reaches: usize,
    initial_outflow: Option<f64>,
) -> RoutingResult<Vec<Vec<f64>>>
where
    S: AsRef<[f64]> + Sync,
{
    route_many_with(series, reach, sub_reaches, initial_outflow, |_| {})
}

/// [`route_many`], calling `on_routed` with the position of each series as
/// soon as it has been routed successfully.
pub fn route_many_with<S, F>(
    series: &[S],
    reach: &ReachParams,
    sub_reaches: usize,
    initial_outflow: Option<f64>,
    on_routed: F,
) -> RoutingResult<Vec<Vec<f64>>>
where
    S: AsRef<[f64]> + Sync,
    F: Fn(usize) + Sync,
{
    series
        .par_iter()
        .enumerate()
        .map(|(position, inflow)| {
            let outflow = route(inflow.as_ref(), reach, sub_reaches, initial_outflow)?;
            on_routed(position);
            Ok(outflow)
        })
        .collect()
}

fn check_stability(coefficients: &RoutingCoefficients, k: f64, dt: f64) {
    debug!(
        c0 = coefficients.c0,
        c1 = coefficients.c1,
        c2 = coefficients.c2,
        k,
        dt,
        "Derived routing coefficients"
    );
    if !coefficients.is_stable() {
        warn!(
            k,
            dt,
            "Time step is outside [2KX, 2K(1-X)]; negative routing weights may cause dips or \
             oscillations. Adjust sub_reaches so K/N is comparable to the time step."
        );
    }
}
