use crate::coefficients::RoutingCoefficients;
use crate::state::ReachState;

/// Route an inflow hydrograph through a single reach.
///
/// Applies `O[t] = C0 * I[t] + C1 * I[t-1] + C2 * O[t-1]` for every sample,
/// with `I[-1] = I[0]` and `O[-1] = initial_outflow`. Each outflow depends on
/// the previous one, so the scan is strictly sequential.
///
/// The returned series always has the same length as `inflow`; an empty
/// inflow yields an empty outflow.
pub fn route_reach(
    inflow: &[f64],
    coefficients: &RoutingCoefficients,
    initial_outflow: f64,
) -> Vec<f64> {
    let Some(&first_inflow) = inflow.first() else {
        return Vec::new();
    };

    let mut state = ReachState::new(first_inflow, initial_outflow);
    inflow
        .iter()
        .map(|&current_inflow| state.step(coefficients, current_inflow))
        .collect()
}
