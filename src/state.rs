use crate::coefficients::RoutingCoefficients;

// Previous time step values carried through the recurrence for one reach
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReachState {
    pub previous_inflow: f64,
    pub previous_outflow: f64,
}

impl ReachState {
    /// State "before" the first sample: the reach is assumed to be in
    /// equilibrium with its first inflow, so I[-1] = I[0].
    pub fn new(first_inflow: f64, initial_outflow: f64) -> Self {
        ReachState {
            previous_inflow: first_inflow,
            previous_outflow: initial_outflow,
        }
    }

    /// Advance one time step and return the new outflow.
    #[inline(always)]
    pub fn step(&mut self, coefficients: &RoutingCoefficients, inflow: f64) -> f64 {
        let outflow = coefficients.apply(inflow, self.previous_inflow, self.previous_outflow);
        self.update(inflow, outflow);
        outflow
    }

    pub fn update(&mut self, inflow: f64, outflow: f64) {
        self.previous_inflow = inflow;
        self.previous_outflow = outflow;
    }
}
