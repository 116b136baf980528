use thiserror::Error;

/// Errors raised by the routing core before or during coefficient derivation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutingError {
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error(
        "Degenerate routing coefficients: 2K(1 - X) + time_step is zero (K={k}s, X={x}, time_step={time_step}s)"
    )]
    DegenerateCoefficients { k: f64, x: f64, time_step: f64 },
}

impl RoutingError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        RoutingError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Convenience type for `Result<T, RoutingError>`.
pub type RoutingResult<T> = Result<T, RoutingError>;
