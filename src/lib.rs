//! Muskingum flood routing.
//!
//! Computes the outflow hydrograph of a river reach from its inflow
//! hydrograph. A long reach can be split into a cascade of shorter sub-reaches
//! routed in series, which keeps the explicit recurrence well behaved when the
//! storage constant is large compared to the time step.

pub mod coefficients;
pub mod config;
pub mod error;
pub mod io;
pub mod muskingum;
pub mod params;
pub mod routing;
pub mod run;
pub mod state;

pub use coefficients::RoutingCoefficients;
pub use error::{RoutingError, RoutingResult};
pub use muskingum::route_reach;
pub use params::{ReachParams, validate};
pub use routing::{cascade, route, route_many, route_with_initial};
