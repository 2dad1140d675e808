//! pf-routing: route computation over the valve-gated plant network.
//!
//! Provides:
//! - Shortest route by segment count (breadth-first) through open valves
//! - Multi-leg composition through an intermediate unit's IN->OUT path
//! - Planning-mode suggestions that treat every valve as open
//!
//! "No route" is a normal outcome, modelled as a value, not an error.

pub mod finder;

pub use finder::{RouteFinder, RouteOutcome, RouteSuggestion};
