//! models — simulator adapters, forcing data and the composite sub-basin model.
//!
//! Purpose
//! -------
//! Define the seam between the calibration engine and the hydrological
//! models it calibrates. The engine only sees two traits: [`Simulator`]
//! (parameters + forcing → outlet series) and [`Delay`] (series + lag →
//! lagged series). [`CompositeModel`] combines them into the single or dual
//! model evaluated at each chain node.
//!
//! Key behaviors
//! -------------
//! - [`Forcing`] validates the shared precipitation / evapotranspiration
//!   series once, up front.
//! - [`CompositeModel`] splits `[head.., delay, tail..]` parameter vectors
//!   and produces the area-weighted outlet series.
//! - [`Gr4j`] and [`LinearLag`] are ready-to-use implementations of the two
//!   adapter traits.
//!
//! Invariants & assumptions
//! ------------------------
//! - Simulators are deterministic and return series of the forcing length.
//! - Parameter draws a simulator cannot use produce `+inf` series, never
//!   panics or errors.
//!
//! Testing notes
//! -------------
//! - Composite tests use counting toy simulators to check that the tail
//!   branch is skipped when its area weight is zero.

pub mod composite;
pub mod errors;
pub mod forcing;
pub mod gr4j;
pub mod lag;
pub mod simulator;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::composite::{CompositeModel, ParamBlocks, Tail};
pub use self::errors::{ModelError, ModelResult};
pub use self::forcing::Forcing;
pub use self::gr4j::Gr4j;
pub use self::lag::LinearLag;
pub use self::simulator::{Delay, Simulator};

pub mod prelude {
    pub use super::composite::CompositeModel;
    pub use super::errors::{ModelError, ModelResult};
    pub use super::forcing::Forcing;
    pub use super::gr4j::Gr4j;
    pub use super::lag::LinearLag;
    pub use super::simulator::{Delay, Simulator};
}
