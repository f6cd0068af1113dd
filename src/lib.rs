// src/lib.rs
// Double pendulum simulator: Lagrangian model, fixed-step RK4 integrator, and the web collaborators around them.

pub mod config;
pub mod error;
pub mod logic;
pub mod math;
pub mod plot;
pub mod storage;
pub mod ui;

pub use error::{SimError, SimResult};
pub use logic::{grid_len, integrate, integrate_with, Method, Trajectory};
pub use math::{PendulumModel, StabilityGuard, State, DEFAULT_GRAVITY, DEGENERACY_EPSILON};
