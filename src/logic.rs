// src/logic.rs
// Fixed-step integration of the double pendulum: time-grid construction and the classical RK4 loop.
// Inputs are validated up front so a failing call never returns a partial trajectory.
// The grid keeps every sample i·dt with i·dt <= t_max + dt/2, so the last sample lands within half a step of t_max, on either side.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{SimError, SimResult};
use crate::math::{PendulumModel, State};

/// Integration schemes the integrator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// Classical fourth-order Runge–Kutta.
    #[default]
    Rk4,
}

impl FromStr for Method {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("rk4") {
            Ok(Method::Rk4)
        } else {
            Err(SimError::UnsupportedMethod {
                method: s.to_string(),
            })
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Rk4 => f.write_str("rk4"),
        }
    }
}

/// Result of one run: parallel time samples and states.
///
/// Serialized as `{ "t": [...], "Y": [[θ1, θ2, ω1, ω2], ...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    #[serde(rename = "t")]
    time: Vec<f64>,
    #[serde(rename = "Y")]
    states: Vec<State>,
}

impl Trajectory {
    /// Pairs a time grid with its states. Fails when the lengths disagree or the grid is empty.
    pub fn from_parts(time: Vec<f64>, states: Vec<State>) -> SimResult<Self> {
        if time.len() != states.len() {
            return Err(SimError::InvalidArgument {
                what: "time and state sequences must have the same length",
            });
        }
        if time.is_empty() {
            return Err(SimError::InvalidArgument {
                what: "trajectory must contain at least one sample",
            });
        }
        Ok(Self { time, states })
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Number of samples `N`.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// One state component across the whole run (0 = θ1, 1 = θ2, 2 = ω1, 3 = ω2).
    pub fn component(&self, index: usize) -> Vec<f64> {
        self.states.iter().map(|s| s[index]).collect()
    }

    /// Splits the trajectory back into its time grid and states.
    pub fn into_parts(self) -> (Vec<f64>, Vec<State>) {
        (self.time, self.states)
    }
}

fn validate_step(t_max: f64, dt: f64) -> SimResult<()> {
    // Negated comparisons so that NaN is rejected as well.
    if !(dt > 0.0) {
        return Err(SimError::InvalidArgument {
            what: "step size must be positive",
        });
    }
    if !(t_max > 0.0) {
        return Err(SimError::InvalidArgument {
            what: "t_max must be positive",
        });
    }
    if !t_max.is_finite() || !dt.is_finite() {
        return Err(SimError::InvalidArgument {
            what: "t_max and step size must be finite",
        });
    }
    Ok(())
}

/// Largest grid a single state buffer can hold.
pub const MAX_GRID_LEN: usize = isize::MAX as usize / std::mem::size_of::<State>();

fn grid_too_large() -> SimError {
    SimError::InvalidArgument {
        what: "requested time grid is too large",
    }
}

/// Length `N` of the grid `integrate` would build for `t_max` and `dt`.
///
/// Lets callers bound the cost of a run before starting it. Grids longer
/// than [`MAX_GRID_LEN`] are rejected with `InvalidArgument`.
pub fn grid_len(t_max: f64, dt: f64) -> SimResult<usize> {
    validate_step(t_max, dt)?;
    let limit = t_max + dt / 2.0; // Half-step tolerance so t_max itself is not lost to rounding
    let ratio = (limit / dt).floor(); // Index of the last sample, before rounding fix-ups
    if !(ratio < MAX_GRID_LEN as f64) {
        return Err(grid_too_large());
    }
    // Estimate from the ratio, then settle on the exact inclusion rule i·dt <= limit.
    let mut n = (ratio as usize).checked_add(1).ok_or_else(grid_too_large)?;
    while n > 1 && (n - 1) as f64 * dt > limit {
        n -= 1; // Estimate overshot: last sample lies past the limit
    }
    while n as f64 * dt <= limit {
        n = n.checked_add(1).ok_or_else(grid_too_large)?; // Estimate undershot by rounding
    }
    if n > MAX_GRID_LEN {
        return Err(grid_too_large());
    }
    Ok(n)
}

fn time_grid(n: usize, dt: f64) -> Vec<f64> {
    (0..n).map(|i| i as f64 * dt).collect()
}

/// One classical RK4 step of `f` from `y`.
fn rk4_step<F>(f: &mut F, y: &State, dt: f64) -> State
where
    F: FnMut(&State) -> State,
{
    let half = 0.5 * dt;
    let k1 = f(y);
    let k2 = f(&std::array::from_fn(|j| y[j] + half * k1[j])); // y + (dt/2) k1
    let k3 = f(&std::array::from_fn(|j| y[j] + half * k2[j])); // y + (dt/2) k2
    let k4 = f(&std::array::from_fn(|j| y[j] + dt * k3[j])); // y + dt k3
    let sixth = dt / 6.0;
    std::array::from_fn(|j| y[j] + sixth * (k1[j] + 2.0 * k2[j] + 2.0 * k3[j] + k4[j]))
}

/// Runs RK4 over an `n`-sample grid. `f` is called exactly `4 (n - 1)` times.
fn rk4_trajectory<F>(mut f: F, y0: State, n: usize, dt: f64) -> Vec<State>
where
    F: FnMut(&State) -> State,
{
    let mut states = Vec::with_capacity(n); // One row per grid sample
    states.push(y0); // Y[0] is the caller's state, untouched
    let mut y = y0;
    for _ in 1..n {
        // N - 1 intervals
        y = rk4_step(&mut f, &y, dt);
        states.push(y);
    }
    states
}

/// Integrates `model` from `y0` over `[0, t_max]` with fixed step `dt`.
///
/// `y0` must hold exactly four finite values and `method` must name RK4
/// (case-insensitive). All checks run before any integration work.
pub fn integrate(
    model: &PendulumModel,
    y0: &[f64],
    t_max: f64,
    dt: f64,
    method: &str,
) -> SimResult<Trajectory> {
    let y0: State = y0.try_into().map_err(|_| SimError::InvalidArgument {
        what: "initial state must have exactly 4 components",
    })?;
    validate_step(t_max, dt)?;
    let method = method.parse::<Method>()?;
    integrate_with(model, y0, t_max, dt, method)
}

/// Typed form of [`integrate`].
pub fn integrate_with(
    model: &PendulumModel,
    y0: State,
    t_max: f64,
    dt: f64,
    method: Method,
) -> SimResult<Trajectory> {
    if !y0.iter().all(|v| v.is_finite()) {
        return Err(SimError::InvalidArgument {
            what: "initial state must be finite",
        });
    }
    let n = grid_len(t_max, dt)?;
    debug!(?y0, t_max, dt, %method, samples = n, "starting integration");

    let states = match method {
        Method::Rk4 => rk4_trajectory(|y| model.derivative(y), y0, n, dt),
    };

    info!(samples = n, dt, %method, "integration finished");
    Ok(Trajectory {
        time: time_grid(n, dt),
        states,
    })
}
