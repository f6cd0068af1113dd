// src/math.rs
// Physical model of the two-link pendulum: fixed parameters plus the state derivative from the Lagrangian closed form.
// The state is [θ1, θ2, ω1, ω2] (angles from vertical in radians, angular velocities in rad/s); angles are not wrapped.
// The derivative is pure: the model is an immutable value and every call depends only on its argument.

use crate::error::{SimError, SimResult};

/// Ordered state vector `[theta1, theta2, omega1, omega2]`.
pub type State = [f64; 4];

/// Standard gravitational acceleration used when none is supplied (m/s²).
pub const DEFAULT_GRAVITY: f64 = 9.81;

/// Below this magnitude a coupled-inertia denominator counts as degenerate.
pub const DEGENERACY_EPSILON: f64 = 1e-8;

/// Policy applied when a coupled-inertia denominator falls below [`DEGENERACY_EPSILON`].
///
/// `ZeroAcceleration` momentarily freezes both angular accelerations instead of
/// dividing by a vanishing denominator. It trades physical fidelity for numerical
/// stability and is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StabilityGuard {
    /// Force both accelerations to exactly `0.0`.
    #[default]
    ZeroAcceleration,
    /// Clamp each denominator to `±DEGENERACY_EPSILON` and evaluate the closed form anyway.
    ClampDenominator,
}

impl StabilityGuard {
    /// Whether either denominator is inside the degenerate band.
    pub fn is_degenerate(denom1: f64, denom2: f64) -> bool {
        denom1.abs() < DEGENERACY_EPSILON || denom2.abs() < DEGENERACY_EPSILON
    }

    fn clamp(denom: f64) -> f64 {
        if denom.abs() >= DEGENERACY_EPSILON {
            denom
        } else if denom.is_sign_negative() {
            -DEGENERACY_EPSILON
        } else {
            DEGENERACY_EPSILON
        }
    }
}

/// Immutable double pendulum parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendulumModel {
    l1: f64,   // Length of the upper link (m).
    l2: f64,   // Length of the lower link (m).
    m1: f64,   // Mass of the upper bob (kg).
    m2: f64,   // Mass of the lower bob (kg).
    g: f64,    // Gravitational acceleration (m/s²).
    guard: StabilityGuard,
}

impl PendulumModel {
    /// Builds a model with standard gravity. Fails with `InvalidParameter` on any non-positive length or mass.
    pub fn new(l1: f64, l2: f64, m1: f64, m2: f64) -> SimResult<Self> {
        Self::with_gravity(l1, l2, m1, m2, DEFAULT_GRAVITY)
    }

    /// Builds a model with an explicit gravitational acceleration.
    pub fn with_gravity(l1: f64, l2: f64, m1: f64, m2: f64, g: f64) -> SimResult<Self> {
        // `!(x > 0.0)` also rejects NaN.
        if !(l1 > 0.0) || !(l2 > 0.0) {
            return Err(SimError::InvalidParameter {
                what: "link lengths L1 and L2 must be positive",
            });
        }
        if !(m1 > 0.0) || !(m2 > 0.0) {
            return Err(SimError::InvalidParameter {
                what: "masses m1 and m2 must be positive",
            });
        }
        if !(g > 0.0) {
            return Err(SimError::InvalidParameter {
                what: "gravitational acceleration g must be positive",
            });
        }
        if ![l1, l2, m1, m2, g].iter().all(|v| v.is_finite()) {
            return Err(SimError::InvalidParameter {
                what: "pendulum parameters must be finite",
            });
        }
        Ok(Self {
            l1,
            l2,
            m1,
            m2,
            g,
            guard: StabilityGuard::default(),
        })
    }

    /// Returns a copy of this model using a different degeneracy policy.
    pub fn with_guard(self, guard: StabilityGuard) -> Self {
        Self { guard, ..self }
    }

    pub fn l1(&self) -> f64 {
        self.l1
    }

    pub fn l2(&self) -> f64 {
        self.l2
    }

    pub fn m1(&self) -> f64 {
        self.m1
    }

    pub fn m2(&self) -> f64 {
        self.m2
    }

    pub fn g(&self) -> f64 {
        self.g
    }

    pub fn guard(&self) -> StabilityGuard {
        self.guard
    }

    /// Total reach of the chain, used to size the animation viewport.
    pub fn reach(&self) -> f64 {
        self.l1 + self.l2
    }

    /// Time derivative of `state`: `[ω1, ω2, α1, α2]`.
    ///
    /// Defined for every finite input. When the coupled-inertia denominators
    /// vanish the configured [`StabilityGuard`] decides the accelerations.
    pub fn derivative(&self, state: &State) -> State {
        let [theta1, theta2, omega1, omega2] = *state;
        let (l1, l2, m1, m2, g) = (self.l1, self.l2, self.m1, self.m2, self.g);

        let delta = theta1 - theta2; // Relative angle between the links
        let sin_d = delta.sin();
        let cos_d = delta.cos();

        let coupling = m1 + m2 * sin_d * sin_d; // m1 + m2 sin²Δ, shared by both links.
        let mut denom1 = l1 * coupling;
        let mut denom2 = l2 * coupling;

        if StabilityGuard::is_degenerate(denom1, denom2) {
            match self.guard {
                StabilityGuard::ZeroAcceleration => {
                    tracing::trace!(denom1, denom2, "degenerate denominators, accelerations zeroed");
                    return [omega1, omega2, 0.0, 0.0];
                }
                StabilityGuard::ClampDenominator => {
                    tracing::trace!(denom1, denom2, "degenerate denominators, clamped");
                    denom1 = StabilityGuard::clamp(denom1);
                    denom2 = StabilityGuard::clamp(denom2);
                }
            }
        }

        let w1_sq = omega1.powi(2); // Centripetal term of the upper link
        let w2_sq = omega2.powi(2); // Centripetal term of the lower link

        let num1 = m2 * g * theta2.sin() * cos_d
            - m2 * sin_d * (l1 * w1_sq * cos_d + l2 * w2_sq)
            - (m1 + m2) * g * theta1.sin();
        let alpha1 = num1 / denom1;

        let num2 = (m1 + m2) * (l1 * w1_sq * sin_d - g * theta2.sin() + g * theta1.sin() * cos_d)
            + m2 * l2 * w2_sq * sin_d * cos_d;
        let alpha2 = num2 / denom2;

        [omega1, omega2, alpha1, alpha2] // dθ/dt = ω, dω/dt = α
    }

    /// Cartesian positions of both bobs with the pivot at the origin and y pointing up.
    pub fn positions(&self, state: &State) -> [(f64, f64); 2] {
        let x1 = self.l1 * state[0].sin(); // Upper bob, measured from the pivot
        let y1 = -self.l1 * state[0].cos();
        let x2 = x1 + self.l2 * state[1].sin(); // Lower bob hangs off the upper one
        let y2 = y1 - self.l2 * state[1].cos();
        [(x1, y1), (x2, y2)]
    }
}
