// src/ui.rs
use crate::config::Config; // Server settings shared through web::Data
use crate::error::{SimError, SimResult}; // Error type surfaced to the browser as a message
use crate::logic::{grid_len, integrate, Trajectory}; // Fixed-step RK4 integrator and its output
use crate::math::{PendulumModel, State, DEFAULT_GRAVITY}; // Physical model of the two links
use crate::plot::{self, PlotKind}; // Phase-portrait rendering
use crate::storage::{self, DEFAULT_ARCHIVE_NAME}; // Trajectory archive on disk
use actix_web::{http::StatusCode, web, HttpResponse, Result}; // Actix-web types for request handling and HTTP responses
use serde::{Deserialize, Serialize}; // Serde traits for JSON (de)serialization
use tracing::{info, warn}; // Request outcome logging

fn default_gravity() -> f64 {
    DEFAULT_GRAVITY
}

fn default_method() -> String {
    "rk4".to_string()
}

#[derive(Deserialize, Debug, Clone)]
pub struct SimParams {
    pub l1: f64,     // Length of the upper link (m)
    pub l2: f64,     // Length of the lower link (m)
    pub m1: f64,     // Mass of the upper bob (kg)
    pub m2: f64,     // Mass of the lower bob (kg)
    #[serde(default = "default_gravity")]
    pub g: f64,      // Gravitational acceleration (m/s²)
    pub theta1: f64, // Initial angle of link 1 from vertical (rad)
    pub theta2: f64, // Initial angle of link 2 from vertical (rad)
    pub omega1: f64, // Initial angular velocity of link 1 (rad/s)
    pub omega2: f64, // Initial angular velocity of link 2 (rad/s)
    pub t_max: f64,  // Simulation horizon (s)
    pub dt: f64,     // Fixed integration step (s)
    #[serde(default = "default_method")]
    pub method: String, // Integration scheme name; only "rk4" is accepted
}

impl SimParams {
    pub fn initial_state(&self) -> State {
        [self.theta1, self.theta2, self.omega1, self.omega2]
    }

    /// Builds the model and integrates, refusing grids larger than `max_samples`.
    pub fn run(&self, max_samples: usize) -> SimResult<(PendulumModel, Trajectory)> {
        let model = PendulumModel::with_gravity(self.l1, self.l2, self.m1, self.m2, self.g)?;
        if grid_len(self.t_max, self.dt)? > max_samples {
            return Err(SimError::InvalidArgument {
                what: "requested time grid exceeds the configured sample limit",
            });
        }
        let trajectory = integrate(&model, &self.initial_state(), self.t_max, self.dt, &self.method)?;
        Ok((model, trajectory))
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SimResponse {
    pub success: bool,              // Whether the simulation succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,      // Error message when success is false
    pub time: Vec<f64>,             // Time grid t[0..N]
    pub states: Vec<State>,         // State rows Y[0..N]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation_data: Option<AnimationData>, // Cartesian frames for the browser animation
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AnimationData {
    pub positions: Vec<[f64; 4]>, // Per frame: [x1, y1, x2, y2]
    pub limit: f64,               // Half-width of the square viewport
    pub interval_ms: u64,         // Real-time delay between frames
}

impl AnimationData {
    fn new(model: &PendulumModel, trajectory: &Trajectory, dt: f64) -> Self {
        let positions = trajectory
            .states()
            .iter()
            .map(|s| {
                let [(x1, y1), (x2, y2)] = model.positions(s);
                [x1, y1, x2, y2]
            })
            .collect();
        Self {
            positions,
            limit: model.reach() * 1.1, // 10% margin around the fully extended chain
            interval_ms: (1000.0 * dt).round().max(1.0) as u64,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PlotResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub image: String, // PNG as a data URL
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub path: String,  // Location of the written archive
    pub samples: usize,
}

fn failure_status(err: &SimError) -> StatusCode {
    if err.is_caller_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn sim_failure(err: SimError) -> HttpResponse {
    warn!(error = %err, "simulation request rejected");
    HttpResponse::build(failure_status(&err)).json(SimResponse {
        success: false,
        error: Some(err.to_string()),
        time: vec![],
        states: vec![],
        animation_data: None,
    })
}

pub async fn simulate_handler(
    config: web::Data<Config>,
    params: web::Json<SimParams>,
) -> Result<HttpResponse> {
    let params = params.into_inner();
    let max_samples = config.max_samples;
    let dt = params.dt;

    // Integration is CPU-bound, keep it off the async workers
    let outcome = web::block(move || params.run(max_samples)).await?;
    let (model, trajectory) = match outcome {
        Ok(run) => run,
        Err(err) => return Ok(sim_failure(err)),
    };

    let animation_data = AnimationData::new(&model, &trajectory, dt);
    info!(samples = trajectory.len(), "simulation served");
    let (time, states) = trajectory.into_parts();
    Ok(HttpResponse::Ok().json(SimResponse {
        success: true,
        error: None,
        time,
        states,
        animation_data: Some(animation_data),
    }))
}

pub async fn plot_handler(
    config: web::Data<Config>,
    kind: web::Path<String>,
    params: web::Json<SimParams>,
) -> Result<HttpResponse> {
    let params = params.into_inner();
    let max_samples = config.max_samples;
    let kind = kind.into_inner();

    let outcome = web::block(move || -> SimResult<String> {
        let kind = kind.parse::<PlotKind>()?;
        let (_, trajectory) = params.run(max_samples)?;
        plot::render_data_url(kind, &trajectory)
    })
    .await?;

    match outcome {
        Ok(image) => Ok(HttpResponse::Ok().json(PlotResponse {
            success: true,
            error: None,
            image,
        })),
        Err(err) => {
            warn!(error = %err, "plot request rejected");
            Ok(HttpResponse::build(failure_status(&err)).json(PlotResponse {
                success: false,
                error: Some(err.to_string()),
                image: String::new(),
            }))
        }
    }
}

pub async fn save_handler(
    config: web::Data<Config>,
    params: web::Json<SimParams>,
) -> Result<HttpResponse> {
    let params = params.into_inner();
    let max_samples = config.max_samples;
    let target = config.output_dir.join(DEFAULT_ARCHIVE_NAME);

    let outcome = match web::block(move || params.run(max_samples)).await? {
        Ok((_, trajectory)) => storage::save_trajectory(&target, &trajectory)
            .await
            .map(|path| (path, trajectory.len())),
        Err(err) => Err(err),
    };

    match outcome {
        Ok((path, samples)) => Ok(HttpResponse::Ok().json(SaveResponse {
            success: true,
            error: None,
            path: path.display().to_string(),
            samples,
        })),
        Err(err) => {
            warn!(error = %err, "save request failed");
            Ok(HttpResponse::build(failure_status(&err)).json(SaveResponse {
                success: false,
                error: Some(err.to_string()),
                path: String::new(),
                samples: 0,
            }))
        }
    }
}

/// Mounts the JSON API under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/simulate", web::post().to(simulate_handler))
            .route("/plot/{kind}", web::post().to(plot_handler))
            .route("/save", web::post().to(save_handler)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SimParams {
        SimParams {
            l1: 2.0,
            l2: 2.0,
            m1: 1.0,
            m2: 3.0,
            g: DEFAULT_GRAVITY,
            theta1: 0.0,
            theta2: 0.0,
            omega1: 0.0,
            omega2: 0.0,
            t_max: 1.0,
            dt: 0.5,
            method: default_method(),
        }
    }

    #[test]
    fn run_respects_sample_limit() {
        let err = params().run(2).unwrap_err();
        assert!(matches!(err, SimError::InvalidArgument { .. }));
        let (_, traj) = params().run(3).unwrap();
        assert_eq!(traj.len(), 3);
    }

    #[test]
    fn animation_frames_follow_the_links() {
        let (model, traj) = params().run(10).unwrap();
        let anim = AnimationData::new(&model, &traj, 0.5);
        assert_eq!(anim.positions.len(), 3);
        assert_eq!(anim.positions[0], [0.0, -2.0, 0.0, -4.0]);
        assert!((anim.limit - 4.4).abs() < 1e-12);
        assert_eq!(anim.interval_ms, 500);
    }

    #[test]
    fn caller_errors_map_to_bad_request() {
        let err = SimError::InvalidParameter { what: "x" };
        assert_eq!(failure_status(&err), StatusCode::BAD_REQUEST);
        let err = SimError::Plot { message: "x".into() };
        assert_eq!(failure_status(&err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
