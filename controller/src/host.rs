use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::{net::TcpListener, sync::Mutex};
use tracing::{info, warn};

use heatpump_common::{ClimateMode, RuntimeConfig};

use crate::{
    sim::{Simulation, StepReport},
    store::AppStore,
};

#[derive(Clone)]
struct AppState {
    sim: Arc<Mutex<Simulation>>,
    store: AppStore,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store = AppStore::from_env();
    let mut runtime = store.load_runtime_config().await.unwrap_or_else(|err| {
        warn!("failed to load runtime config from store: {err:#}");
        RuntimeConfig::default()
    });
    runtime.sanitize();

    if !store.has_runtime_config().await {
        if let Err(err) = store.save_runtime_config(&runtime).await {
            warn!("failed to write default runtime config: {err:#}");
        }
    }

    let saved = store.load_unit_states().await.unwrap_or_else(|err| {
        warn!("failed to load unit states from store: {err:#}");
        Default::default()
    });

    let sim = Simulation::from_config(&runtime, &saved).context("invalid runtime config")?;
    info!(
        "loaded {} units, {} fuel cells",
        runtime.units.len(),
        runtime.fuel_cells.len()
    );

    let app_state = AppState {
        sim: Arc::new(Mutex::new(sim)),
        store,
    };

    spawn_control_loop(
        app_state.clone(),
        runtime.simulation.step_ms,
        runtime.simulation.save_interval_steps,
    );

    let app = router(app_state.clone());

    let port = std::env::var("HEATPUMP_HTTP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind inspect server at {addr}"))?;

    info!("inspect api listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    persist_unit_states(&app_state).await?;
    info!("unit states saved, shutting down");
    Ok(())
}

fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/units", get(handle_get_units))
        .route("/api/units/{id}", get(handle_get_unit))
        .route("/api/fuel", get(handle_get_fuel))
        .route("/api/world", get(handle_get_world))
        .with_state(app_state)
}

fn spawn_control_loop(app_state: AppState, step_ms: u64, save_interval_steps: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(step_ms.max(1)));
        let save_interval_steps = save_interval_steps.max(1);

        loop {
            interval.tick().await;

            let report = {
                let mut sim = app_state.sim.lock().await;
                sim.step()
            };

            if should_persist(&report, save_interval_steps) {
                if let Err(err) = persist_unit_states(&app_state).await {
                    warn!("periodic unit state save failed: {err:#}");
                }
            }
        }
    });
}

fn should_persist(report: &StepReport, save_interval_steps: u64) -> bool {
    !report.mode_changes.is_empty() || report.step % save_interval_steps.max(1) == 0
}

async fn persist_unit_states(app_state: &AppState) -> anyhow::Result<()> {
    let (states, heating) = {
        let sim = app_state.sim.lock().await;
        let heating = sim
            .mode_counts()
            .get(&ClimateMode::Heating)
            .copied()
            .unwrap_or(0);
        (sim.saved_states(), heating)
    };

    app_state.store.save_unit_states(&states).await?;
    info!("saved {} unit states ({heating} heating)", states.len());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}

async fn handle_get_units(State(state): State<AppState>) -> impl IntoResponse {
    let statuses = state.sim.lock().await.unit_statuses();
    Json(statuses)
}

async fn handle_get_unit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let status = state.sim.lock().await.unit_status(&id);
    match status {
        Some(status) => Json(status).into_response(),
        None => error_response(StatusCode::NOT_FOUND, &format!("Unknown unit '{id}'")),
    }
}

async fn handle_get_fuel(State(state): State<AppState>) -> impl IntoResponse {
    let cells = state.sim.lock().await.fuel_cells();
    Json(cells)
}

async fn handle_get_world(State(state): State<AppState>) -> impl IntoResponse {
    let world = state.sim.lock().await.world();
    Json(world)
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}
