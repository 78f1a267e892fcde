//! HTTP feed of the map layout and its thermal timeline
//!
//! The timeline runs on a blocking task; handlers only read what it has
//! published so far.

use std::{
    convert::Infallible,
    net::SocketAddr,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, HeaderName},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use serde::Serialize;
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{error, info, warn};

use crate::{
    engine::{EngineBuilder, EngineSettings},
    map::{AllocationReport, FrameSnapshot},
    rng::RngManager,
    scenario::Scenario,
};

#[derive(Clone, Serialize)]
pub struct UiFrame {
    pub snapshot: FrameSnapshot,
    pub completed: bool,
}

#[derive(Clone, Serialize)]
pub struct StateEnvelope {
    pub scenario: String,
    pub total_frames: u64,
    pub allocation: AllocationReport,
    pub frame: Option<UiFrame>,
    pub completed: bool,
}

#[derive(Clone, Serialize)]
pub struct ThermalFrame {
    pub frame: u64,
    pub hour: f64,
    pub width: u32,
    pub height: u32,
    pub values: Vec<f64>,
}

struct AppState {
    broadcaster: broadcast::Sender<String>,
    latest_frame: Arc<Mutex<Option<UiFrame>>>,
    latest_thermal: Arc<Mutex<Option<ThermalFrame>>>,
    frames: Arc<Mutex<Vec<UiFrame>>>,
    rgb: Bytes,
    width: u32,
    height: u32,
    allocation: AllocationReport,
    total_frames: u64,
    scenario_name: String,
    simulation_done: Arc<AtomicBool>,
}

pub struct WebServerConfig {
    pub scenario: Scenario,
    pub frames: u64,
    pub snapshot_interval: u64,
    pub snapshot_dir: PathBuf,
    pub host: String,
    pub port: u16,
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        scenario,
        frames,
        snapshot_interval,
        snapshot_dir,
        host,
        port,
    } = config;

    let scenario_name = scenario.name.clone();
    let mut rng = RngManager::new(scenario.seed);
    let (mut map, allocation) = scenario.build_map(&mut rng)?;
    let rgb = map.rgb_image();
    let (width, height) = (rgb.width(), rgb.height());

    let settings = EngineSettings {
        scenario_name: scenario_name.clone(),
        timeline: scenario.timeline,
        snapshot_interval_frames: snapshot_interval,
        snapshot_dir,
    };
    let mut engine = EngineBuilder::new(settings).build();

    let (tx, _) = broadcast::channel::<String>(512);
    let latest_frame: Arc<Mutex<Option<UiFrame>>> = Arc::new(Mutex::new(None));
    let latest_thermal: Arc<Mutex<Option<ThermalFrame>>> = Arc::new(Mutex::new(None));
    let all_frames: Arc<Mutex<Vec<UiFrame>>> = Arc::new(Mutex::new(Vec::new()));
    let simulation_done = Arc::new(AtomicBool::new(false));

    let latest_for_sim = latest_frame.clone();
    let thermal_for_sim = latest_thermal.clone();
    let frames_for_sim = all_frames.clone();
    let done_for_sim = simulation_done.clone();
    let tx_for_sim = tx.clone();

    let sim_handle = tokio::task::spawn_blocking(move || -> Result<()> {
        engine.run_with_hook(&mut map, frames, |snapshot, map| {
            let completed = snapshot.frame + 1 >= frames;
            let image = map.thermal_image();
            let thermal = ThermalFrame {
                frame: snapshot.frame,
                hour: snapshot.hour,
                width: image.width(),
                height: image.height(),
                values: image.values().to_vec(),
            };
            *thermal_for_sim.lock().unwrap_or_else(PoisonError::into_inner) = Some(thermal);
            publish(
                UiFrame {
                    snapshot,
                    completed,
                },
                &latest_for_sim,
                &frames_for_sim,
                &tx_for_sim,
            );
        })?;
        done_for_sim.store(true, Ordering::SeqCst);
        Ok(())
    });

    let state = Arc::new(AppState {
        broadcaster: tx.clone(),
        latest_frame,
        latest_thermal,
        frames: all_frames,
        rgb: Bytes::from(rgb.into_bytes()),
        width,
        height,
        allocation,
        total_frames: frames,
        scenario_name: scenario_name.clone(),
        simulation_done,
    });

    let label = scenario_name.clone();
    tokio::spawn(async move {
        match sim_handle.await {
            Ok(Ok(())) => info!(scenario = %label, "timeline completed"),
            Ok(Err(err)) => error!("timeline error: {err:?}"),
            Err(err) => error!("timeline task failed: {err:?}"),
        }
    });

    let router = Router::new()
        .route("/api/state", get(latest_state))
        .route("/api/frames", get(frames_so_far))
        .route("/api/events", get(stream_events))
        .route("/api/rgb", get(rgb_image))
        .route("/api/thermal", get(thermal_image))
        .with_state(state);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid address {host}:{port}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("thermal feed for '{scenario_name}' live at http://{addr} (Ctrl+C to stop)");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn publish(
    frame: UiFrame,
    latest: &Mutex<Option<UiFrame>>,
    frames: &Mutex<Vec<UiFrame>>,
    tx: &broadcast::Sender<String>,
) {
    *latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame.clone());
    frames
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(frame.clone());
    match serde_json::to_string(&frame) {
        // no subscribers is not an error
        Ok(payload) => {
            let _ = tx.send(payload);
        }
        Err(err) => warn!("failed to encode frame {}: {err}", frame.snapshot.frame),
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down thermal feed");
}

async fn latest_state(State(state): State<Arc<AppState>>) -> Json<StateEnvelope> {
    let frame = state
        .latest_frame
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    Json(StateEnvelope {
        scenario: state.scenario_name.clone(),
        total_frames: state.total_frames,
        allocation: state.allocation,
        frame,
        completed: state.simulation_done.load(Ordering::SeqCst),
    })
}

#[derive(Serialize)]
struct FramesResponse {
    scenario: String,
    total_frames: u64,
    completed: bool,
    frames: Vec<UiFrame>,
}

async fn frames_so_far(State(state): State<Arc<AppState>>) -> Json<FramesResponse> {
    let frames = state
        .frames
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    Json(FramesResponse {
        scenario: state.scenario_name.clone(),
        total_frames: state.total_frames,
        completed: state.simulation_done.load(Ordering::SeqCst),
        frames,
    })
}

async fn rgb_image(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (HeaderName::from_static("x-width"), state.width.to_string()),
            (HeaderName::from_static("x-height"), state.height.to_string()),
        ],
        state.rgb.clone(),
    )
}

async fn thermal_image(State(state): State<Arc<AppState>>) -> Json<Option<ThermalFrame>> {
    Json(
        state
            .latest_thermal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone(),
    )
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::FrameSnapshot;

    fn frame(number: u64) -> UiFrame {
        UiFrame {
            snapshot: FrameSnapshot {
                scenario: "web".into(),
                frame: number,
                hour: 0.0,
                stats: None,
                blocks: Vec::new(),
            },
            completed: false,
        }
    }

    #[test]
    fn publish_records_and_broadcasts() {
        let latest = Mutex::new(None);
        let frames = Mutex::new(Vec::new());
        let (tx, mut rx) = broadcast::channel(4);
        publish(frame(2), &latest, &frames, &tx);
        assert_eq!(latest.lock().unwrap().as_ref().map(|f| f.snapshot.frame), Some(2));
        assert_eq!(frames.lock().unwrap().len(), 1);
        let payload = rx.try_recv().unwrap();
        assert!(payload.contains("\"frame\":2"));
    }

    #[test]
    fn publish_without_subscribers_still_records() {
        let latest = Mutex::new(None);
        let frames = Mutex::new(Vec::new());
        let (tx, _) = broadcast::channel(4);
        publish(frame(0), &latest, &frames, &tx);
        publish(frame(1), &latest, &frames, &tx);
        assert_eq!(frames.lock().unwrap().len(), 2);
    }
}
