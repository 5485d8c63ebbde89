use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rust_sfm::io::{write_plan_csv, Scene};
use rust_sfm::observe::TracingObserver;
use rust_sfm::system::RegistrationPlanner;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let scene_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/scene".to_string());
    let plan_path = std::env::args().nth(2);

    info!("Loading scene from: {}", scene_path);
    let scene = Scene::load(&scene_path)?;

    let planner = RegistrationPlanner::new(scene.config.clone());
    let plan = planner.plan(&scene.tracks, &scene.graph, &TracingObserver)?;

    if !plan.initialization.is_selected() {
        warn!(
            "No frame pair passed the initialization thresholds, seeded with fallback pair {}",
            plan.initialization.pair
        );
    }

    let order: Vec<String> = plan.order().iter().map(|f| f.to_string()).collect();
    info!(
        "Registration order ({} frames, {} points): {}",
        plan.steps.len(),
        plan.reconstructed_points,
        order.join(" ")
    );
    if !plan.unreachable.is_empty() {
        let unreachable: Vec<String> = plan.unreachable.iter().map(|f| f.to_string()).collect();
        warn!(
            "{} frames share no point with the reconstruction: {}",
            plan.unreachable.len(),
            unreachable.join(" ")
        );
    }

    if let Some(path) = plan_path {
        write_plan_csv(&path, &plan)?;
        info!("Wrote plan to {}", path);
    }

    Ok(())
}
