use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, Writer};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ViewSelectionConfig;
use crate::system::RegistrationPlan;
use crate::tracks::{FrameIndex, FramePair, FramePairGraph, PointId, TrackMatrix};

pub const TRACKS_FILE: &str = "tracks.csv";
pub const PAIRS_FILE: &str = "pairs.csv";
pub const CONFIG_FILE: &str = "config.yaml";

/// Largest frame count a scene may declare. The pair graph stores one slot
/// per frame pair.
pub const MAX_SCENE_FRAMES: usize = 10_000;
/// Largest point count a scene may declare.
pub const MAX_SCENE_POINTS: usize = 50_000_000;

/// Observation `(frame, point)` as read from `tracks.csv`.
#[derive(Debug, Clone, Copy)]
pub struct ObservationEntry {
    pub frame: usize,
    pub point: usize,
}

/// Depth ratio of one frame pair as read from `pairs.csv`.
#[derive(Debug, Clone, Copy)]
pub struct PairEntry {
    pub frame_a: usize,
    pub frame_b: usize,
    pub appro_depth: f64,
}

/// Inputs of a view-selection run loaded from a scene directory.
///
/// ```text
/// scene/
///   tracks.csv    frame,point
///   pairs.csv     frame_a,frame_b,appro_depth
///   config.yaml   optional ViewSelectionConfig
/// ```
#[derive(Debug)]
pub struct Scene {
    scene_path: PathBuf,
    pub tracks: TrackMatrix,
    pub graph: FramePairGraph,
    pub config: ViewSelectionConfig,
}

impl Scene {
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let observations = load_observation_list(root.join(TRACKS_FILE))?;
        let pairs = load_pair_list(root.join(PAIRS_FILE))?;

        let num_frames = observations
            .iter()
            .map(|o| o.frame)
            .chain(pairs.iter().map(|p| p.frame_a.max(p.frame_b)))
            .max()
            .map_or(Ok(0), |last| extent(last, MAX_SCENE_FRAMES, "frame"))?;
        let num_points = observations
            .iter()
            .map(|o| o.point)
            .max()
            .map_or(Ok(0), |last| extent(last, MAX_SCENE_POINTS, "point"))?;

        let tracks = build_track_matrix(&observations, num_frames, num_points)?;
        let graph = build_pair_graph(&pairs, num_frames)?;

        let config_path = root.join(CONFIG_FILE);
        let config = if config_path.exists() {
            ViewSelectionConfig::from_yaml_file(&config_path)?
        } else {
            warn!("No {} in {:?}, using default thresholds", CONFIG_FILE, root);
            ViewSelectionConfig::default()
        };

        info!(
            "Loaded scene {:?}: {} frames, {} points, {} observations, {} pairs",
            root,
            num_frames,
            num_points,
            observations.len(),
            pairs.len()
        );

        Ok(Self {
            scene_path: root,
            tracks,
            graph,
            config,
        })
    }

    pub fn path(&self) -> &Path {
        &self.scene_path
    }
}

/// Count of indices `0..=last`, bounded by `limit`.
fn extent(last: usize, limit: usize, what: &str) -> Result<usize> {
    match last.checked_add(1) {
        Some(count) if count <= limit => Ok(count),
        _ => bail!("Scene {} index {} exceeds the limit of {} {}s", what, last, limit, what),
    }
}

/// Reject an index read from `csv_path` at `line` that lies past `limit`.
fn check_index(index: usize, limit: usize, what: &str, line: u64, csv_path: &Path) -> Result<()> {
    if index >= limit {
        bail!(
            "{} index {} on line {} of {} exceeds the limit of {}",
            what,
            index,
            line,
            csv_path.display(),
            limit
        );
    }
    Ok(())
}

/// Build a track matrix of the given shape from raw observations.
pub fn build_track_matrix(
    observations: &[ObservationEntry],
    num_frames: usize,
    num_points: usize,
) -> Result<TrackMatrix> {
    let matrix = TrackMatrix::from_observations(
        num_frames,
        num_points,
        observations
            .iter()
            .map(|o| (FrameIndex::new(o.frame), PointId::new(o.point))),
    )
    .context("Observation outside the declared scene shape")?;
    Ok(matrix)
}

/// Build a frame pair graph from raw pair entries.
///
/// Pairs may be listed in either order; a pair listed twice must carry the
/// same ratio.
pub fn build_pair_graph(pairs: &[PairEntry], num_frames: usize) -> Result<FramePairGraph> {
    let mut graph = FramePairGraph::new(num_frames);
    let mut seen: HashMap<FramePair, f64> = HashMap::new();

    for entry in pairs {
        let pair = FramePair::new(FrameIndex::new(entry.frame_a), FrameIndex::new(entry.frame_b))
            .with_context(|| format!("Invalid pair {},{}", entry.frame_a, entry.frame_b))?;

        if let Some(&previous) = seen.get(&pair) {
            let both_nan = previous.is_nan() && entry.appro_depth.is_nan();
            if previous != entry.appro_depth && !both_nan {
                bail!(
                    "Pair {} listed with conflicting depth ratios {} and {}",
                    pair,
                    previous,
                    entry.appro_depth
                );
            }
            continue;
        }
        seen.insert(pair, entry.appro_depth);
        graph.set_depth_ratio(pair.newer(), pair.older(), entry.appro_depth)?;
    }

    Ok(graph)
}

pub fn load_observation_list(csv_path: PathBuf) -> Result<Vec<ObservationEntry>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .from_path(&csv_path)
        .with_context(|| format!("Failed to open {}", csv_path.display()))?;

    let mut entries = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        if rec.len() < 2 {
            warn!("Skipping short row {:?} in {}", rec, csv_path.display());
            continue;
        }
        let frame: usize = rec[0]
            .trim()
            .parse()
            .with_context(|| format!("Bad frame index {:?} in {}", &rec[0], csv_path.display()))?;
        let point: usize = rec[1]
            .trim()
            .parse()
            .with_context(|| format!("Bad point id {:?} in {}", &rec[1], csv_path.display()))?;
        let line = rec.position().map_or(0, |pos| pos.line());
        check_index(frame, MAX_SCENE_FRAMES, "Frame", line, &csv_path)?;
        check_index(point, MAX_SCENE_POINTS, "Point", line, &csv_path)?;
        entries.push(ObservationEntry { frame, point });
    }
    Ok(entries)
}

pub fn load_pair_list(csv_path: PathBuf) -> Result<Vec<PairEntry>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .from_path(&csv_path)
        .with_context(|| format!("Failed to open {}", csv_path.display()))?;

    let mut entries = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        if rec.len() < 3 {
            warn!("Skipping short row {:?} in {}", rec, csv_path.display());
            continue;
        }
        let frame_a: usize = rec[0]
            .trim()
            .parse()
            .with_context(|| format!("Bad frame index {:?} in {}", &rec[0], csv_path.display()))?;
        let frame_b: usize = rec[1]
            .trim()
            .parse()
            .with_context(|| format!("Bad frame index {:?} in {}", &rec[1], csv_path.display()))?;
        let appro_depth: f64 = rec[2]
            .trim()
            .parse()
            .with_context(|| format!("Bad depth ratio {:?} in {}", &rec[2], csv_path.display()))?;
        let line = rec.position().map_or(0, |pos| pos.line());
        check_index(frame_a, MAX_SCENE_FRAMES, "Frame", line, &csv_path)?;
        check_index(frame_b, MAX_SCENE_FRAMES, "Frame", line, &csv_path)?;
        entries.push(PairEntry {
            frame_a,
            frame_b,
            appro_depth,
        });
    }
    Ok(entries)
}

#[derive(Debug, Serialize)]
struct PlanRow {
    step: usize,
    frame: usize,
    role: &'static str,
    match_count: usize,
    new_points: usize,
}

/// Write the registration order as CSV with a header row.
pub fn write_plan_csv<P: AsRef<Path>>(path: P, plan: &RegistrationPlan) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;

    for (step, planned) in plan.steps.iter().enumerate() {
        wtr.serialize(PlanRow {
            step,
            frame: planned.frame.index(),
            role: planned.role.as_str(),
            match_count: planned.match_count,
            new_points: planned.new_points,
        })?;
    }
    wtr.flush()?;
    Ok(())
}
