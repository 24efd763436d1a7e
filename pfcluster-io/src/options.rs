//! Option files.
//!
//! Options live in a `clustering` section keyed by the historical option
//! names (`thresh_Ecal_Barrel`, `shower_Sigma_Hcal`, `depthCor_Mode`, ...).
//! A missing key keeps its default. A key whose value cannot be used keeps
//! its default and logs a warning; unknown keys are reported the same way.
//! Only an unreadable file or malformed JSON is an error.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use log::warn;
use pfcluster_core::{
    ClusteringConfig, Connectivity, DepthCorrection, DepthCorrectionMode, PositionCells,
    ReconstructionConfig, Subsystem, Thresholds,
};
use serde_json::{Map, Value};

use crate::Result;

/// Loads a run configuration from an option file.
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid JSON.
pub fn load_options<P: AsRef<Path>>(path: P) -> Result<ReconstructionConfig> {
    let text = fs::read_to_string(path)?;
    options_from_str(&text)
}

/// Parses a run configuration from option-file text.
///
/// # Errors
/// Returns an error if the text is not valid JSON.
pub fn options_from_str(json: &str) -> Result<ReconstructionConfig> {
    let value: Value = serde_json::from_str(json)?;
    Ok(options_from_value(&value))
}

/// Builds a run configuration from a parsed option document. Never fails.
#[must_use]
pub fn options_from_value(value: &Value) -> ReconstructionConfig {
    let empty = Map::new();
    let clustering = match value.get("clustering") {
        Some(Value::Object(section)) => section,
        Some(_) => {
            warn!("option section 'clustering' is not an object, using defaults");
            &empty
        }
        None => &empty,
    };
    let mut section = Section::new(clustering);

    let depth = read_depth_correction(&mut section);
    let debug = section.bool("debug", false);
    let mut config = ReconstructionConfig {
        ecal: read_subsystem(&mut section, Subsystem::Ecal, depth, debug),
        hcal: read_subsystem(&mut section, Subsystem::Hcal, depth, debug),
        preshower: read_subsystem(&mut section, Subsystem::Preshower, depth, debug),
        ..ReconstructionConfig::default()
    };
    config.clustering_on = section.bool("on/off", true);
    config.find_neighbours = section.bool("findRecHitNeighbours", true);

    for key in section.unused() {
        warn!("unknown clustering option '{key}' ignored");
    }
    config
}

/// Option-name infix of a subsystem.
fn tag(subsystem: Subsystem) -> &'static str {
    match subsystem {
        Subsystem::Ecal => "Ecal",
        Subsystem::Hcal => "Hcal",
        Subsystem::Preshower => "PS",
    }
}

fn read_subsystem(
    section: &mut Section<'_>,
    subsystem: Subsystem,
    depth: DepthCorrection,
    debug: bool,
) -> ClusteringConfig {
    let defaults = ClusteringConfig::defaults_for(subsystem).with_depth_correction(depth);
    let t = tag(subsystem);
    let d = &defaults.thresholds;

    let thresholds = Thresholds::new(
        section.f64(&format!("thresh_{t}_Barrel"), d.barrel),
        section.f64(&format!("thresh_Seed_{t}_Barrel"), d.seed_barrel),
        section.f64(&format!("thresh_{t}_Endcap"), d.endcap),
        section.f64(&format!("thresh_Seed_{t}_Endcap"), d.seed_endcap),
    );

    let sigma_key = format!("shower_Sigma_{t}");
    let mut shower_sigma = section.f64(&sigma_key, defaults.shower_sigma);
    if shower_sigma <= 0.0 {
        warn!("option '{sigma_key}' must be positive, got {shower_sigma}; using default");
        shower_sigma = defaults.shower_sigma;
    }

    let neighbours_key = format!("neighbours_{t}");
    let connectivity = match section.i64(&neighbours_key) {
        None => defaults.connectivity,
        Some(n) => Connectivity::from_count(n).unwrap_or_else(|| {
            warn!("option '{neighbours_key}' must be 4 or 8, got {n}; using default");
            defaults.connectivity
        }),
    };

    let crystal_key = format!("posCalc_nCrystal_{t}");
    let position_cells = match section.i64(&crystal_key) {
        None => defaults.position_cells,
        Some(n) => PositionCells::from_n_crystal(n).unwrap_or_else(|| {
            warn!("option '{crystal_key}' must be -1 or a positive count, got {n}; using default");
            defaults.position_cells
        }),
    };

    let config = ClusteringConfig {
        thresholds,
        shower_sigma,
        connectivity,
        position_cells,
        pos_calc_p1: section.f64(&format!("posCalc_p1_{t}"), defaults.pos_calc_p1),
        debug,
        ..defaults.clone()
    };

    match config.validate() {
        Ok(()) => config,
        Err(err) => {
            warn!("{} options rejected ({err}); using defaults", subsystem);
            defaults.with_debug(debug)
        }
    }
}

fn read_depth_correction(section: &mut Section<'_>) -> DepthCorrection {
    let defaults = DepthCorrection::default();
    let mode = match section.i64("depthCor_Mode") {
        None => defaults.mode,
        Some(code) => DepthCorrectionMode::from_code(code).unwrap_or_else(|| {
            warn!("option 'depthCor_Mode' must be 0, 1 or 2, got {code}; correction disabled");
            DepthCorrectionMode::Off
        }),
    };
    DepthCorrection {
        mode,
        a: section.f64("depthCor_A", defaults.a),
        b: section.f64("depthCor_B", defaults.b),
        a_preshower: section.f64("depthCor_A_preshower", defaults.a_preshower),
        b_preshower: section.f64("depthCor_B_preshower", defaults.b_preshower),
    }
}

/// Typed lookups into one option section, remembering which keys were read.
struct Section<'a> {
    map: &'a Map<String, Value>,
    used: BTreeSet<&'a str>,
}

impl<'a> Section<'a> {
    fn new(map: &'a Map<String, Value>) -> Self {
        Self {
            map,
            used: BTreeSet::new(),
        }
    }

    fn lookup(&mut self, key: &str) -> Option<&'a Value> {
        let (name, value) = self.map.get_key_value(key)?;
        self.used.insert(name.as_str());
        Some(value)
    }

    fn f64(&mut self, key: &str, default: f64) -> f64 {
        match self.lookup(key) {
            None => default,
            Some(value) => value.as_f64().filter(|v| v.is_finite()).unwrap_or_else(|| {
                warn!("option '{key}' is not a number ({value}); using default {default}");
                default
            }),
        }
    }

    fn i64(&mut self, key: &str) -> Option<i64> {
        let value = self.lookup(key)?;
        let parsed = value.as_i64();
        if parsed.is_none() {
            warn!("option '{key}' is not an integer ({value}); using default");
        }
        parsed
    }

    fn bool(&mut self, key: &str, default: bool) -> bool {
        match self.lookup(key) {
            None => default,
            Some(Value::Bool(b)) => *b,
            // 0/1 switches are common in option files
            Some(Value::Number(n)) if n.as_i64().is_some() => n.as_i64() != Some(0),
            Some(value) => {
                warn!("option '{key}' is not a switch ({value}); using default {default}");
                default
            }
        }
    }

    fn unused(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.map
            .keys()
            .map(String::as_str)
            .filter(|key| !self.used.contains(key))
    }
}
