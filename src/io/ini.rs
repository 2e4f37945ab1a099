use crate::config::ModelType;
use crate::error::{Error, Result};
use crate::network::LinkId;
use crate::state::InitialConditions;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

// Reservoir storage at dam links, used by model 255
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReservoirStorage {
    pub dam_links: Vec<LinkId>,
    pub storage: Vec<f64>,
}

impl ReservoirStorage {
    pub fn new(dam_links: Vec<LinkId>, storage: Vec<f64>) -> Result<Self> {
        if dam_links.len() != storage.len() {
            return Err(Error::Domain(format!(
                "{} dam links but {} storage values",
                dam_links.len(),
                storage.len()
            )));
        }
        Ok(ReservoirStorage { dam_links, storage })
    }

    /// Storage of `link` if it is a dam, otherwise 0.
    pub fn storage_for(&self, link: LinkId) -> f64 {
        self.dam_links
            .iter()
            .position(|&dam| dam == link)
            .map_or(0.0, |i| self.storage[i])
    }
}

/// Writes an `.ini` state file for `model_code`.
///
/// The header is the model code, the link count and the initial time. Each
/// link then gets its id on one line and its states on the next, followed by
/// a blank line:
///
/// - 190: `q s_p s_s`
/// - 254: `q s_p s_t s_s`
/// - 255: `q S s_p s_t s_s`, `S` being the reservoir storage (0 off dams)
///
/// Everything is checked before the file is created, so a failed call leaves
/// nothing on disk.
pub fn write_ini(
    path: &Path,
    model_code: u32,
    links: &[LinkId],
    conditions: &InitialConditions,
    reservoirs: Option<&ReservoirStorage>,
    initial_time: f64,
) -> Result<()> {
    let model = ModelType::try_from(model_code).map_err(|e| Error::write(path.display(), e))?;

    let n = links.len();
    for (name, len) in [
        ("discharge", conditions.discharge.len()),
        ("ponded", conditions.ponded.len()),
        ("top layer", conditions.top_layer.len()),
        ("subsurface", conditions.subsurface.len()),
    ] {
        if len != n {
            return Err(Error::write(
                path.display(),
                format!("{} has {} values for {} links", name, len, n),
            ));
        }
    }

    if model == ModelType::Model255 && reservoirs.is_none() {
        return Err(Error::write(
            path.display(),
            "model 255 requires reservoir storage",
        ));
    }

    let mut out = format!("{}\n{}\n{}\n", model.code(), n, initial_time);
    for (i, link) in links.iter().enumerate() {
        let q = conditions.discharge[i];
        let s_p = conditions.ponded[i];
        let s_t = conditions.top_layer[i];
        let s_s = conditions.subsurface[i];

        let values = match model {
            ModelType::Model190 => format!("{} {} {}", q, s_p, s_s),
            ModelType::Model254 => format!("{} {} {} {}", q, s_p, s_t, s_s),
            ModelType::Model255 => {
                let storage = reservoirs.map_or(0.0, |r| r.storage_for(*link));
                format!("{} {} {} {} {}", q, storage, s_p, s_t, s_s)
            }
        };
        out.push_str(&format!("{}\n{}\n\n", link, values));
    }

    fs::write(path, out).map_err(|e| Error::io(path, e))?;
    info!("Wrote initial state for {} links to {}", n, path.display());
    Ok(())
}

// Contents of an .ini file
#[derive(Debug, Clone, PartialEq)]
pub struct StateFile {
    pub model: ModelType,
    pub initial_time: f64,
    pub links: Vec<LinkId>,
    /// State values per link, in the file's column order
    pub states: HashMap<LinkId, Vec<f64>>,
}

impl StateFile {
    /// Values of one column across all links, in link order.
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.links
            .iter()
            .filter_map(|id| self.states.get(id).and_then(|v| v.get(index)).copied())
            .collect()
    }
}

/// Reads an `.ini` state file back.
pub fn read_ini(path: &Path) -> Result<StateFile> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let mut next_line = |what: &str| {
        lines
            .next()
            .ok_or_else(|| Error::format(path, 0, format!("missing {}", what)))
    };

    let (line, text) = next_line("model type")?;
    let model = text
        .parse::<u32>()
        .map_err(|e| e.to_string())
        .and_then(ModelType::try_from)
        .map_err(|e| Error::format(path, line, e))?;
    let width = match model {
        ModelType::Model190 => 3,
        ModelType::Model254 => 4,
        ModelType::Model255 => 5,
    };

    let (line, text) = next_line("link count")?;
    let count = text
        .parse::<usize>()
        .map_err(|e| Error::format(path, line, format!("invalid link count: {}", e)))?;

    let (line, text) = next_line("initial time")?;
    let initial_time = text
        .parse::<f64>()
        .map_err(|e| Error::format(path, line, format!("invalid initial time: {}", e)))?;

    let mut links = Vec::with_capacity(count);
    let mut states = HashMap::with_capacity(count);
    for _ in 0..count {
        let (line, text) = next_line("link id")?;
        let id = text
            .parse::<LinkId>()
            .map_err(|e| Error::format(path, line, format!("invalid link id: {}", e)))?;

        let (line, text) = next_line("state values")?;
        let values = text
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::format(path, line, format!("invalid state value: {}", e)))?;
        if values.len() != width {
            return Err(Error::format(
                path,
                line,
                format!("model {} expects {} states, found {}", model, width, values.len()),
            ));
        }

        links.push(id);
        states.insert(id, values);
    }

    Ok(StateFile {
        model,
        initial_time,
        links,
        states,
    })
}
