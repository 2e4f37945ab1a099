use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

// Model UIDs understood by the simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u32")]
pub enum ModelType {
    /// Constant runoff, no top-layer state
    Model190,
    /// Top-layer hillslope model
    Model254,
    /// Model 254 plus reservoirs at dam links
    Model255,
}

impl ModelType {
    pub fn code(self) -> u32 {
        match self {
            ModelType::Model190 => 190,
            ModelType::Model254 => 254,
            ModelType::Model255 => 255,
        }
    }

    /// Number of global parameters the master template expects, if the
    /// global-file writer supports this model.
    pub fn global_parameter_count(self) -> Option<usize> {
        match self {
            ModelType::Model190 => Some(6),
            ModelType::Model254 => Some(12),
            ModelType::Model255 => None,
        }
    }
}

impl TryFrom<u32> for ModelType {
    type Error = String;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            190 => Ok(ModelType::Model190),
            254 => Ok(ModelType::Model254),
            255 => Ok(ModelType::Model255),
            other => Err(format!("unsupported model type {}", other)),
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// File categories that carry a format code in the global file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileField {
    Topology,
    Parameters,
    InitialState,
    Rainfall,
    Evaporation,
    Output,
    Save,
    Dam,
    Snapshot,
}

impl FileField {
    pub fn name(self) -> &'static str {
        match self {
            FileField::Topology => "topology",
            FileField::Parameters => "parameter",
            FileField::InitialState => "initial state",
            FileField::Rainfall => "rainfall",
            FileField::Evaporation => "evaporation",
            FileField::Output => "output",
            FileField::Save => "save",
            FileField::Dam => "dam",
            FileField::Snapshot => "snapshot",
        }
    }

    /// Format code for a file extension; `None` when the simulator has no
    /// reader for it.
    pub fn format_code(self, extension: &str) -> Option<u32> {
        match (self, extension) {
            (FileField::Topology | FileField::Parameters, "rvr" | "prm") => Some(0),
            (FileField::Topology | FileField::Parameters, "dbc") => Some(3),

            (FileField::InitialState, "ini") => Some(0),
            (FileField::InitialState, "uini") => Some(1),
            (FileField::InitialState, "rec") => Some(2),
            (FileField::InitialState, "dbc") => Some(3),
            (FileField::InitialState, "h5") => Some(4),

            (FileField::Rainfall, "str") => Some(1),
            (FileField::Rainfall, "dbc") => Some(3),
            (FileField::Rainfall, "ustr") => Some(4),

            (FileField::Evaporation, "mon") => Some(7),

            (FileField::Output, "dat") => Some(1),
            (FileField::Output, "csv") => Some(2),
            (FileField::Output, "h5") => Some(5),

            (FileField::Save, "sav") => Some(1),
            (FileField::Save, "dbc") => Some(2),

            (FileField::Dam, "dam") => Some(1),
            (FileField::Dam, "qvs") => Some(2),

            (FileField::Snapshot, "rec") => Some(1),
            (FileField::Snapshot, "dbc") => Some(2),
            (FileField::Snapshot, "h5") => Some(3),

            _ => None,
        }
    }

    /// Resolves the format code of `path` from its extension.
    pub fn resolve(self, path: &Path) -> Result<u32, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| ConfigError::MissingExtension {
                field: self.name(),
                path: path.display().to_string(),
            })?;

        self.format_code(extension)
            .ok_or_else(|| ConfigError::UnknownExtension {
                field: self.name(),
                extension: extension.to_string(),
                path: path.display().to_string(),
            })
    }

    /// Like [`FileField::resolve`], but an absent optional file is code 0.
    pub fn resolve_optional(self, path: Option<&Path>) -> Result<u32, ConfigError> {
        path.map_or(Ok(0), |p| self.resolve(p))
    }
}

/// Rainfall method codes that read gridded binary files and need the
/// binary-rainfall parameters.
pub const BINARY_RAINFALL_CODES: [u32; 2] = [2, 5];

fn default_model() -> ModelType {
    ModelType::Model190
}

fn default_out_resolution() -> f64 {
    60.0
}

fn default_components() -> Vec<String> {
    ["Time", "LinkID", "State0"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// Everything the global file needs, as supplied by the caller
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalOptions {
    #[serde(default = "default_model")]
    pub model: ModelType,
    /// Unix time of the first simulated instant
    pub begin: i64,
    /// Unix time of the last simulated instant
    pub end: i64,
    /// Space-separated global parameters in model order
    pub parameters: String,

    pub topology: PathBuf,
    pub link_parameters: PathBuf,
    pub initial_state: PathBuf,
    pub rainfall: PathBuf,
    /// Explicit rainfall method code; resolved from the rainfall extension when absent
    #[serde(default)]
    pub rainfall_method: Option<u32>,
    #[serde(default)]
    pub chunk_size: Option<u32>,
    #[serde(default)]
    pub time_resolution: Option<f64>,
    #[serde(default)]
    pub binary_first: Option<i64>,
    #[serde(default)]
    pub binary_last: Option<i64>,
    pub evaporation: PathBuf,
    pub output: PathBuf,
    #[serde(default = "default_out_resolution")]
    pub out_resolution: f64,
    #[serde(default)]
    pub save_path: Option<PathBuf>,
    /// Save hydrographs for every link instead of the links in `save_path`
    #[serde(default)]
    pub save_all_links: bool,
    pub scratch: PathBuf,
    #[serde(default)]
    pub dam: Option<PathBuf>,
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
    /// State components written to the output file
    #[serde(default = "default_components")]
    pub components: Vec<String>,
    /// Directory holding `<model>BaseGlobal.gbl`; the bundled templates are used when absent
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
}

impl GlobalOptions {
    /// Options with the defaults applied and the given mandatory fields.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        model: ModelType,
        begin: i64,
        end: i64,
        parameters: impl Into<String>,
        topology: impl Into<PathBuf>,
        link_parameters: impl Into<PathBuf>,
        initial_state: impl Into<PathBuf>,
        rainfall: impl Into<PathBuf>,
        evaporation: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        scratch: impl Into<PathBuf>,
    ) -> Self {
        GlobalOptions {
            model,
            begin,
            end,
            parameters: parameters.into(),
            topology: topology.into(),
            link_parameters: link_parameters.into(),
            initial_state: initial_state.into(),
            rainfall: rainfall.into(),
            rainfall_method: None,
            chunk_size: None,
            time_resolution: None,
            binary_first: None,
            binary_last: None,
            evaporation: evaporation.into(),
            output: output.into(),
            out_resolution: default_out_resolution(),
            save_path: None,
            save_all_links: false,
            scratch: scratch.into(),
            dam: None,
            snapshot: None,
            components: default_components(),
            template_dir: None,
        }
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
