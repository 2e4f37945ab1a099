//! Global (`.gbl`) file assembly.
//!
//! [`GlobalFile::new`] validates the options and resolves the format code of
//! every referenced file. [`GlobalFile::write_global`] checks the model
//! parameters, fills the model's master template and writes `<name>.gbl`.

use crate::config::{BINARY_RAINFALL_CODES, FileField, GlobalOptions, ModelType};
use crate::error::{ConfigError, Error, Result};
use crate::template::{Substitution, substitute};
use chrono::DateTime;
use rand::Rng;
use rand::rngs::OsRng;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const TEMPLATE_190: &str = include_str!("../templates/190BaseGlobal.gbl");
const TEMPLATE_254: &str = include_str!("../templates/254BaseGlobal.gbl");

// Rendered in place of an unset optional value; starts a comment in .gbl files
const UNSET: &str = "%";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Source of names for global files written without an explicit name.
pub trait NameGenerator {
    fn generate(&mut self) -> String;
}

/// Eight lowercase alphanumeric characters drawn from the OS random source.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomName;

impl NameGenerator for RandomName {
    fn generate(&mut self) -> String {
        const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
        (0..8)
            .map(|_| ALPHABET[OsRng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

// Parameters for gridded binary rainfall
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryRainfall {
    pub chunk_size: u32,
    pub time_resolution: f64,
    pub first: i64,
    pub last: i64,
}

// Format codes resolved from file extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatCodes {
    pub topology: u32,
    pub parameters: u32,
    pub initial_state: u32,
    pub rainfall: u32,
    pub evaporation: u32,
    pub output: u32,
    pub save: u32,
    pub dam: u32,
    pub snapshot: u32,
}

/// Validated global-file options, ready to render.
#[derive(Debug, Clone)]
pub struct GlobalFile {
    options: GlobalOptions,
    codes: FormatCodes,
    binary_rainfall: Option<BinaryRainfall>,
    substitution: Substitution,
}

impl GlobalFile {
    pub fn new(options: GlobalOptions) -> std::result::Result<Self, ConfigError> {
        let rainfall = match options.rainfall_method {
            Some(code) => code,
            None => FileField::Rainfall.resolve(&options.rainfall)?,
        };

        let save = match (options.save_all_links, &options.save_path) {
            (true, Some(path)) => return Err(ConfigError::SaveConflict(path.display().to_string())),
            (true, None) => 3,
            (false, path) => FileField::Save.resolve_optional(path.as_deref())?,
        };

        let codes = FormatCodes {
            topology: FileField::Topology.resolve(&options.topology)?,
            parameters: FileField::Parameters.resolve(&options.link_parameters)?,
            initial_state: FileField::InitialState.resolve(&options.initial_state)?,
            rainfall,
            evaporation: FileField::Evaporation.resolve(&options.evaporation)?,
            output: FileField::Output.resolve(&options.output)?,
            save,
            dam: FileField::Dam.resolve_optional(options.dam.as_deref())?,
            snapshot: FileField::Snapshot.resolve_optional(options.snapshot.as_deref())?,
        };

        let binary_rainfall = if BINARY_RAINFALL_CODES.contains(&rainfall) {
            Some(BinaryRainfall {
                chunk_size: options
                    .chunk_size
                    .ok_or(ConfigError::MissingRainfallParameter("chunk_size"))?,
                time_resolution: options
                    .time_resolution
                    .ok_or(ConfigError::MissingRainfallParameter("time_resolution"))?,
                first: options
                    .binary_first
                    .ok_or(ConfigError::MissingRainfallParameter("binary_first"))?,
                last: options
                    .binary_last
                    .ok_or(ConfigError::MissingRainfallParameter("binary_last"))?,
            })
        } else {
            None
        };

        Ok(GlobalFile {
            options,
            codes,
            binary_rainfall,
            substitution: Substitution::default(),
        })
    }

    /// Fail on template placeholders that have no bound value.
    pub fn strict(mut self) -> Self {
        self.substitution = Substitution::Strict;
        self
    }

    pub fn codes(&self) -> &FormatCodes {
        &self.codes
    }

    pub fn binary_rainfall(&self) -> Option<&BinaryRainfall> {
        self.binary_rainfall.as_ref()
    }

    pub fn options(&self) -> &GlobalOptions {
        &self.options
    }

    /// Renders the global file text without touching the output location.
    pub fn render(&self) -> Result<String> {
        let model = self.options.model;
        let expected = model.global_parameter_count().ok_or_else(|| {
            Error::write("global file", format!("no template for model {}", model))
        })?;

        let found = self.options.parameters.split_whitespace().count();
        if found != expected {
            return Err(ConfigError::ParameterCount {
                model: model.code(),
                expected,
                found,
            }
            .into());
        }

        let template = self.load_template(model)?;
        let values = self.bindings()?;
        Ok(substitute(&template, &values, self.substitution)?)
    }

    /// Writes `<name>.gbl` and returns its path. `name` may include
    /// directories; without one, `namer` supplies it.
    pub fn write_global(
        &self,
        name: Option<&str>,
        namer: &mut dyn NameGenerator,
    ) -> Result<PathBuf> {
        let content = self.render()?;

        let name = match name {
            Some(name) => name.to_string(),
            None => namer.generate(),
        };
        let path = PathBuf::from(format!("{}.gbl", name));
        fs::write(&path, content).map_err(|e| Error::io(&path, e))?;

        info!("{} is created", path.display());
        Ok(path)
    }

    fn load_template(&self, model: ModelType) -> Result<String> {
        if let Some(dir) = &self.options.template_dir {
            let path = dir.join(format!("{}BaseGlobal.gbl", model.code()));
            return fs::read_to_string(&path).map_err(|e| Error::io(&path, e));
        }
        match model {
            ModelType::Model190 => Ok(TEMPLATE_190.to_string()),
            ModelType::Model254 => Ok(TEMPLATE_254.to_string()),
            ModelType::Model255 => Err(Error::write(
                "global file",
                format!("no template for model {}", model),
            )),
        }
    }

    fn bindings(&self) -> std::result::Result<HashMap<&'static str, String>, ConfigError> {
        let o = &self.options;
        let c = &self.codes;
        let path = |p: &Path| p.display().to_string();
        let optional_path = |p: &Option<PathBuf>| p.as_deref().map_or(UNSET.to_string(), path);
        let optional = |v: Option<String>| v.unwrap_or_else(|| UNSET.to_string());

        let save_file = if o.save_all_links {
            String::new()
        } else {
            optional_path(&o.save_path)
        };

        let list_component: String = o.components.iter().map(|c| format!("{}\n", c)).collect();

        Ok(HashMap::from([
            ("n_component", o.components.len().to_string()),
            ("list_component", list_component),
            ("date1", calendar_date(o.begin)?),
            ("date2", calendar_date(o.end)?),
            ("unix1", o.begin.to_string()),
            ("unix2", o.end.to_string()),
            ("Parameters", o.parameters.clone()),
            ("rvr_type", c.topology.to_string()),
            ("rvr_file", path(&o.topology)),
            ("prm_type", c.parameters.to_string()),
            ("prm_file", path(&o.link_parameters)),
            ("ini_type", c.initial_state.to_string()),
            ("initial_file", path(&o.initial_state)),
            ("rain_type", c.rainfall.to_string()),
            ("rain_file", path(&o.rainfall)),
            // Supplied values are kept even when the rainfall method ignores them
            ("chunk_size", optional(o.chunk_size.map(|v| v.to_string()))),
            ("time_resolution", optional(o.time_resolution.map(|v| v.to_string()))),
            ("bin_unix1", optional(o.binary_first.map(|v| v.to_string()))),
            ("bin_unix2", optional(o.binary_last.map(|v| v.to_string()))),
            ("evap_type", c.evaporation.to_string()),
            ("evap_file", path(&o.evaporation)),
            ("out_type", c.output.to_string()),
            ("out_resolution", o.out_resolution.to_string()),
            ("output", path(&o.output)),
            ("save_type", c.save.to_string()),
            ("sav_file", save_file),
            ("scratch_file", path(&o.scratch)),
            ("dam_type", c.dam.to_string()),
            ("dam_file", optional_path(&o.dam)),
            ("snap_type", c.snapshot.to_string()),
            ("snapshot_path", optional_path(&o.snapshot)),
        ]))
    }
}

/// Formats Unix seconds as a UTC `YYYY-MM-DD HH:MM` string.
pub fn calendar_date(unix: i64) -> std::result::Result<String, ConfigError> {
    DateTime::from_timestamp(unix, 0)
        .map(|dt| dt.format(DATE_FORMAT).to_string())
        .ok_or(ConfigError::InvalidTimestamp(unix))
}
