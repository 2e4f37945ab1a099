use crate::error::{Error, Result};
use crate::network::LinkId;
use std::path::Path;

pub const LINK_FIELD: &str = "LinkID";
pub const TIME_FIELD: &str = "Time";

// Simulation output held column-wise, one column per field
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    fields: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl OutputTable {
    pub fn new(fields: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self> {
        if fields.len() != columns.len() {
            return Err(Error::Domain(format!(
                "{} fields but {} columns",
                fields.len(),
                columns.len()
            )));
        }
        if let Some(rows) = columns.first().map(Vec::len) {
            if let Some(i) = columns.iter().position(|c| c.len() != rows) {
                return Err(Error::Domain(format!(
                    "column {} has {} rows, expected {}",
                    fields[i],
                    columns[i].len(),
                    rows
                )));
            }
        }
        Ok(OutputTable { fields, columns })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn column(&self, field: &str) -> Option<&[f64]> {
        self.fields
            .iter()
            .position(|f| f == field)
            .map(|i| self.columns[i].as_slice())
    }

    fn require(&self, source: &Path, field: &str) -> Result<&[f64]> {
        self.column(field).ok_or_else(|| {
            Error::format(
                source,
                0,
                format!("no field {:?} (available: {})", field, self.fields.join(", ")),
            )
        })
    }

    /// Times and `state` values of the rows belonging to `link`, in row order.
    pub fn filter_by_link(&self, link: LinkId, state: &str) -> Result<(Vec<f64>, Vec<f64>)> {
        let source = Path::new("outputs");
        let links = self.require(source, LINK_FIELD)?;
        let times = self.require(source, TIME_FIELD)?;
        let values = self.require(source, state)?;

        let target = f64::from(link);
        Ok(links
            .iter()
            .zip(times.iter().zip(values))
            .filter(|(id, _)| **id == target)
            .map(|(_, (t, v))| (*t, *v))
            .unzip())
    }
}

/// Loads an output store, choosing the reader from the file extension.
pub fn load_output(path: &Path) -> Result<OutputTable> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => crate::io::csv::load_csv_output(path),
        Some("h5" | "nc") => crate::io::netcdf::load_netcdf_output(path),
        other => Err(Error::format(
            path,
            0,
            format!("unsupported output store extension {:?}", other),
        )),
    }
}
