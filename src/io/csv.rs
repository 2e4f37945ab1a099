use crate::error::{Error, Result};
use crate::io::ini::ReservoirStorage;
use crate::io::results::OutputTable;
use crate::network::LinkId;
use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

fn open_reader(path: &Path) -> Result<csv::Reader<BufReader<File>>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    Ok(ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file)))
}

fn parse_row(path: &Path, row: usize, record: &StringRecord, width: usize) -> Result<Vec<f64>> {
    if record.len() < width {
        return Err(Error::format(
            path,
            row,
            format!("expected {} fields, found {}", width, record.len()),
        ));
    }
    record
        .iter()
        .take(width)
        .map(|value| {
            value
                .parse::<f64>()
                .map_err(|e| Error::format(path, row, format!("invalid value {:?}: {}", value, e)))
        })
        .collect()
}

/// Reads a `.csv` output file whose header row names the printed components.
pub fn load_csv_output(path: &Path) -> Result<OutputTable> {
    let mut rdr = open_reader(path)?;
    let mut fields: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    // Hydrograph files may end the header with a trailing comma. Interior
    // blanks stay so later columns keep their positions.
    if fields.last().is_some_and(String::is_empty) {
        fields.pop();
    }

    let mut columns = vec![Vec::new(); fields.len()];
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let values = parse_row(path, i + 2, &record, fields.len())?;
        for (column, value) in columns.iter_mut().zip(values) {
            column.push(value);
        }
    }

    debug!(
        "Loaded {} rows of {:?} from {}",
        columns.first().map_or(0, Vec::len),
        fields,
        path.display()
    );
    OutputTable::new(fields, columns)
}

#[derive(Debug, Deserialize)]
struct ReservoirRecord {
    link_id: LinkId,
    storage: f64,
}

/// Reads dam links and their reservoir storage from a `link_id,storage` CSV.
pub fn load_reservoirs(path: &Path) -> Result<ReservoirStorage> {
    let mut rdr = open_reader(path)?;
    let mut dam_links = Vec::new();
    let mut storage = Vec::new();
    for result in rdr.deserialize::<ReservoirRecord>() {
        let record = result?;
        dam_links.push(record.link_id);
        storage.push(record.storage);
    }
    debug!("Loaded {} dam links from {}", dam_links.len(), path.display());
    ReservoirStorage::new(dam_links, storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_output_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "Time,LinkID,State0,\n0,1,0.5,\n0,2,9.0,\n60,1,0.7,\n").unwrap();

        let table = load_csv_output(&path).unwrap();
        assert_eq!(table.fields(), &["Time", "LinkID", "State0"]);
        assert_eq!(table.rows(), 3);

        let (time, q) = table.filter_by_link(1, "State0").unwrap();
        assert_eq!(time, vec![0.0, 60.0]);
        assert_eq!(q, vec![0.5, 0.7]);
    }

    #[test]
    fn unnamed_interior_column_keeps_alignment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "LinkID,,Time,State0\n1,9,0,0.5\n2,9,0,3.0\n1,9,60,0.7\n").unwrap();

        let table = load_csv_output(&path).unwrap();
        assert_eq!(table.fields(), &["LinkID", "", "Time", "State0"]);

        let (time, q) = table.filter_by_link(1, "State0").unwrap();
        assert_eq!(time, vec![0.0, 60.0]);
        assert_eq!(q, vec![0.5, 0.7]);
    }

    #[test]
    fn bad_number_reports_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "Time,LinkID\n0,1\nx,2\n").unwrap();

        assert!(matches!(
            load_csv_output(&path),
            Err(Error::Format { line: 3, .. })
        ));
    }

    #[test]
    fn reads_reservoirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dams.csv");
        fs::write(&path, "link_id,storage\n12,3500.5\n40, 120\n").unwrap();

        let dams = load_reservoirs(&path).unwrap();
        assert_eq!(dams.dam_links, vec![12, 40]);
        assert_eq!(dams.storage_for(40), 120.0);
    }
}
