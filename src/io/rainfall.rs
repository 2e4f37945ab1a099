//! Uniform rainfall series (`.ustr`): a record count, then one
//! `timestamp value` pair per line.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainfallRecord {
    pub timestamp: i64,
    pub intensity: f64,
}

pub fn write_ustr(path: &Path, records: &[RainfallRecord]) -> Result<()> {
    let mut out = format!("{}\n", records.len());
    for record in records {
        out.push_str(&format!("{} {}\n", record.timestamp, record.intensity));
    }
    fs::write(path, out).map_err(|e| Error::io(path, e))?;
    info!("Wrote {} rainfall records to {}", records.len(), path.display());
    Ok(())
}

pub fn read_ustr(path: &Path) -> Result<Vec<RainfallRecord>> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let (line, text) = lines
        .next()
        .ok_or_else(|| Error::format(path, 0, "missing record count"))?;
    let count = text
        .parse::<usize>()
        .map_err(|e| Error::format(path, line, format!("invalid record count: {}", e)))?;

    let records = lines
        .map(|(line, text)| {
            let mut fields = text.split_whitespace();
            let (Some(timestamp), Some(intensity), None) =
                (fields.next(), fields.next(), fields.next())
            else {
                return Err(Error::format(path, line, "expected `timestamp value`"));
            };
            Ok(RainfallRecord {
                timestamp: timestamp
                    .parse()
                    .map_err(|e| Error::format(path, line, format!("invalid timestamp: {}", e)))?,
                intensity: intensity
                    .parse()
                    .map_err(|e| Error::format(path, line, format!("invalid value: {}", e)))?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if records.len() != count {
        return Err(Error::format(
            path,
            line,
            format!("header declares {} records, found {}", count, records.len()),
        ));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_count_then_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rain.ustr");
        let records = [
            RainfallRecord {
                timestamp: 1_483_228_800,
                intensity: 0.0,
            },
            RainfallRecord {
                timestamp: 1_483_232_400,
                intensity: 2.5,
            },
        ];
        write_ustr(&path, &records).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "2\n1483228800 0\n1483232400 2.5\n"
        );
        assert_eq!(read_ustr(&path).unwrap(), records);
    }

    #[test]
    fn count_mismatch_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rain.ustr");
        fs::write(&path, "3\n0 1.0\n60 2.0\n").unwrap();

        assert!(matches!(
            read_ustr(&path),
            Err(Error::Format { line: 1, .. })
        ));
    }
}
