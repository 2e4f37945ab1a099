use crate::error::{Error, Result};
use crate::io::results::OutputTable;
use netcdf::types::{CompoundTypeField, FloatType, IntType, NcVariableType};
use std::path::Path;
use tracing::debug;

pub const OUTPUTS_DATASET: &str = "outputs";

/// Reads the `outputs` dataset of an HDF5/netCDF-4 store.
///
/// The dataset is a 1-D array of compound records; every numeric member
/// (`LinkID`, `Time`, `State0`, ...) becomes one column of the table.
pub fn load_netcdf_output(path: &Path) -> Result<OutputTable> {
    let file = netcdf::open(path)?;
    let var = file
        .variable(OUTPUTS_DATASET)
        .ok_or_else(|| Error::format(path, 0, format!("no {:?} dataset", OUTPUTS_DATASET)))?;

    let NcVariableType::Compound(record) = var.vartype() else {
        return Err(Error::format(
            path,
            0,
            format!("{:?} is not a compound dataset", OUTPUTS_DATASET),
        ));
    };

    let members: Vec<&CompoundTypeField> = record
        .fields
        .iter()
        .filter(|field| {
            let scalar = field.arraydims.is_none() && member_size(&field.basetype).is_some();
            if !scalar {
                debug!("Skipping member {}: not a numeric scalar", field.name);
            }
            scalar
        })
        .collect();

    let bytes = var.get_raw_values(..)?;
    let rows = if record.size == 0 { 0 } else { bytes.len() / record.size };

    let mut columns = vec![Vec::with_capacity(rows); members.len()];
    for row in bytes.chunks_exact(record.size.max(1)) {
        for (column, member) in columns.iter_mut().zip(&members) {
            let value = decode_member(row, member.offset, &member.basetype).ok_or_else(|| {
                Error::format(
                    path,
                    0,
                    format!("member {} overruns its {}-byte record", member.name, record.size),
                )
            })?;
            column.push(value);
        }
    }

    let fields: Vec<String> = members.iter().map(|m| m.name.clone()).collect();
    debug!(
        "Loaded {} rows of {:?} from {}:{}",
        rows,
        fields,
        path.display(),
        OUTPUTS_DATASET
    );
    OutputTable::new(fields, columns)
}

fn member_size(typ: &NcVariableType) -> Option<usize> {
    match typ {
        NcVariableType::Int(IntType::U8 | IntType::I8) => Some(1),
        NcVariableType::Int(IntType::U16 | IntType::I16) => Some(2),
        NcVariableType::Int(IntType::U32 | IntType::I32) | NcVariableType::Float(FloatType::F32) => {
            Some(4)
        }
        NcVariableType::Int(IntType::U64 | IntType::I64) | NcVariableType::Float(FloatType::F64) => {
            Some(8)
        }
        _ => None,
    }
}

// Members are laid out in native byte order at their compound offsets
fn decode_member(row: &[u8], offset: usize, typ: &NcVariableType) -> Option<f64> {
    let size = member_size(typ)?;
    let raw = row.get(offset..offset.checked_add(size)?)?;
    let value = match typ {
        NcVariableType::Int(IntType::U8) => f64::from(raw[0]),
        NcVariableType::Int(IntType::I8) => f64::from(raw[0] as i8),
        NcVariableType::Int(IntType::U16) => f64::from(u16::from_ne_bytes(raw.try_into().ok()?)),
        NcVariableType::Int(IntType::I16) => f64::from(i16::from_ne_bytes(raw.try_into().ok()?)),
        NcVariableType::Int(IntType::U32) => f64::from(u32::from_ne_bytes(raw.try_into().ok()?)),
        NcVariableType::Int(IntType::I32) => f64::from(i32::from_ne_bytes(raw.try_into().ok()?)),
        NcVariableType::Int(IntType::U64) => u64::from_ne_bytes(raw.try_into().ok()?) as f64,
        NcVariableType::Int(IntType::I64) => i64::from_ne_bytes(raw.try_into().ok()?) as f64,
        NcVariableType::Float(FloatType::F32) => f64::from(f32::from_ne_bytes(raw.try_into().ok()?)),
        NcVariableType::Float(FloatType::F64) => f64::from_ne_bytes(raw.try_into().ok()?),
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcdf::types::{CompoundType, NcTypeDescriptor};
    use std::mem::{offset_of, size_of};

    // One hydrograph record as the simulator writes it
    #[repr(C)]
    #[derive(Debug, Clone, Copy)]
    struct OutputRow {
        time: f64,
        link_id: u32,
        state0: f64,
    }

    unsafe impl NcTypeDescriptor for OutputRow {
        fn type_descriptor() -> NcVariableType {
            let field = |name: &str, basetype, offset| CompoundTypeField {
                name: name.to_string(),
                basetype,
                arraydims: None,
                offset,
            };
            NcVariableType::Compound(CompoundType {
                name: "output_row".to_string(),
                size: size_of::<OutputRow>(),
                fields: vec![
                    field(
                        "Time",
                        NcVariableType::Float(FloatType::F64),
                        offset_of!(OutputRow, time),
                    ),
                    field(
                        "LinkID",
                        NcVariableType::Int(IntType::U32),
                        offset_of!(OutputRow, link_id),
                    ),
                    field(
                        "State0",
                        NcVariableType::Float(FloatType::F64),
                        offset_of!(OutputRow, state0),
                    ),
                ],
            })
        }
    }

    fn row(time: f64, link_id: u32, state0: f64) -> OutputRow {
        OutputRow {
            time,
            link_id,
            state0,
        }
    }

    #[test]
    fn reads_compound_outputs_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.h5");
        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_type::<OutputRow>().unwrap();
            file.add_dimension("row", 4).unwrap();
            let mut outputs = file
                .add_variable::<OutputRow>(OUTPUTS_DATASET, &["row"])
                .unwrap();
            outputs
                .put_values(
                    &[
                        row(0.0, 1, 0.1),
                        row(0.0, 2, 5.0),
                        row(60.0, 1, 0.2),
                        row(60.0, 2, 5.5),
                    ],
                    ..,
                )
                .unwrap();
        }

        let table = load_netcdf_output(&path).unwrap();
        assert_eq!(table.fields(), &["Time", "LinkID", "State0"]);
        assert_eq!(table.rows(), 4);

        let (time, q) = table.filter_by_link(2, "State0").unwrap();
        assert_eq!(time, vec![0.0, 60.0]);
        assert_eq!(q, vec![5.0, 5.5]);
    }

    #[test]
    fn plain_outputs_variable_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.nc");
        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_dimension("row", 2).unwrap();
            let mut outputs = file.add_variable::<f64>(OUTPUTS_DATASET, &["row"]).unwrap();
            outputs.put_values(&[1.0, 2.0], ..).unwrap();
        }

        assert!(matches!(
            load_netcdf_output(&path),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn decodes_members_at_offsets() {
        let mut bytes = vec![0u8; 16];
        bytes[4..8].copy_from_slice(&7u32.to_ne_bytes());
        bytes[8..16].copy_from_slice(&2.5f64.to_ne_bytes());

        assert_eq!(
            decode_member(&bytes, 4, &NcVariableType::Int(IntType::U32)),
            Some(7.0)
        );
        assert_eq!(
            decode_member(&bytes, 8, &NcVariableType::Float(FloatType::F64)),
            Some(2.5)
        );
        assert_eq!(
            decode_member(&bytes, 12, &NcVariableType::Float(FloatType::F64)),
            None
        );
    }
}
