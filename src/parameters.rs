use crate::error::{Error, Result};
use crate::network::{LinkId, read_record_pairs};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

const KM_TO_M: f64 = 1e3;
const KM2_TO_M2: f64 = 1e6;

// Physical attributes of one link, in SI units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkAttributes {
    /// Total upstream drainage area [km²]
    pub upstream_area_km2: f64,
    /// Channel length [m]
    pub length_m: f64,
    /// Hillslope area [m²]
    pub hillslope_area_m2: f64,
}

// Per-link parameters read from a .prm file
#[derive(Debug, Clone, PartialEq)]
pub struct LinkParameters {
    links: Vec<LinkId>,
    attributes: HashMap<LinkId, LinkAttributes>,
}

impl LinkParameters {
    /// Parses a `.prm` file.
    ///
    /// Values lines hold `upstream area [km²]`, `length [km]` and
    /// `hillslope area [km²]`. Length and hillslope area are converted to
    /// metres and square metres here, so callers must not convert again.
    pub fn parse(path: &Path) -> Result<Self> {
        let records = read_record_pairs(path)?;

        let mut links = Vec::with_capacity(records.len());
        let mut attributes = HashMap::with_capacity(records.len());
        for record in records {
            let values = record
                .body
                .split_whitespace()
                .map(|token| {
                    token.parse::<f64>().map_err(|e| {
                        Error::format(
                            path,
                            record.body_line,
                            format!("invalid parameter {:?}: {}", token, e),
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let [area, length_km, hillslope_km2] = values[..] else {
                return Err(Error::format(
                    path,
                    record.body_line,
                    format!("expected 3 parameters, found {}", values.len()),
                ));
            };

            let attrs = LinkAttributes {
                upstream_area_km2: area,
                length_m: length_km * KM_TO_M,
                hillslope_area_m2: hillslope_km2 * KM2_TO_M2,
            };
            if attributes.insert(record.id, attrs).is_some() {
                return Err(Error::format(
                    path,
                    record.body_line,
                    format!("duplicate link id {}", record.id),
                ));
            }
            links.push(record.id);
        }

        debug!("Parsed parameters for {} links from {}", links.len(), path.display());
        Ok(LinkParameters { links, attributes })
    }

    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn get(&self, id: LinkId) -> Option<&LinkAttributes> {
        self.attributes.get(&id)
    }

    /// Upstream areas [km²] in file order.
    pub fn upstream_areas(&self) -> Vec<f64> {
        self.column(|a| a.upstream_area_km2)
    }

    /// Link lengths [m] in file order.
    pub fn lengths(&self) -> Vec<f64> {
        self.column(|a| a.length_m)
    }

    /// Hillslope areas [m²] in file order.
    pub fn hillslope_areas(&self) -> Vec<f64> {
        self.column(|a| a.hillslope_area_m2)
    }

    fn column(&self, field: impl Fn(&LinkAttributes) -> f64) -> Vec<f64> {
        self.links
            .iter()
            .filter_map(|id| self.attributes.get(id))
            .map(field)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Network;
    use std::io::Write;

    fn text_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn converts_units_on_parse() {
        let file = text_file("2\n\n5\n12.5 0.4 0.05\n\n6\n3.0 1.2 0.2\n");
        let params = LinkParameters::parse(file.path()).unwrap();

        assert_eq!(params.links(), &[5, 6]);
        assert_eq!(params.upstream_areas(), vec![12.5, 3.0]);
        assert_eq!(params.lengths(), vec![400.0, 1200.0]);
        assert_eq!(params.hillslope_areas(), vec![50_000.0, 200_000.0]);
    }

    #[test]
    fn rejects_bad_float() {
        let file = text_file("1\n5\n12.5 abc 0.05\n");
        let err = LinkParameters::parse(file.path()).unwrap_err();
        assert!(matches!(err, Error::Format { line: 3, .. }), "{err}");
    }

    #[test]
    fn rejects_wrong_value_count() {
        let file = text_file("1\n5\n12.5 0.4\n");
        assert!(matches!(
            LinkParameters::parse(file.path()),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn areas_follow_topology_order() {
        let network = Network::new(vec![6, 5], vec![vec![5], vec![]]).unwrap();
        let file = text_file("2\n5\n1.0 0.4 0.05\n6\n3.0 1.2 0.2\n");
        let params = LinkParameters::parse(file.path()).unwrap();

        assert_eq!(network.upstream_areas(&params).unwrap(), vec![3.0, 1.0]);
        assert_eq!(network.outlet_area(&params).unwrap(), 3.0);
    }

    #[test]
    fn mismatched_link_sets_are_rejected() {
        let network = Network::new(vec![5, 7], vec![vec![], vec![]]).unwrap();
        let file = text_file("2\n5\n1.0 0.4 0.05\n6\n3.0 1.2 0.2\n");
        let params = LinkParameters::parse(file.path()).unwrap();

        let err = network.upstream_areas(&params).unwrap_err();
        assert!(matches!(err, Error::Domain(_)));
        assert!(err.to_string().contains("missing [7]"));
    }
}
