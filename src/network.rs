use crate::error::{Error, Result};
use crate::parameters::LinkParameters;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;
use tracing::debug;

pub type LinkId = u32;

/// One `id` line and the values line that follows it.
#[derive(Debug, Clone)]
pub(crate) struct RecordPair {
    pub id: LinkId,
    pub body_line: usize,
    pub body: String,
}

/// Reads the alternating record layout shared by `.rvr` and `.prm` files.
///
/// Blank lines are ignored. The first remaining line is the link count and is
/// informational only; after it, lines alternate between a link id and that
/// link's values.
pub(crate) fn read_record_pairs(path: &Path) -> Result<Vec<RecordPair>> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

    let lines: Vec<(usize, &str)> = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .skip(1)
        .collect();

    if lines.len() % 2 != 0 {
        let (last_line, _) = lines[lines.len() - 1];
        return Err(Error::format(
            path,
            last_line,
            format!("link id without a values record ({} records)", lines.len()),
        ));
    }

    lines
        .chunks(2)
        .map(|pair| {
            let (id_line, id_text) = pair[0];
            let (body_line, body) = pair[1];
            let id = id_text.parse::<LinkId>().map_err(|e| {
                Error::format(path, id_line, format!("invalid link id {:?}: {}", id_text, e))
            })?;
            Ok(RecordPair {
                id,
                body_line,
                body: body.to_string(),
            })
        })
        .collect()
}

// Network topology read from a .rvr file
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    links: Vec<LinkId>,
    upstream: HashMap<LinkId, Vec<LinkId>>,
}

impl Network {
    /// Builds a network from links in file order and their upstream neighbours.
    pub fn new(links: Vec<LinkId>, connectivity: Vec<Vec<LinkId>>) -> Result<Self> {
        if links.len() != connectivity.len() {
            return Err(Error::Domain(format!(
                "{} links but {} connectivity records",
                links.len(),
                connectivity.len()
            )));
        }

        let mut upstream = HashMap::with_capacity(links.len());
        for (id, parents) in links.iter().zip(connectivity) {
            if upstream.insert(*id, parents).is_some() {
                return Err(Error::Domain(format!("duplicate link id {}", id)));
            }
        }

        let network = Network { links, upstream };
        network.check_references()?;
        network.routing_order()?;
        Ok(network)
    }

    /// Parses a `.rvr` topology file.
    ///
    /// Each values record is `<parent count> <id>...`; the count is dropped, so
    /// a record of `0` yields a headwater with no upstream links.
    pub fn parse(path: &Path) -> Result<Self> {
        let records = read_record_pairs(path)?;

        let mut links = Vec::with_capacity(records.len());
        let mut connectivity = Vec::with_capacity(records.len());
        for record in records {
            let tokens = record
                .body
                .split_whitespace()
                .map(|token| {
                    token.parse::<LinkId>().map_err(|e| {
                        Error::format(
                            path,
                            record.body_line,
                            format!("invalid connectivity token {:?}: {}", token, e),
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let parents = tokens.get(1..).map(<[LinkId]>::to_vec).unwrap_or_default();
            if tokens.first().copied() != Some(parents.len() as LinkId) {
                return Err(Error::format(
                    path,
                    record.body_line,
                    format!(
                        "parent count {:?} does not match {} listed parents",
                        tokens.first(),
                        parents.len()
                    ),
                ));
            }
            links.push(record.id);
            connectivity.push(parents);
        }

        let network = Network::new(links, connectivity).map_err(|e| match e {
            Error::Domain(message) => Error::format(path, 0, message),
            other => other,
        })?;
        debug!("Parsed {} links from {}", network.len(), path.display());
        Ok(network)
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

    pub fn contains(&self, id: LinkId) -> bool {
        self.upstream.contains_key(&id)
    }

    /// Immediate upstream links of `id`, empty for headwaters.
    pub fn upstream_of(&self, id: LinkId) -> Option<&[LinkId]> {
        self.upstream.get(&id).map(Vec::as_slice)
    }

    /// Upstream lists aligned with `links()`.
    pub fn connectivity(&self) -> Vec<Vec<LinkId>> {
        self.links
            .iter()
            .map(|id| self.upstream.get(id).cloned().unwrap_or_default())
            .collect()
    }

    pub fn headwaters(&self) -> Vec<LinkId> {
        self.links
            .iter()
            .copied()
            .filter(|id| self.upstream.get(id).is_some_and(Vec::is_empty))
            .collect()
    }

    fn check_references(&self) -> Result<()> {
        for id in &self.links {
            for parent in &self.upstream[id] {
                if !self.upstream.contains_key(parent) {
                    return Err(Error::Domain(format!(
                        "link {} lists upstream link {} which is not in the network",
                        id, parent
                    )));
                }
            }
        }
        Ok(())
    }

    /// Links ordered so that every link comes after all of its upstream links.
    pub fn routing_order(&self) -> Result<Vec<LinkId>> {
        let mut downstream: HashMap<LinkId, Vec<LinkId>> = HashMap::new();
        let mut in_degree: HashMap<LinkId, usize> = HashMap::with_capacity(self.links.len());

        for id in &self.links {
            let parents = &self.upstream[id];
            in_degree.insert(*id, parents.len());
            for parent in parents {
                downstream.entry(*parent).or_default().push(*id);
            }
        }

        // Headwaters first, in file order
        let mut queue: VecDeque<LinkId> = self
            .links
            .iter()
            .copied()
            .filter(|id| in_degree[id] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.links.len());
        while let Some(current) = queue.pop_front() {
            order.push(current);
            if let Some(children) = downstream.get(&current) {
                for child in children {
                    if let Some(degree) = in_degree.get_mut(child) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push_back(*child);
                        }
                    }
                }
            }
        }

        if order.len() != self.links.len() {
            return Err(Error::Domain(format!(
                "cycle detected in network topology: ordered {} links out of {}",
                order.len(),
                self.links.len()
            )));
        }

        Ok(order)
    }

    /// Upstream areas in topology order, after checking that `params` covers
    /// exactly the links of this network.
    pub fn upstream_areas(&self, params: &LinkParameters) -> Result<Vec<f64>> {
        let params_ids: HashSet<LinkId> = params.links().iter().copied().collect();
        let missing: Vec<LinkId> = self
            .links
            .iter()
            .copied()
            .filter(|id| !params_ids.contains(id))
            .collect();
        let extra: Vec<LinkId> = params
            .links()
            .iter()
            .copied()
            .filter(|id| !self.upstream.contains_key(id))
            .collect();

        if !missing.is_empty() || !extra.is_empty() {
            return Err(Error::Domain(format!(
                "parameter links do not match topology: missing {:?}, extra {:?}",
                missing, extra
            )));
        }

        Ok(self
            .links
            .iter()
            .filter_map(|id| params.get(*id))
            .map(|attrs| attrs.upstream_area_km2)
            .collect())
    }

    /// Largest upstream area among the links, i.e. the outlet's drainage area.
    pub fn outlet_area(&self, params: &LinkParameters) -> Result<f64> {
        self.upstream_areas(params)?
            .into_iter()
            .reduce(f64::max)
            .ok_or_else(|| Error::Domain("network has no links".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn rvr_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_links_and_connectivity() {
        let file = rvr_file("3\n\n10\n2 20 30\n\n20\n0\n\n30\n0\n");
        let network = Network::parse(file.path()).unwrap();

        assert_eq!(network.links(), &[10, 20, 30]);
        assert_eq!(network.connectivity(), vec![vec![20, 30], vec![], vec![]]);
        assert_eq!(network.headwaters(), vec![20, 30]);
        assert_eq!(network.upstream_of(10), Some(&[20, 30][..]));
    }

    #[test]
    fn every_parent_is_a_link() {
        let file = rvr_file("4\n1\n1 2\n2\n2 3 4\n3\n0\n4\n0\n");
        let network = Network::parse(file.path()).unwrap();

        assert_eq!(network.links().len(), network.connectivity().len());
        for parents in network.connectivity() {
            for parent in parents {
                assert!(network.contains(parent));
            }
        }
    }

    #[test]
    fn routing_order_puts_upstream_first() {
        let file = rvr_file("4\n1\n1 2\n2\n2 3 4\n3\n0\n4\n0\n");
        let network = Network::parse(file.path()).unwrap();

        assert_eq!(network.routing_order().unwrap(), vec![3, 4, 2, 1]);
    }

    #[test]
    fn odd_record_count_is_a_format_error() {
        let file = rvr_file("2\n1\n1 2\n2\n");
        let err = Network::parse(file.path()).unwrap_err();
        assert!(matches!(err, Error::Format { line: 4, .. }), "{err}");
    }

    #[test]
    fn non_integer_token_is_a_format_error() {
        let file = rvr_file("1\n1\n1 x\n");
        let err = Network::parse(file.path()).unwrap_err();
        assert!(matches!(err, Error::Format { line: 3, .. }), "{err}");
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let file = rvr_file("1\n1\n1 99\n");
        assert!(matches!(
            Network::parse(file.path()),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn cycles_are_rejected() {
        let err = Network::new(vec![1, 2], vec![vec![2], vec![1]]).unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }
}
