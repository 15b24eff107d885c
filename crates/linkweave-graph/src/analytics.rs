//! Graph analytics: orphans, most-connected notes, tag clusters.
//!
//! All queries are read-only over one [`LinkGraph`] snapshot and deterministic:
//! ties are always broken by path ascending. Self-links never count toward
//! connectedness.

use crate::graph::LinkGraph;
use linkweave_core::NoteIdentity;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Default minimum number of distinct notes sharing a tag
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 3;

/// A note with its link counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedNote {
    pub id: NoteIdentity,
    pub in_degree: usize,
    pub out_degree: usize,
    pub degree: usize,
}

/// Notes sharing a tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCluster {
    pub tag: String,
    /// Sorted by path
    pub members: Vec<NoteIdentity>,
    /// Member with the most links to other members
    pub central: NoteIdentity,
    /// Links with both endpoints in the cluster
    pub internal_links: usize,
}

/// Analytics over one graph snapshot
pub struct GraphAnalytics<'a> {
    graph: &'a LinkGraph,
    min_cluster_size: usize,
}

impl<'a> GraphAnalytics<'a> {
    /// Create a new analyzer
    pub fn new(graph: &'a LinkGraph) -> Self {
        Self {
            graph,
            min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
        }
    }

    /// Override the cluster size threshold
    pub fn with_min_cluster_size(mut self, min_cluster_size: usize) -> Self {
        self.min_cluster_size = min_cluster_size.max(1);
        self
    }

    /// Notes with zero in- and out-degree, sorted by path
    pub fn orphans(&self) -> Vec<NoteIdentity> {
        self.graph.orphaned_notes()
    }

    /// Every note ranked by total degree descending, then path ascending.
    ///
    /// `limit` truncates the ranking.
    pub fn most_connected(&self, limit: Option<usize>) -> Vec<ConnectedNote> {
        let mut ranked: Vec<ConnectedNote> = self
            .graph
            .identities()
            .map(|id| {
                let in_degree = self.graph.in_degree(id);
                let out_degree = self.graph.out_degree(id);
                ConnectedNote {
                    id: id.clone(),
                    in_degree,
                    out_degree,
                    degree: in_degree + out_degree,
                }
            })
            .collect();

        ranked.sort_by(|a, b| b.degree.cmp(&a.degree).then_with(|| a.id.cmp(&b.id)));
        if let Some(limit) = limit {
            ranked.truncate(limit);
        }
        ranked
    }

    /// Tag clusters, sorted by tag.
    ///
    /// A tag forms a cluster only with at least `min_cluster_size` distinct
    /// notes. The central note has the highest degree counting only edges whose
    /// endpoints are both members.
    pub fn clusters(&self) -> Vec<TagCluster> {
        let mut by_tag: BTreeMap<&str, BTreeSet<&NoteIdentity>> = BTreeMap::new();
        for node in self.graph.nodes() {
            for tag in &node.tags {
                by_tag.entry(tag.as_str()).or_default().insert(&node.id);
            }
        }

        by_tag
            .into_iter()
            .filter(|(_, members)| members.len() >= self.min_cluster_size)
            .filter_map(|(tag, members)| self.cluster(tag, &members))
            .collect()
    }

    fn cluster(&self, tag: &str, members: &BTreeSet<&NoteIdentity>) -> Option<TagCluster> {
        let mut internal_degree: BTreeMap<&NoteIdentity, usize> =
            members.iter().map(|&id| (id, 0)).collect();
        let mut internal_links = 0;

        for edge in self.graph.edges() {
            if edge.is_self_edge()
                || !members.contains(&edge.source)
                || !members.contains(&edge.target)
            {
                continue;
            }
            internal_links += 1;
            if let Some(count) = internal_degree.get_mut(&edge.source) {
                *count += 1;
            }
            if let Some(count) = internal_degree.get_mut(&edge.target) {
                *count += 1;
            }
        }

        // BTreeMap iterates by path, so the first maximum wins ties
        let central = internal_degree
            .iter()
            .fold(None, |best: Option<(&NoteIdentity, usize)>, (&id, &degree)| {
                match best {
                    Some((_, best_degree)) if best_degree >= degree => best,
                    _ => Some((id, degree)),
                }
            })
            .map(|(id, _)| id.clone())?;

        Some(TagCluster {
            tag: tag.to_string(),
            members: members.iter().map(|&id| id.clone()).collect(),
            central,
            internal_links,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkweave_core::{NoteNode, RawReference, ReferenceKind};

    fn note(path: &str, targets: &[&str], tags: &[&str]) -> (NoteNode, Vec<RawReference>) {
        let id = NoteIdentity::new(path);
        let node = NoteNode::new(id.clone(), id.file_path("md")).with_tags(tags.iter().copied());
        let refs = targets
            .iter()
            .enumerate()
            .map(|(i, t)| RawReference {
                source: id.clone(),
                line: i + 1,
                column: 0,
                link_text: format!("[[{}]]", t),
                target: t.to_string(),
                alias: None,
                fragment: None,
                kind: ReferenceKind::Bracketed,
                embed: false,
            })
            .collect();
        (node, refs)
    }

    #[test]
    fn test_orphans_and_most_connected() {
        let graph = LinkGraph::from_notes(
            vec![note("A", &["B"], &[]), note("B", &[], &[]), note("C", &[], &[])],
            "md",
        );
        let analytics = GraphAnalytics::new(&graph);

        assert_eq!(analytics.orphans(), vec![NoteIdentity::new("C")]);

        let ranked = analytics.most_connected(None);
        let order: Vec<_> = ranked.iter().map(|n| (n.id.path.as_str(), n.degree)).collect();
        assert_eq!(order, vec![("A", 1), ("B", 1), ("C", 0)]);
        assert_eq!(analytics.most_connected(Some(1)).len(), 1);
    }

    #[test]
    fn test_self_edges_ignored_in_ranking() {
        let graph = LinkGraph::from_notes(
            vec![note("A", &["A", "A"], &[]), note("B", &["C"], &[]), note("C", &[], &[])],
            "md",
        );
        let ranked = GraphAnalytics::new(&graph).most_connected(None);
        assert_eq!(ranked[0].id.path, "B");
        assert_eq!(ranked.last().unwrap().id.path, "A");
        assert_eq!(ranked.last().unwrap().degree, 0);
    }

    #[test]
    fn test_cluster_threshold() {
        let graph = LinkGraph::from_notes(
            vec![
                note("A", &[], &["bees", "garden"]),
                note("B", &[], &["bees", "garden"]),
                note("C", &[], &["bees"]),
            ],
            "md",
        );
        let clusters = GraphAnalytics::new(&graph).clusters();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].tag, "bees");
        assert_eq!(clusters[0].members.len(), 3);

        let clusters = GraphAnalytics::new(&graph)
            .with_min_cluster_size(2)
            .clusters();
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn test_cluster_central_uses_internal_edges() {
        // D is the busiest note overall but its links leave the cluster
        let graph = LinkGraph::from_notes(
            vec![
                note("A", &["D", "D", "D"], &["t"]),
                note("B", &["C"], &["t"]),
                note("C", &["B"], &["t"]),
                note("D", &["A"], &[]),
            ],
            "md",
        );
        let clusters = GraphAnalytics::new(&graph).clusters();
        assert_eq!(clusters.len(), 1);
        // B and C tie at 2 internal links; path breaks the tie
        assert_eq!(clusters[0].central, NoteIdentity::new("B"));
        assert_eq!(clusters[0].internal_links, 2);
    }

    #[test]
    fn test_cluster_central_all_zero_picks_first_path() {
        let graph = LinkGraph::from_notes(
            vec![
                note("Z", &[], &["t"]),
                note("M", &[], &["t"]),
                note("K", &[], &["t"]),
            ],
            "md",
        );
        let clusters = GraphAnalytics::new(&graph).clusters();
        assert_eq!(clusters[0].central, NoteIdentity::new("K"));
    }
}
