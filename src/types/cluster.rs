//! Local clusters found inside cover sets.

use serde::{Deserialize, Serialize};

/// A local cluster: the points of one cover set sharing a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Index of the cover set the cluster was found in.
    pub cover_set: usize,
    /// Label assigned by the local clusterer, `0..k` within the cover set.
    pub local_cluster: usize,
    /// Global point indices, ascending.
    pub points: Vec<usize>,
}

impl Cluster {
    /// Number of points in the cluster.
    pub fn size(&self) -> usize {
        self.points.len()
    }
}

/// Group cover-set members by label into clusters.
///
/// `labels[k]` is the label of `members[k]`. Labels are expected to be
/// `0..n_labels`; clusters come out ordered by label, and empty labels are
/// skipped so no empty cluster is ever produced.
pub fn group_by_label(cover_set: usize, members: &[usize], labels: &[usize]) -> Vec<Cluster> {
    let n_labels = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut groups: Vec<Vec<usize>> = vec![Vec::new(); n_labels];

    for (&point, &label) in members.iter().zip(labels) {
        groups[label].push(point);
    }

    groups
        .into_iter()
        .enumerate()
        .filter(|(_, points)| !points.is_empty())
        .map(|(local_cluster, mut points)| {
            points.sort_unstable();
            Cluster {
                cover_set,
                local_cluster,
                points,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_label_partitions_members() {
        let members = vec![4, 5, 6, 7];
        let labels = vec![1, 0, 1, 0];

        let clusters = group_by_label(3, &members, &labels);

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].points, vec![5, 7]);
        assert_eq!(clusters[1].points, vec![4, 6]);
        assert!(clusters.iter().all(|c| c.cover_set == 3));

        let total: usize = clusters.iter().map(Cluster::size).sum();
        assert_eq!(total, members.len());
    }

    #[test]
    fn test_group_by_label_empty() {
        assert!(group_by_label(0, &[], &[]).is_empty());
    }
}
