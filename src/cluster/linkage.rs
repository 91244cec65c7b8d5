//! Single-linkage merge sequence and connected components at a cut.

use crate::filter::Metric;

/// One merge of the single-linkage hierarchy: an edge of the minimum
/// spanning tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    /// Endpoint already in the tree when the edge was added.
    pub left: usize,
    /// Endpoint joined by the edge.
    pub right: usize,
    /// Distance between the two endpoints.
    pub distance: f64,
}

/// Single-linkage merges of `points`, sorted by ascending distance.
///
/// Built with Prim's algorithm on the dense distance graph: O(n^2) time,
/// O(n) extra memory. Ties keep the order in which Prim discovered them.
pub fn single_linkage(points: &[&[f64]], metric: Metric) -> Vec<Merge> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }

    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut nearest = vec![0usize; n];
    let mut merges = Vec::with_capacity(n - 1);

    let mut current = 0;
    in_tree[0] = true;
    for _ in 1..n {
        let mut next = usize::MAX;
        let mut next_dist = f64::INFINITY;

        for i in 0..n {
            if in_tree[i] {
                continue;
            }
            let d = metric.distance(points[current], points[i]);
            if d < best[i] {
                best[i] = d;
                nearest[i] = current;
            }
            if next == usize::MAX || best[i] < next_dist {
                next = i;
                next_dist = best[i];
            }
        }

        in_tree[next] = true;
        merges.push(Merge {
            left: nearest[next],
            right: next,
            distance: next_dist,
        });
        current = next;
    }

    merges.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    merges
}

/// Disjoint-set forest with path halving and union by size.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    /// `n` singleton sets.
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    /// Representative of `x`'s set.
    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets of `a` and `b`. Returns false if already merged.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
        true
    }
}

/// Labels of `n_points` after applying the first `n_applied` merges.
///
/// Components are labelled `0..k` in order of their smallest point index.
pub fn labels_at_cut(n_points: usize, merges: &[Merge], n_applied: usize) -> Vec<usize> {
    let mut forest = UnionFind::new(n_points);
    for merge in merges.iter().take(n_applied) {
        forest.union(merge.left, merge.right);
    }

    let mut root_label: Vec<Option<usize>> = vec![None; n_points];
    let mut next_label = 0;
    (0..n_points)
        .map(|p| {
            let root = forest.find(p);
            *root_label[root].get_or_insert_with(|| {
                next_label += 1;
                next_label - 1
            })
        })
        .collect()
}
