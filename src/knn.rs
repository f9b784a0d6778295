use ndarray::{Array1, Array2, ArrayView1};

/// A single nearest-neighbor hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Row index into the fitted vector set.
    pub index: usize,
    /// Cosine distance to the query, in `[0, 2]` for unit vectors.
    pub distance: f32,
}

/// Exact brute-force cosine nearest-neighbor index.
///
/// Every stored row and every query must be L2-normalized, which reduces
/// cosine distance to `1 - dot`. The whole set is scanned on each search;
/// there is no approximate structure and nothing is persisted.
#[derive(Debug)]
pub struct CosineIndex {
    vectors: Array2<f32>,
}

impl CosineIndex {
    pub fn new(vectors: Array2<f32>) -> Self {
        Self { vectors }
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimension of the stored vectors.
    pub fn dim(&self) -> usize {
        self.vectors.ncols()
    }

    /// Return the `k` nearest rows to `query`, closest first.
    ///
    /// `k` is capped at the number of stored rows. Equal distances break by
    /// row order so results are deterministic.
    pub fn search(&self, query: ArrayView1<'_, f32>, k: usize) -> Vec<Neighbor> {
        assert_eq!(query.len(), self.dim(), "query dimension mismatch");

        let k = k.min(self.len());
        if k == 0 {
            return vec![];
        }

        let scores: Array1<f32> = self.vectors.dot(&query);
        let mut neighbors: Vec<Neighbor> = scores
            .iter()
            .enumerate()
            .map(|(index, &dot)| Neighbor { index, distance: 1.0 - dot })
            .collect();
        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.index.cmp(&b.index)));
        neighbors.truncate(k);
        neighbors
    }
}
