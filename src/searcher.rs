use anyhow::{Result, ensure};
use ndarray::{Array2, ArrayView1};

use crate::featdb::ImageFeature;
use crate::knn::CosineIndex;

/// How many image-level neighbors to pull before deduplicating into
/// products. Capped at the store size by the index.
pub const NEIGHBOR_CANDIDATES: usize = 50;

/// Product-level similarity search over the stored image embeddings.
///
/// Holds the brute-force cosine index plus a parallel list mapping each row
/// back to its owning product. Rebuilt from the feature table on every
/// invocation; nothing is persisted between runs.
#[derive(Debug)]
pub struct ProductIndex {
    index: CosineIndex,
    product_ids: Vec<i64>,
}

impl ProductIndex {
    /// Build the index from stored features. Fails on an empty store or on
    /// any row whose vector does not have `dim` components, both of which
    /// mean the store needs re-extraction.
    pub fn build(features: &[ImageFeature], dim: usize) -> Result<Self> {
        ensure!(!features.is_empty(), "feature store is empty, run `visearch extract` first");

        let mut flat = Vec::with_capacity(features.len() * dim);
        let mut product_ids = Vec::with_capacity(features.len());
        for feature in features {
            ensure!(
                feature.embedding.len() == dim,
                "corrupt feature row for image {}: expected {} dimensions, found {}",
                feature.image_id,
                dim,
                feature.embedding.len()
            );
            flat.extend_from_slice(&feature.embedding);
            product_ids.push(feature.product_id);
        }

        let vectors = Array2::from_shape_vec((features.len(), dim), flat)?;
        Ok(Self { index: CosineIndex::new(vectors), product_ids })
    }

    /// Number of indexed image embeddings.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Return up to `top_k` distinct products ordered by the cosine distance
    /// of each product's nearest image, closest first.
    pub fn search(&self, query: ArrayView1<'_, f32>, top_k: usize) -> Vec<(f32, i64)> {
        let mut results: Vec<(f32, i64)> = Vec::new();
        for hit in self.index.search(query, NEIGHBOR_CANDIDATES) {
            if results.len() >= top_k {
                break;
            }
            let product_id = self.product_ids[hit.index];
            // Candidates arrive closest-first, so the first sighting of a
            // product is its best-matching image.
            if results.iter().any(|&(_, id)| id == product_id) {
                continue;
            }
            results.push((hit.distance, product_id));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn feature(image_id: i64, product_id: i64, embedding: &[f32]) -> ImageFeature {
        ImageFeature { image_id, product_id, embedding: embedding.to_vec() }
    }

    #[test]
    fn test_dedup_returns_each_product_once() {
        // Product 1 owns the three closest vectors, product 2 one further
        // out: top-2 must be [1, 2], not [1, 1].
        let frac = std::f32::consts::FRAC_1_SQRT_2;
        let index = ProductIndex::build(
            &[
                feature(10, 1, &[1.0, 0.0]),
                feature(11, 1, &[0.98, 0.198_997_49]),
                feature(12, 1, &[frac, frac]),
                feature(20, 2, &[0.0, 1.0]),
            ],
            2,
        )
        .unwrap();

        let results = index.search(array![1.0f32, 0.0].view(), 2);
        let ids: Vec<i64> = results.iter().map(|&(_, id)| id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_results_ordered_by_nearest_image() {
        let index = ProductIndex::build(
            &[
                feature(1, 7, &[0.0, 1.0]),
                feature(2, 3, &[1.0, 0.0]),
                feature(3, 5, &[0.6, 0.8]),
            ],
            2,
        )
        .unwrap();

        let results = index.search(array![1.0f32, 0.0].view(), 10);
        let ids: Vec<i64> = results.iter().map(|&(_, id)| id).collect();
        assert_eq!(ids, vec![3, 5, 7]);
        for pair in results.windows(2) {
            assert!(pair[0].0 <= pair[1].0);
        }
    }

    #[test]
    fn test_truncates_to_top_k() {
        let features: Vec<ImageFeature> =
            (0..8).map(|i| feature(i, i, &[1.0, 0.0])).collect();
        let index = ProductIndex::build(&features, 2).unwrap();
        assert_eq!(index.len(), 8);

        let results = index.search(array![1.0f32, 0.0].view(), 3);
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_top_k_zero_returns_nothing() {
        let index = ProductIndex::build(
            &[feature(1, 1, &[1.0, 0.0]), feature(2, 2, &[0.0, 1.0])],
            2,
        )
        .unwrap();
        assert!(index.search(array![1.0f32, 0.0].view(), 0).is_empty());
    }

    #[test]
    fn test_build_rejects_empty_store() {
        let err = ProductIndex::build(&[], 2).unwrap_err();
        assert!(err.to_string().contains("feature store is empty"));
    }

    #[test]
    fn test_build_rejects_dimension_mismatch() {
        let err = ProductIndex::build(
            &[feature(1, 1, &[1.0, 0.0]), feature(2, 1, &[1.0, 0.0, 0.0])],
            2,
        )
        .unwrap_err();
        assert!(err.to_string().contains("expected 2 dimensions"));
    }
}
