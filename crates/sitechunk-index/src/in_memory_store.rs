use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::vector_store::{
    BoxFuture, ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError,
};

/// A point with its euclidean norm, computed once at upsert.
struct Indexed {
    point: VectorPoint,
    norm: f32,
}

impl Indexed {
    fn new(point: VectorPoint) -> Self {
        let norm = norm(&point.vector);
        Self { point, norm }
    }

    /// Cosine similarity against a query of norm `query_norm`; 0 for zero vectors.
    fn score(&self, query: &[f32], query_norm: f32) -> f32 {
        if self.norm == 0.0 || query_norm == 0.0 {
            return 0.0;
        }
        let dot: f32 = self.point.vector.iter().zip(query).map(|(a, b)| a * b).sum();
        dot / (self.norm * query_norm)
    }
}

fn norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Points keyed by id, so ties in score come out in id order.
struct Collection {
    vector_size: usize,
    points: BTreeMap<String, Indexed>,
}

impl Collection {
    fn check_dimensions(&self, vector: &[f32], what: &str) -> Result<(), String> {
        if vector.len() == self.vector_size {
            Ok(())
        } else {
            Err(format!(
                "{what} has {} dimensions, expected {}",
                vector.len(),
                self.vector_size
            ))
        }
    }
}

/// Process-local vector store for tests and dry runs.
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Stored payload of one point, if present.
    #[must_use]
    pub fn payload(
        &self,
        collection: &str,
        id: &str,
    ) -> Option<HashMap<String, serde_json::Value>> {
        let cols = self.collections.read().ok()?;
        let indexed = cols.get(collection)?.points.get(id)?;
        Some(indexed.point.payload.clone())
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let collections = self.collections.read().map(|c| c.len()).unwrap_or_default();
        f.debug_struct("InMemoryVectorStore")
            .field("collections", &collections)
            .finish()
    }
}

impl VectorStore for InMemoryVectorStore {
    fn ensure_collection(
        &self,
        collection: &str,
        vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let vector_size = usize::try_from(vector_size)
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            let existing = cols
                .entry(collection.clone())
                .or_insert_with(|| Collection {
                    vector_size,
                    points: BTreeMap::new(),
                })
                .vector_size;
            if existing != vector_size {
                return Err(VectorStoreError::Collection(format!(
                    "collection {collection} has vector size {existing}, requested {vector_size}"
                )));
            }
            Ok(())
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;
            let col = cols.get_mut(&collection).ok_or_else(|| {
                VectorStoreError::Upsert(format!("collection {collection} not found"))
            })?;
            // All or nothing: validate the whole batch before inserting.
            for point in &points {
                col.check_dimensions(&point.vector, &format!("point {}", point.id))
                    .map_err(VectorStoreError::Upsert)?;
            }
            col.points
                .extend(points.into_iter().map(|p| (p.id.clone(), Indexed::new(p))));
            Ok(())
        })
    }

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Search(e.to_string()))?;
            let col = cols.get(&collection).ok_or_else(|| {
                VectorStoreError::Search(format!("collection {collection} not found"))
            })?;
            col.check_dimensions(&vector, "query")
                .map_err(VectorStoreError::Search)?;

            let query_norm = norm(&vector);
            let mut ranked: Vec<(f32, &Indexed)> = col
                .points
                .values()
                .map(|indexed| (indexed.score(&vector, query_norm), indexed))
                .collect();
            // Stable sort keeps id order among equal scores.
            ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

            let limit = usize::try_from(limit).unwrap_or(usize::MAX);
            Ok(ranked
                .into_iter()
                .take(limit)
                .map(|(score, indexed)| ScoredVectorPoint {
                    id: indexed.point.id.clone(),
                    score,
                    payload: indexed.point.payload.clone(),
                })
                .collect())
        })
    }

    fn count(&self, collection: &str) -> BoxFuture<'_, Result<u64, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            cols.get(&collection)
                .map(|col| col.points.len() as u64)
                .ok_or_else(|| {
                    VectorStoreError::Collection(format!("collection {collection} not found"))
                })
        })
    }
}
