//! Stage-1 candidate selection
//!
//! Items are scored by the predicted probability of their own emotion cluster,
//! then admitted greedily in score order while skipping near-duplicates by
//! note similarity. The notes most present in the admitted set are surfaced
//! for the caller to rate.

use crate::config::SelectorConfig;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use whiff_core::{CatalogItem, EmotionProbabilities, Error, ItemId, NoteVectorizer, Result, Vector};

/// Soft-label score of every catalog item, in catalog order
///
/// Fails with [`Error::ClusterOutOfRange`] when an item names a cluster the
/// classifier does not predict.
pub fn emotion_scores(probs: &EmotionProbabilities, catalog: &[CatalogItem]) -> Result<Vec<f32>> {
    catalog
        .iter()
        .map(|item| {
            probs
                .get(item.emotion_cluster)
                .ok_or_else(|| Error::ClusterOutOfRange {
                    item: item.id.to_string(),
                    cluster: item.emotion_cluster,
                    num_classes: probs.num_classes(),
                })
        })
        .collect()
}

/// An item admitted in stage 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedItem {
    /// Position in the catalog the selection was computed over
    pub index: usize,
    pub item_id: ItemId,
    pub emotion_score: f32,
}

/// Diverse candidates plus the notes to ask the user about
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stage1Selection {
    pub selected: Vec<SelectedItem>,
    pub surfaced_notes: Vec<String>,
}

impl Stage1Selection {
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.selected.iter().any(|s| &s.item_id == id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Stage1Selector {
    config: SelectorConfig,
}

impl Stage1Selector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Select up to `top_k` diverse items and surface their dominant notes
    ///
    /// `note_vectors` must hold one vector per catalog item, in catalog order.
    pub fn select(
        &self,
        probs: &EmotionProbabilities,
        catalog: &[CatalogItem],
        note_vectors: &[Vector],
        vectorizer: &NoteVectorizer,
    ) -> Result<Stage1Selection> {
        if note_vectors.len() != catalog.len() {
            return Err(Error::InvalidDimension {
                expected: catalog.len(),
                actual: note_vectors.len(),
            });
        }

        let scores = emotion_scores(probs, catalog)?;

        // stable: equal scores keep catalog order
        let mut order: Vec<usize> = (0..catalog.len()).collect();
        order.sort_by_key(|&i| Reverse(OrderedFloat(scores[i])));

        let mut selected: Vec<SelectedItem> = Vec::with_capacity(self.config.top_k);
        let mut skipped = 0usize;
        for i in order {
            if selected.len() >= self.config.top_k {
                break;
            }
            let candidate = &note_vectors[i];
            let duplicate = selected.iter().any(|s| {
                candidate.cosine_similarity(&note_vectors[s.index]) >= self.config.similarity_threshold
            });
            if duplicate {
                skipped += 1;
                continue;
            }
            selected.push(SelectedItem {
                index: i,
                item_id: catalog[i].id.clone(),
                emotion_score: scores[i],
            });
        }

        let surfaced_notes = self.surface_notes(&selected, note_vectors, vectorizer);

        tracing::debug!(
            catalog = catalog.len(),
            selected = selected.len(),
            skipped,
            surfaced = surfaced_notes.len(),
            "stage 1 selection"
        );

        Ok(Stage1Selection {
            selected,
            surfaced_notes,
        })
    }

    /// Terms with the highest summed count over the selected items
    ///
    /// Ties fall back to vocabulary order; terms absent from every selected
    /// item are never surfaced.
    pub fn surface_notes(
        &self,
        selected: &[SelectedItem],
        note_vectors: &[Vector],
        vectorizer: &NoteVectorizer,
    ) -> Vec<String> {
        let mut totals = Vector::zeros(vectorizer.dim());
        for s in selected {
            if let Some(v) = note_vectors.get(s.index) {
                totals += v;
            }
        }
        totals
            .ranked_nonzero()
            .into_iter()
            .filter_map(|i| vectorizer.term(i).map(str::to_string))
            .take(self.config.surfaced_notes)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probs(first: f32) -> EmotionProbabilities {
        let rest = (1.0 - first) / 5.0;
        let mut p = vec![rest; 6];
        p[0] = first;
        EmotionProbabilities::new(p)
    }

    fn select(catalog: &[CatalogItem], p: &EmotionProbabilities) -> Stage1Selection {
        let vectorizer = NoteVectorizer::fit_items(catalog);
        let vectors = vectorizer.transform_catalog(catalog);
        Stage1Selector::default()
            .select(p, catalog, &vectors, &vectorizer)
            .unwrap()
    }

    #[test]
    fn test_emotion_scores_are_cluster_lookups() {
        let catalog = vec![
            CatalogItem::new(1, "rose, vanilla", 0),
            CatalogItem::new(2, "rose, vanilla", 0),
            CatalogItem::new(3, "oud, smoke", 1),
        ];
        let p = EmotionProbabilities::new(vec![0.9, 0.1, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(emotion_scores(&p, &catalog).unwrap(), vec![0.9, 0.9, 0.1]);
    }

    #[test]
    fn test_identical_items_deduplicated() {
        let catalog = vec![
            CatalogItem::new(1, "rose, vanilla", 0),
            CatalogItem::new(2, "rose, vanilla", 0),
            CatalogItem::new(3, "oud, smoke", 1),
        ];
        let p = EmotionProbabilities::new(vec![0.9, 0.1, 0.0, 0.0, 0.0, 0.0]);
        let selection = select(&catalog, &p);

        let ids: Vec<&ItemId> = selection.selected.iter().map(|s| &s.item_id).collect();
        assert_eq!(ids, vec![&ItemId::Integer(1), &ItemId::Integer(3)]);
        assert_eq!(selection.selected[0].emotion_score, 0.9);
    }

    #[test]
    fn test_no_selected_pair_too_similar() {
        let catalog: Vec<CatalogItem> = (0..30)
            .map(|i| {
                let notes = match i % 4 {
                    0 => "rose, vanilla",
                    1 => "rose, vanilla, musk",
                    2 => "oud, smoke",
                    _ => "citrus, bergamot, neroli",
                };
                CatalogItem::new(i as u64, notes, i % 6)
            })
            .collect();
        let vectorizer = NoteVectorizer::fit_items(&catalog);
        let vectors = vectorizer.transform_catalog(&catalog);
        let selection = Stage1Selector::default()
            .select(&probs(0.5), &catalog, &vectors, &vectorizer)
            .unwrap();

        assert!(selection.selected.len() <= 10);
        for (a, sa) in selection.selected.iter().enumerate() {
            for sb in &selection.selected[a + 1..] {
                assert!(vectors[sa.index].cosine_similarity(&vectors[sb.index]) < 0.95);
            }
        }
    }

    #[test]
    fn test_selection_bounded_by_top_k_and_catalog() {
        let catalog: Vec<CatalogItem> = (0..25)
            .map(|i| CatalogItem::new(i as u64, &format!("note{}", i), 0))
            .collect();
        assert_eq!(select(&catalog, &probs(0.5)).selected.len(), 10);
        assert_eq!(select(&catalog[..3], &probs(0.5)).selected.len(), 3);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let catalog: Vec<CatalogItem> = ["a", "b", "c"]
            .iter()
            .enumerate()
            .map(|(i, n)| CatalogItem::new(i as u64, n, 2))
            .collect();
        let selection = select(&catalog, &probs(0.5));
        let indices: Vec<usize> = selection.selected.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_surfaced_notes_by_count_then_vocabulary() {
        let catalog = vec![
            CatalogItem::new(1, "vanilla, rose", 0),
            CatalogItem::new(2, "vanilla, amber", 0),
            CatalogItem::new(3, "oud", 0),
        ];
        let selection = select(&catalog, &probs(0.5));
        assert_eq!(selection.surfaced_notes, vec!["vanilla", "amber", "oud", "rose"]);
    }

    #[test]
    fn test_surfaced_notes_limited() {
        let notes: Vec<String> = (0..20).map(|i| format!("n{:02}", i)).collect();
        let catalog = vec![CatalogItem::new(1, &notes.join(", "), 0)];
        let selection = select(&catalog, &probs(0.5));
        assert_eq!(selection.surfaced_notes.len(), 15);
        assert_eq!(selection.surfaced_notes[0], "n00");
    }

    #[test]
    fn test_empty_catalog() {
        let selection = select(&[], &probs(0.5));
        assert!(selection.is_empty());
        assert!(selection.surfaced_notes.is_empty());
    }

    #[test]
    fn test_cluster_out_of_range() {
        let catalog = vec![CatalogItem::new("x", "rose", 9)];
        let err = emotion_scores(&probs(0.5), &catalog).unwrap_err();
        assert!(matches!(err, Error::ClusterOutOfRange { cluster: 9, num_classes: 6, .. }));
    }

    #[test]
    fn test_vector_count_mismatch() {
        let catalog = vec![CatalogItem::new(1, "rose", 0)];
        let vectorizer = NoteVectorizer::fit_items(&catalog);
        let result = Stage1Selector::default().select(&probs(0.5), &catalog, &[], &vectorizer);
        assert!(matches!(result, Err(Error::InvalidDimension { expected: 1, actual: 0 })));
    }
}
