use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use crate::detection::domain::detection::Detection;
use crate::detection::domain::object_kind::ObjectKind;

/// Tri-state summary of the accepted set, for a "select all" control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionState {
    All,
    Partial,
    None,
}

/// Holds the accepted detection categories and filters detection lists.
///
/// The set is replaced wholesale: a new set is built outside the lock and
/// swapped in, so `apply` always sees either the old or the new selection in
/// full.
#[derive(Debug)]
pub struct ResultFilter {
    accepted: RwLock<Arc<HashSet<ObjectKind>>>,
}

impl ResultFilter {
    pub fn new(accepted: impl IntoIterator<Item = ObjectKind>) -> Self {
        Self {
            accepted: RwLock::new(Arc::new(accepted.into_iter().collect())),
        }
    }

    /// Accepts every selectable kind.
    pub fn accepting_all() -> Self {
        Self::new(ObjectKind::selectable())
    }

    pub fn set_categories(&self, categories: impl IntoIterator<Item = ObjectKind>) {
        let next: Arc<HashSet<ObjectKind>> = Arc::new(categories.into_iter().collect());
        log::debug!("Category filter now accepts {} kind(s)", next.len());
        *self.accepted.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Keeps detections whose kind is accepted, preserving order. An empty
    /// set keeps nothing.
    pub fn apply(&self, detections: &[Detection]) -> Vec<Detection> {
        let accepted = self.snapshot();
        detections
            .iter()
            .filter(|d| accepted.contains(&d.kind))
            .cloned()
            .collect()
    }

    pub fn categories(&self) -> Vec<ObjectKind> {
        let mut kinds: Vec<_> = self.snapshot().iter().copied().collect();
        kinds.sort();
        kinds
    }

    pub fn selection_state(&self) -> SelectionState {
        let accepted = self.snapshot();
        let selected = ObjectKind::selectable()
            .filter(|kind| accepted.contains(kind))
            .count();
        if selected == ObjectKind::selectable_count() {
            SelectionState::All
        } else if selected > 0 {
            SelectionState::Partial
        } else {
            SelectionState::None
        }
    }

    fn snapshot(&self) -> Arc<HashSet<ObjectKind>> {
        self.accepted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for ResultFilter {
    fn default() -> Self {
        Self::accepting_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection::BoundingBox;
    use std::thread;

    fn detection(kind: ObjectKind, confidence: f32) -> Detection {
        Detection::new(kind, BoundingBox::new(0.1, 0.1, 0.2, 0.2), confidence)
    }

    fn kinds(detections: &[Detection]) -> Vec<ObjectKind> {
        detections.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn test_keeps_accepted_in_order() {
        let filter = ResultFilter::new([ObjectKind::Person, ObjectKind::Dog]);
        let input = vec![
            detection(ObjectKind::Person, 0.9),
            detection(ObjectKind::Car, 0.8),
            detection(ObjectKind::Dog, 0.7),
            detection(ObjectKind::Person, 0.6),
        ];

        let result = filter.apply(&input);

        assert_eq!(
            kinds(&result),
            vec![ObjectKind::Person, ObjectKind::Dog, ObjectKind::Person]
        );
        assert_eq!(result[2].confidence, 0.6);
    }

    #[test]
    fn test_empty_set_yields_empty_list() {
        let filter = ResultFilter::new([]);
        let input = vec![detection(ObjectKind::Person, 0.9)];
        assert!(filter.apply(&input).is_empty());
    }

    #[test]
    fn test_empty_input() {
        let filter = ResultFilter::accepting_all();
        assert!(filter.apply(&[]).is_empty());
    }

    #[test]
    fn test_set_categories_replaces_selection() {
        let filter = ResultFilter::new([ObjectKind::Person]);
        filter.set_categories([ObjectKind::Car]);
        let input = vec![
            detection(ObjectKind::Person, 0.9),
            detection(ObjectKind::Car, 0.9),
        ];
        assert_eq!(kinds(&filter.apply(&input)), vec![ObjectKind::Car]);
    }

    #[test]
    fn test_selection_state() {
        let filter = ResultFilter::accepting_all();
        assert_eq!(filter.selection_state(), SelectionState::All);

        filter.set_categories([ObjectKind::Cat, ObjectKind::Dog]);
        assert_eq!(filter.selection_state(), SelectionState::Partial);

        filter.set_categories([]);
        assert_eq!(filter.selection_state(), SelectionState::None);
    }

    #[test]
    fn test_undefined_alone_counts_as_none() {
        let filter = ResultFilter::new([ObjectKind::Undefined]);
        assert_eq!(filter.selection_state(), SelectionState::None);
    }

    #[test]
    fn test_categories_sorted() {
        let filter = ResultFilter::new([ObjectKind::Dog, ObjectKind::Person]);
        assert_eq!(
            filter.categories(),
            vec![ObjectKind::Person, ObjectKind::Dog]
        );
    }

    #[test]
    fn test_concurrent_updates_are_never_torn() {
        // Readers must only ever observe one of the two complete selections.
        let group_a = [ObjectKind::Person, ObjectKind::Car, ObjectKind::Bus];
        let group_b = [ObjectKind::Cat, ObjectKind::Dog, ObjectKind::Horse];
        let filter = Arc::new(ResultFilter::new(group_a));
        let input: Vec<_> = group_a
            .iter()
            .chain(group_b.iter())
            .map(|&k| detection(k, 0.5))
            .collect();

        let writer = {
            let filter = filter.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    if i % 2 == 0 {
                        filter.set_categories(group_b);
                    } else {
                        filter.set_categories(group_a);
                    }
                }
            })
        };

        for _ in 0..500 {
            let seen = kinds(&filter.apply(&input));
            assert!(seen == group_a.to_vec() || seen == group_b.to_vec());
        }
        writer.join().unwrap();
    }
}
