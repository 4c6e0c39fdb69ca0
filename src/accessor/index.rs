//! In-memory table index by primary key and by slug.

use std::collections::HashMap;

use tracing::warn;

use crate::model::{CacheModel, LookupCriteria};

const PK_FIELD: &str = "pk";
const SLUG_FIELD: &str = "slug";

/// Both mappings of one full-table snapshot.
///
/// Always built whole from a single snapshot; there is no partial update.
/// Records without a slug only appear in the primary-key mapping. When two
/// records share a slug the later one wins; slug uniqueness is the durable
/// store's job.
#[derive(Debug, Clone)]
pub struct TableIndex<M: CacheModel> {
    by_pk: HashMap<M::Pk, M>,
    by_slug: HashMap<String, M>,
}

impl<M: CacheModel> TableIndex<M> {
    pub fn build(records: impl IntoIterator<Item = M>) -> Self {
        let mut by_pk = HashMap::new();
        let mut by_slug = HashMap::new();

        for record in records {
            if let Some(slug) = record.slug() {
                if let Some(previous) = by_slug.insert(slug.to_string(), record.clone()) {
                    warn!(
                        entity = M::MODEL_NAME,
                        slug,
                        replaced = %previous.pk(),
                        by = %record.pk(),
                        "duplicate slug while indexing"
                    );
                }
            }
            by_pk.insert(record.pk(), record);
        }

        Self { by_pk, by_slug }
    }

    /// Resolves a lookup against the index.
    ///
    /// A field filter goes through its `pk` entry if it has one, else its
    /// `slug` entry; other fields are ignored. A filter with neither, or a
    /// `pk` that does not parse, matches nothing.
    pub fn get(&self, criteria: &LookupCriteria<M::Pk>) -> Option<&M> {
        match criteria {
            LookupCriteria::ByPrimaryKey(pk) => self.by_pk.get(pk),
            LookupCriteria::BySlug(slug) => self.by_slug.get(slug),
            LookupCriteria::Fields(fields) => match (fields.get(PK_FIELD), fields.get(SLUG_FIELD)) {
                (Some(raw), _) => raw.parse::<M::Pk>().ok().and_then(|pk| self.by_pk.get(&pk)),
                (None, Some(slug)) => self.by_slug.get(slug),
                (None, None) => None,
            },
        }
    }

    pub fn by_pk(&self, pk: &M::Pk) -> Option<&M> {
        self.by_pk.get(pk)
    }

    pub fn by_slug(&self, slug: &str) -> Option<&M> {
        self.by_slug.get(slug)
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.by_pk.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pk.is_empty()
    }

    pub fn slug_count(&self) -> usize {
        self.by_slug.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;

    #[test]
    fn test_build_both_mappings() {
        let index = TableIndex::build(vec![
            Record::new(1, Some("a")),
            Record::new(2, Some("b")),
            Record::new(3, None),
        ]);

        assert_eq!(index.len(), 3);
        assert_eq!(index.slug_count(), 2);
        assert_eq!(index.by_pk(&3).map(|r| r.id), Some(3));
        assert_eq!(index.by_slug("b").map(|r| r.id), Some(2));
    }

    #[test]
    fn test_get_by_criteria() {
        let index = TableIndex::build(vec![Record::new(1, Some("a"))]);

        assert!(index.get(&LookupCriteria::ByPrimaryKey(1)).is_some());
        assert!(index.get(&LookupCriteria::slug("a")).is_some());
        assert!(index.get(&LookupCriteria::ByPrimaryKey(2)).is_none());
    }

    #[test]
    fn test_field_filter_uses_pk_then_slug() {
        let index = TableIndex::build(vec![Record::new(1, Some("a")), Record::new(2, Some("b"))]);

        let by_pk = LookupCriteria::fields([("pk", "1")]);
        let by_slug = LookupCriteria::fields([("slug", "b"), ("title", "ignored")]);
        let both = LookupCriteria::fields([("pk", "1"), ("slug", "b")]);

        assert_eq!(index.get(&by_pk).map(|r| r.id), Some(1));
        assert_eq!(index.get(&by_slug).map(|r| r.id), Some(2));
        assert_eq!(index.get(&both).map(|r| r.id), Some(1));
    }

    #[test]
    fn test_field_filter_without_pk_or_slug_matches_nothing() {
        let index = TableIndex::build(vec![Record::new(1, Some("a"))]);

        assert!(index.get(&LookupCriteria::fields([("title", "x")])).is_none());
        assert!(index.get(&LookupCriteria::fields([("pk", "one")])).is_none());
    }

    #[test]
    fn test_duplicate_slug_last_wins() {
        let index = TableIndex::build(vec![Record::new(1, Some("dup")), Record::new(2, Some("dup"))]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.slug_count(), 1);
        assert_eq!(index.by_slug("dup").map(|r| r.id), Some(2));
    }

    #[test]
    fn test_empty_table() {
        let index = TableIndex::<Record>::build(Vec::new());
        assert!(index.is_empty());
    }
}
