use std::fmt;

use indexmap::IndexMap;
use rand::Rng;

use crate::error::MetapathError;
use crate::types::{AtomicItem, MapKey, Sequence};

/// How `merge` treats a key that appears in more than one input map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    Reject,
    #[default]
    UseFirst,
    UseLast,
    UseAny,
    Combine,
}

impl DuplicatePolicy {
    pub fn parse(s: &str) -> Result<Self, MetapathError> {
        match s {
            "reject" => Ok(Self::Reject),
            "use-first" => Ok(Self::UseFirst),
            "use-last" => Ok(Self::UseLast),
            "use-any" => Ok(Self::UseAny),
            "combine" => Ok(Self::Combine),
            other => Err(MetapathError::invalid_argument(format!(
                "unrecognized duplicates option '{other}'"
            ))),
        }
    }
}

/// An immutable mapping from canonical atomic keys to sequence values.
///
/// Entries remember the original atomic key they were stored under;
/// insertion order is preserved by the backing store but is not a semantic
/// guarantee of the data model.
#[derive(Debug, Clone, Default)]
pub struct MapItem {
    entries: IndexMap<MapKey, (AtomicItem, Sequence)>,
}

impl MapItem {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn from_entries(entries: Vec<(AtomicItem, Sequence)>) -> Self {
        let mut map = Self::new();
        for (key, value) in entries {
            map.entries.insert(key.map_key(), (key, value));
        }
        map
    }

    pub fn entry(key: AtomicItem, value: Sequence) -> Self {
        Self::from_entries(vec![(key, value)])
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &AtomicItem) -> Option<&Sequence> {
        self.entries.get(&key.map_key()).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &AtomicItem) -> bool {
        self.entries.contains_key(&key.map_key())
    }

    pub fn keys(&self) -> impl Iterator<Item = &AtomicItem> {
        self.entries.values().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Sequence> {
        self.entries.values().map(|(_, v)| v)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&AtomicItem, &Sequence)> {
        self.entries.values().map(|(k, v)| (k, v))
    }

    pub fn put(&self, key: AtomicItem, value: Sequence) -> MapItem {
        let mut new_map = self.clone();
        new_map.entries.insert(key.map_key(), (key, value));
        new_map
    }

    pub fn remove(&self, key: &AtomicItem) -> MapItem {
        let mut new_map = self.clone();
        new_map.entries.shift_remove(&key.map_key());
        new_map
    }

    /// Merge maps left to right under the given duplicate-key policy.
    ///
    /// `UseAny` picks among the candidate values through the caller's RNG,
    /// so reproducibility is the caller's choice of generator.
    pub fn merge<R: Rng>(
        maps: &[MapItem],
        policy: DuplicatePolicy,
        rng: &mut R,
    ) -> Result<MapItem, MetapathError> {
        let mut result = MapItem::new();
        for map in maps {
            for (canon, (key, value)) in &map.entries {
                match result.entries.get_mut(canon) {
                    None => {
                        result
                            .entries
                            .insert(canon.clone(), (key.clone(), value.clone()));
                    }
                    Some(existing) => match policy {
                        DuplicatePolicy::Reject => {
                            return Err(MetapathError::invalid_argument(format!(
                                "duplicate map key '{key}'"
                            )));
                        }
                        DuplicatePolicy::UseFirst => {}
                        DuplicatePolicy::UseLast => {
                            *existing = (key.clone(), value.clone());
                        }
                        DuplicatePolicy::UseAny => {
                            if rng.random_bool(0.5) {
                                *existing = (key.clone(), value.clone());
                            }
                        }
                        DuplicatePolicy::Combine => {
                            existing.1 = existing.1.clone().concat(value.clone());
                        }
                    },
                }
            }
        }
        Ok(result)
    }
}

impl PartialEq for MapItem {
    fn eq(&self, other: &Self) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }
        self.entries
            .iter()
            .all(|(canon, (_, value))| {
                other
                    .entries
                    .get(canon)
                    .is_some_and(|(_, other_value)| value == other_value)
            })
    }
}

impl fmt::Display for MapItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "map {{ ")?;
        let mut first = true;
        for (key, value) in self.entries() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
            first = false;
        }
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn entry(key: &str, value: i64) -> (AtomicItem, Sequence) {
        (AtomicItem::String(key.into()), Sequence::from_integer(value))
    }

    #[test]
    fn test_put_get_remove() {
        let map = MapItem::from_entries(vec![entry("a", 1)]);
        assert_eq!(map.get(&AtomicItem::String("a".into())), Some(&Sequence::from_integer(1)));

        let map2 = map.put(AtomicItem::String("b".into()), Sequence::from_integer(2));
        assert_eq!(map2.size(), 2);
        assert_eq!(map.size(), 1);

        let map3 = map2.remove(&AtomicItem::String("a".into()));
        assert!(!map3.contains_key(&AtomicItem::String("a".into())));
        assert!(map2.contains_key(&AtomicItem::String("a".into())));
    }

    #[test]
    fn test_remove_after_put_equals_plain_remove() {
        let map = MapItem::from_entries(vec![entry("a", 1), entry("b", 2)]);
        let key = AtomicItem::String("b".into());
        let left = map.put(key.clone(), Sequence::from_integer(9)).remove(&key);
        let right = map.remove(&key);
        assert_eq!(left, right);
    }

    #[test]
    fn test_numeric_keys_are_canonical() {
        let map = MapItem::from_entries(vec![(
            AtomicItem::Integer(5),
            Sequence::from_string("five"),
        )]);
        let dec_key = AtomicItem::Decimal("5.0".parse().unwrap());
        assert!(map.contains_key(&dec_key));
    }

    #[test]
    fn test_merge_policies() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = MapItem::from_entries(vec![entry("a", 1)]);
        let b = MapItem::from_entries(vec![entry("a", 2)]);
        let maps = [a.clone(), b.clone()];

        let first = MapItem::merge(&maps, DuplicatePolicy::UseFirst, &mut rng).unwrap();
        assert_eq!(first.get(&AtomicItem::String("a".into())), Some(&Sequence::from_integer(1)));

        let last = MapItem::merge(&maps, DuplicatePolicy::UseLast, &mut rng).unwrap();
        assert_eq!(last.get(&AtomicItem::String("a".into())), Some(&Sequence::from_integer(2)));

        let combined = MapItem::merge(&maps, DuplicatePolicy::Combine, &mut rng).unwrap();
        assert_eq!(combined.get(&AtomicItem::String("a".into())).unwrap().len(), 2);

        assert!(MapItem::merge(&maps, DuplicatePolicy::Reject, &mut rng).is_err());

        let any = MapItem::merge(&maps, DuplicatePolicy::UseAny, &mut rng).unwrap();
        let picked = any.get(&AtomicItem::String("a".into())).unwrap();
        assert!(picked == &Sequence::from_integer(1) || picked == &Sequence::from_integer(2));
    }

    #[test]
    fn test_merge_disjoint_keys() {
        let mut rng = StdRng::seed_from_u64(0);
        let a = MapItem::from_entries(vec![entry("a", 1)]);
        let b = MapItem::from_entries(vec![entry("b", 2)]);
        let merged = MapItem::merge(&[a, b], DuplicatePolicy::Reject, &mut rng).unwrap();
        assert_eq!(merged.size(), 2);
    }
}
