use std::fmt;

use crate::error::MetapathError;
use crate::types::{Item, Sequence};

/// An immutable, 1-based ordered collection of sequence members.
///
/// Every structural operation allocates and returns a new array; positions
/// out of range are strict errors, unlike the tolerant sequence operations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayItem {
    members: Vec<Sequence>,
}

impl ArrayItem {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    pub fn from_members(members: Vec<Sequence>) -> Self {
        Self { members }
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Sequence] {
        &self.members
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sequence> {
        self.members.iter()
    }

    fn slot(&self, index: i64) -> Result<usize, MetapathError> {
        if index < 1 || index as usize > self.members.len() {
            return Err(MetapathError::index(index, self.members.len()));
        }
        Ok(index as usize - 1)
    }

    pub fn get(&self, index: i64) -> Result<&Sequence, MetapathError> {
        Ok(&self.members[self.slot(index)?])
    }

    pub fn put(&self, index: i64, member: Sequence) -> Result<ArrayItem, MetapathError> {
        let slot = self.slot(index)?;
        let mut members = self.members.clone();
        members[slot] = member;
        Ok(Self::from_members(members))
    }

    pub fn append(&self, member: Sequence) -> ArrayItem {
        let mut members = self.members.clone();
        members.push(member);
        Self::from_members(members)
    }

    /// Insert before 1-based `index`; `size + 1` appends.
    pub fn insert_before(&self, index: i64, member: Sequence) -> Result<ArrayItem, MetapathError> {
        if index < 1 || index as usize > self.members.len() + 1 {
            return Err(MetapathError::index(index, self.members.len()));
        }
        let mut members = self.members.clone();
        members.insert(index as usize - 1, member);
        Ok(Self::from_members(members))
    }

    pub fn remove(&self, index: i64) -> Result<ArrayItem, MetapathError> {
        let slot = self.slot(index)?;
        let mut members = self.members.clone();
        members.remove(slot);
        Ok(Self::from_members(members))
    }

    pub fn subarray(&self, start: i64, length: Option<i64>) -> Result<ArrayItem, MetapathError> {
        let size = self.members.len() as i64;
        if start < 1 || start > size + 1 {
            return Err(MetapathError::index(start, self.members.len()));
        }
        let length = match length {
            Some(l) => {
                if l < 0 || start + l > size + 1 {
                    return Err(MetapathError::index(start + l - 1, self.members.len()));
                }
                l
            }
            None => size - start + 1,
        };
        let from = start as usize - 1;
        let to = from + length as usize;
        Ok(Self::from_members(self.members[from..to].to_vec()))
    }

    pub fn head(&self) -> Result<&Sequence, MetapathError> {
        self.members
            .first()
            .ok_or_else(|| MetapathError::index(1, 0))
    }

    pub fn tail(&self) -> Result<ArrayItem, MetapathError> {
        if self.members.is_empty() {
            return Err(MetapathError::index(1, 0));
        }
        Ok(Self::from_members(self.members[1..].to_vec()))
    }

    pub fn reverse(&self) -> ArrayItem {
        let mut members = self.members.clone();
        members.reverse();
        Self::from_members(members)
    }

    pub fn join(arrays: &[ArrayItem]) -> ArrayItem {
        let total = arrays.iter().map(|a| a.members.len()).sum();
        let mut members = Vec::with_capacity(total);
        for array in arrays {
            members.extend(array.members.iter().cloned());
        }
        Self::from_members(members)
    }

    /// Recursively flatten members into a single item list.
    pub fn flatten(&self) -> Vec<Item> {
        let mut out = Vec::new();
        flatten_into(self, &mut out);
        out
    }
}

fn flatten_into(array: &ArrayItem, out: &mut Vec<Item>) {
    for member in &array.members {
        for item in member.items() {
            match item {
                Item::Array(inner) => flatten_into(inner, out),
                other => out.push(other.clone()),
            }
        }
    }
}

impl fmt::Display for ArrayItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        let mut first = true;
        for member in &self.members {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}", member)?;
            first = false;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AtomicItem;

    fn int_array(values: &[i64]) -> ArrayItem {
        ArrayItem::from_members(values.iter().map(|i| Sequence::from_integer(*i)).collect())
    }

    #[test]
    fn test_get_is_one_based_and_strict() {
        let arr = int_array(&[1, 2, 3]);
        assert_eq!(arr.get(1).unwrap(), &Sequence::from_integer(1));
        assert!(matches!(arr.get(0), Err(MetapathError::IndexError { .. })));
        assert!(matches!(arr.get(4), Err(MetapathError::IndexError { .. })));
        assert!(arr.get(-1).is_err());
    }

    #[test]
    fn test_put_replaces_only_target() {
        let arr = int_array(&[1, 2, 3]);
        let updated = arr.put(2, Sequence::from_integer(9)).unwrap();
        assert_eq!(updated.get(2).unwrap(), &Sequence::from_integer(9));
        assert_eq!(updated.get(1).unwrap(), &Sequence::from_integer(1));
        assert_eq!(updated.get(3).unwrap(), &Sequence::from_integer(3));
        // original untouched
        assert_eq!(arr.get(2).unwrap(), &Sequence::from_integer(2));
    }

    #[test]
    fn test_append_grows_by_one() {
        let arr = int_array(&[1, 2]);
        let grown = arr.append(Sequence::from_integer(3));
        assert_eq!(grown.size(), arr.size() + 1);
    }

    #[test]
    fn test_subarray_bounds() {
        let arr = int_array(&[1, 2, 3, 4, 5]);
        let sub = arr.subarray(2, Some(3)).unwrap();
        assert_eq!(sub.size(), 3);
        assert_eq!(sub.get(1).unwrap(), &Sequence::from_integer(2));
        assert_eq!(sub.get(3).unwrap(), &Sequence::from_integer(4));

        assert!(int_array(&[1, 2, 3]).subarray(2, Some(10)).is_err());
        assert_eq!(arr.subarray(6, None).unwrap().size(), 0);
        assert!(arr.subarray(7, None).is_err());
    }

    #[test]
    fn test_reverse_is_involutive() {
        let arr = int_array(&[1, 2, 3, 4]);
        assert_eq!(arr.reverse().reverse(), arr);
    }

    #[test]
    fn test_insert_before_and_remove() {
        let arr = int_array(&[1, 3]);
        let with = arr.insert_before(2, Sequence::from_integer(2)).unwrap();
        assert_eq!(with.get(2).unwrap(), &Sequence::from_integer(2));
        assert_eq!(with.size(), 3);

        let appended = arr.insert_before(3, Sequence::from_integer(9)).unwrap();
        assert_eq!(appended.get(3).unwrap(), &Sequence::from_integer(9));
        assert!(arr.insert_before(4, Sequence::empty()).is_err());

        let removed = with.remove(2).unwrap();
        assert_eq!(removed, arr);
        assert!(with.remove(0).is_err());
    }

    #[test]
    fn test_flatten_recurses() {
        let inner = int_array(&[2, 3]);
        let arr = ArrayItem::from_members(vec![
            Sequence::from_integer(1),
            Sequence::of(Item::Array(inner)),
        ]);
        let flat = arr.flatten();
        assert_eq!(flat.len(), 3);
        assert_eq!(flat[2], Item::Atomic(AtomicItem::Integer(3)));
    }

    #[test]
    fn test_head_tail_on_empty_error() {
        let empty = ArrayItem::new();
        assert!(empty.head().is_err());
        assert!(empty.tail().is_err());
    }
}
