//! Unique table: the hash-consing store behind the node manager.
//!
//! Values live in a dense vector indexed by their slot number. Slots are
//! handed out in strictly increasing order and never reused, so a slot number
//! doubles as a creation timestamp. Removing a value leaves an empty slot
//! (a tombstone) behind.
//!
//! Lookup goes through a bucket array with intrusive chains (`next` links
//! stored in the entries). The bucket array doubles whenever the number of
//! live values exceeds it, keeping chains short.

use std::ops::{Index, IndexMut};

use log::debug;

use crate::utils::MyHash;

#[derive(Clone)]
struct Entry<T> {
    value: Option<T>,
    next: usize,
}

impl<T> Entry<T> {
    fn new(value: T) -> Self {
        Self {
            value: Some(value),
            next: 0,
        }
    }

    fn sentry() -> Self {
        Self {
            value: None,
            next: 0,
        }
    }
}

pub struct Table<T> {
    data: Vec<Entry<T>>,

    buckets: Vec<usize>,
    bitmask: u64,

    /// Number of occupied cells.
    real_size: usize,
}

impl<T> Table<T> {
    /// Create a new table with `2^bits` buckets.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Table bits should be in the range 0..=31");

        let buckets_size = 1 << bits;
        let mut data = Vec::with_capacity(buckets_size);
        data.push(Entry::sentry()); // 0th cell is never handed out.

        Self {
            data,
            buckets: vec![0; buckets_size],
            bitmask: (buckets_size - 1) as u64,
            real_size: 0,
        }
    }

    /// Get the number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }
    /// Get the index of the last allocated cell.
    pub fn size(&self) -> usize {
        self.data.len() - 1
    }
    /// Get the number of occupied cells.
    pub fn real_size(&self) -> usize {
        self.real_size
    }

    /// Check if the cell at the given index holds a value.
    pub fn is_occupied(&self, index: usize) -> bool {
        assert_ne!(index, 0, "Index is 0");
        self.data.get(index).is_some_and(|e| e.value.is_some())
    }

    /// Get the value at the given index, if the cell is occupied.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index).and_then(|e| e.value.as_ref())
    }

    /// Get the reference to the value at the given index.
    pub fn value(&self, index: usize) -> &T {
        assert_ne!(index, 0, "Index is 0");
        match self.get(index) {
            Some(value) => value,
            None => panic!("Index {} is not occupied", index),
        }
    }
    /// Get the mutable reference to the value at the given index.
    pub fn value_mut(&mut self, index: usize) -> &mut T {
        assert_ne!(index, 0, "Index is 0");
        match self.data.get_mut(index).and_then(|e| e.value.as_mut()) {
            Some(value) => value,
            None => panic!("Index {} is not occupied", index),
        }
    }

    /// Iterate over occupied cells in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.data
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(i, e)| e.value.as_ref().map(|v| (i, v)))
    }

    /// Add a new value at the end of the table and return its index.
    /// The value is *not* linked into any bucket.
    fn alloc(&mut self, value: T) -> usize {
        let index = self.data.len();
        self.data.push(Entry::new(value));
        self.real_size += 1;
        index
    }
}

impl<T> Table<T>
where
    T: MyHash + Eq,
{
    fn bucket_index(&self, value: &T) -> usize {
        (value.hash() & self.bitmask) as usize
    }

    /// Find the index of a value equal to the given one.
    pub fn find(&self, value: &T) -> Option<usize> {
        let mut index = self.buckets[self.bucket_index(value)];
        while index != 0 {
            let entry = &self.data[index];
            if entry.value.as_ref() == Some(value) {
                return Some(index);
            }
            index = entry.next;
        }
        None
    }

    /// Put a value into the table.
    ///
    /// Returns the index of the existing equal value, or of the freshly
    /// allocated cell, together with a flag telling whether the value is new.
    pub fn put(&mut self, value: T) -> (usize, bool) {
        if let Some(index) = self.find(&value) {
            // The node already exists.
            return (index, false);
        }

        if self.real_size >= self.buckets.len() {
            self.grow();
        }

        let bucket_index = self.bucket_index(&value);
        let i = self.alloc(value);
        // Push to the front of the bucket chain.
        self.data[i].next = self.buckets[bucket_index];
        self.buckets[bucket_index] = i;
        (i, true)
    }

    /// Remove the value at the given index, unlinking it from its bucket.
    pub fn remove(&mut self, index: usize) -> T {
        assert_ne!(index, 0, "Index is 0");
        let bucket_index = self.bucket_index(self.value(index));

        let next = self.data[index].next;
        if self.buckets[bucket_index] == index {
            self.buckets[bucket_index] = next;
        } else {
            let mut prev = self.buckets[bucket_index];
            while self.data[prev].next != index {
                prev = self.data[prev].next;
                assert_ne!(prev, 0, "Index {} is not linked into its bucket", index);
            }
            self.data[prev].next = next;
        }

        let entry = &mut self.data[index];
        entry.next = 0;
        self.real_size -= 1;
        match entry.value.take() {
            Some(value) => value,
            None => unreachable!("occupancy checked above"),
        }
    }

    /// Double the bucket array and relink all live values.
    fn grow(&mut self) {
        let new_size = self.buckets.len() * 2;
        debug!("table: growing buckets {} -> {}", self.buckets.len(), new_size);

        self.buckets = vec![0; new_size];
        self.bitmask = (new_size - 1) as u64;

        for i in 1..self.data.len() {
            let Some(value) = &self.data[i].value else {
                continue;
            };
            let b = (value.hash() & self.bitmask) as usize;
            self.data[i].next = self.buckets[b];
            self.buckets[b] = i;
        }
    }
}

impl<T> Index<usize> for Table<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.value(index)
    }
}

impl<T> IndexMut<usize> for Table<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        self.value_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    struct Item(i32);

    impl MyHash for Item {
        fn hash(&self) -> u64 {
            // Deliberately collide `x` and `-x`.
            self.0.unsigned_abs() as u64
        }
    }

    #[test]
    fn test_put_returns_existing() {
        let mut table = Table::new(2);
        let (i1, new1) = table.put(Item(5));
        let (i2, new2) = table.put(Item(5));
        assert!(new1);
        assert!(!new2);
        assert_eq!(i1, i2);
        assert_eq!(table.real_size(), 1);
    }

    #[test]
    fn test_put_collision() {
        let mut table = Table::new(2);
        let (i1, _) = table.put(Item(5));
        let (i2, _) = table.put(Item(-5));
        assert_ne!(i1, i2);
        assert_eq!(table[i1], Item(5));
        assert_eq!(table[i2], Item(-5));
        assert_eq!(table.find(&Item(-5)), Some(i2));
    }

    #[test]
    fn test_indices_are_monotonic() {
        let mut table = Table::new(1);
        let (a, _) = table.put(Item(1));
        let (b, _) = table.put(Item(2));
        table.remove(a);
        let (c, _) = table.put(Item(3));
        assert!(a < b && b < c);
        assert!(!table.is_occupied(a));
    }

    #[test]
    fn test_remove_unlinks_from_chain() {
        let mut table = Table::new(2);
        let (i1, _) = table.put(Item(7));
        let (i2, _) = table.put(Item(-7));
        let (i3, _) = table.put(Item(7 + 4)); // same bucket with 4 buckets
        assert_eq!(table.remove(i2), Item(-7));
        assert_eq!(table.find(&Item(7)), Some(i1));
        assert_eq!(table.find(&Item(-7)), None);
        assert_eq!(table.find(&Item(11)), Some(i3));
        assert_eq!(table.real_size(), 2);
    }

    #[test]
    fn test_grow_keeps_entries() {
        let mut table = Table::new(1);
        let indices: Vec<_> = (0..100).map(|x| table.put(Item(x)).0).collect();
        assert!(table.capacity() >= 100);
        for (x, &i) in indices.iter().enumerate() {
            assert_eq!(table.find(&Item(x as i32)), Some(i));
        }
        assert_eq!(table.iter().count(), 100);
    }

    #[test]
    #[should_panic(expected = "is not occupied")]
    fn test_value_of_removed_panics() {
        let mut table = Table::new(2);
        let (i, _) = table.put(Item(1));
        table.remove(i);
        table.value(i);
    }
}
