/*
 * Brute Force Index
 *
 * Every member lives in one unordered list and every query scans all of it.
 * O(n) per query, O(n^2) per frame. Kept as the reference the grid is checked
 * against and as a sane choice for small flocks.
 */

use glam::Vec3;

use super::Slots;

#[derive(Debug)]
struct Entry<T> {
    object: T,
    // None until the owner reports a first position
    position: Option<Vec3>,
}

#[derive(Debug)]
pub struct BruteForceIndex<T> {
    group: Slots<Entry<T>>,
}

impl<T> Default for BruteForceIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BruteForceIndex<T> {
    pub fn new() -> Self {
        Self {
            group: Slots::default(),
        }
    }

    pub fn insert(&mut self, object: T) -> usize {
        self.group.insert(Entry {
            object,
            position: None,
        })
    }

    pub fn remove(&mut self, slot: usize) -> T {
        self.group.remove(slot).object
    }

    // Storing the position is all the bookkeeping this index needs
    #[inline]
    pub fn update(&mut self, slot: usize, position: Vec3) {
        self.group.get_mut(slot).position = Some(position);
    }

    pub fn position(&self, slot: usize) -> Option<Vec3> {
        self.group.get(slot).position
    }

    pub fn for_each_in_sphere<F>(&self, center: Vec3, radius: f32, mut callback: F)
    where
        F: FnMut(&T, f32),
    {
        if !(radius > 0.0) {
            return;
        }
        let radius_squared = radius * radius;

        for (_, entry) in self.group.iter() {
            let Some(position) = entry.position else {
                continue;
            };
            let distance_squared = (center - position).length_squared();
            if distance_squared < radius_squared {
                callback(&entry.object, distance_squared);
            }
        }
    }

    pub fn for_each_object<F>(&self, mut callback: F)
    where
        F: FnMut(&T),
    {
        for (_, entry) in self.group.iter() {
            if entry.position.is_some() {
                callback(&entry.object);
            }
        }
    }

    pub fn remove_all_objects(&mut self) {
        for entry in self.group.iter_mut() {
            entry.position = None;
        }
    }

    pub fn len(&self) -> usize {
        self.group.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_every_placed_member() {
        let mut index = BruteForceIndex::new();
        let a = index.insert("a");
        let b = index.insert("b");
        let _unplaced = index.insert("c");
        index.update(a, Vec3::new(0.0, 0.0, 0.0));
        index.update(b, Vec3::new(100.0, 0.0, 0.0));

        let mut hits = Vec::new();
        index.for_each_in_sphere(Vec3::ZERO, 1.0, |o, d2| hits.push((*o, d2)));
        assert_eq!(hits, vec![("a", 0.0)]);

        let mut all = Vec::new();
        index.for_each_object(|o| all.push(*o));
        all.sort_unstable();
        assert_eq!(all, vec!["a", "b"]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn update_only_records_position() {
        let mut index = BruteForceIndex::new();
        let a = index.insert(1);
        assert_eq!(index.position(a), None);
        index.update(a, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(index.position(a), Some(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn non_positive_radius_finds_nothing() {
        let mut index = BruteForceIndex::new();
        let a = index.insert(1);
        index.update(a, Vec3::ZERO);
        let mut hits = 0;
        index.for_each_in_sphere(Vec3::ZERO, 0.0, |_, _| hits += 1);
        index.for_each_in_sphere(Vec3::ZERO, -3.0, |_, _| hits += 1);
        assert_eq!(hits, 0);
    }

    #[test]
    #[should_panic(expected = "not occupied")]
    fn removing_twice_is_an_invariant_violation() {
        let mut index = BruteForceIndex::new();
        let a = index.insert(1);
        index.remove(a);
        index.remove(a);
    }
}
