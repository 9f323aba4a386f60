/*
 * Proximity Module
 *
 * Spatial databases answering "who is within this sphere?" for every agent
 * every frame. Two interchangeable backends share one contract:
 * - BruteForceIndex: a flat list, O(n) per query
 * - LocalityGrid: a uniform bin lattice plus an overflow bin, near O(k) per query
 *
 * Callers never talk to a backend directly. They hold a ProximityToken, which
 * keeps a weak link back to the database and deregisters itself on drop.
 */

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::{IVec3, Vec3};

use crate::error::Result;
use crate::params::IndexKind;

pub mod brute_force;
pub mod spatial_grid;

pub use brute_force::BruteForceIndex;
pub use spatial_grid::{Bin, LocalityGrid};

// Stable slot storage with a free list. Vacant slots are reused by later
// inserts, so a slot id is only meaningful while its token is alive.
#[derive(Debug)]
pub(crate) struct Slots<E> {
    entries: Vec<Option<E>>,
    free: Vec<usize>,
    len: usize,
}

impl<E> Default for Slots<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<E> Slots<E> {
    pub(crate) fn insert(&mut self, entry: E) -> usize {
        self.len += 1;
        match self.free.pop() {
            Some(slot) => {
                debug_assert!(self.entries[slot].is_none());
                self.entries[slot] = Some(entry);
                slot
            }
            None => {
                self.entries.push(Some(entry));
                self.entries.len() - 1
            }
        }
    }

    pub(crate) fn remove(&mut self, slot: usize) -> E {
        let entry = self.entries[slot]
            .take()
            .unwrap_or_else(|| panic!("proximity slot {slot} is not occupied"));
        self.free.push(slot);
        self.len -= 1;
        entry
    }

    pub(crate) fn get(&self, slot: usize) -> &E {
        self.entries[slot]
            .as_ref()
            .unwrap_or_else(|| panic!("proximity slot {slot} is not occupied"))
    }

    pub(crate) fn get_mut(&mut self, slot: usize) -> &mut E {
        self.entries[slot]
            .as_mut()
            .unwrap_or_else(|| panic!("proximity slot {slot} is not occupied"))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, &E)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| entry.as_ref().map(|e| (slot, e)))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut E> {
        self.entries.iter_mut().filter_map(Option::as_mut)
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

// The closed set of backends, chosen once when the database is built
#[derive(Debug)]
enum Backend<T> {
    BruteForce(BruteForceIndex<T>),
    Grid(LocalityGrid<T>),
}

impl<T> Backend<T> {
    fn insert(&mut self, object: T) -> usize {
        match self {
            Backend::BruteForce(index) => index.insert(object),
            Backend::Grid(grid) => grid.insert(object),
        }
    }

    fn remove(&mut self, slot: usize) -> T {
        match self {
            Backend::BruteForce(index) => index.remove(slot),
            Backend::Grid(grid) => grid.remove(slot),
        }
    }

    fn update(&mut self, slot: usize, position: Vec3) {
        match self {
            Backend::BruteForce(index) => index.update(slot, position),
            Backend::Grid(grid) => grid.update(slot, position),
        }
    }

    fn for_each_in_sphere<F>(&self, center: Vec3, radius: f32, callback: F)
    where
        F: FnMut(&T, f32),
    {
        match self {
            Backend::BruteForce(index) => index.for_each_in_sphere(center, radius, callback),
            Backend::Grid(grid) => grid.for_each_in_sphere(center, radius, callback),
        }
    }

    fn for_each_object<F>(&self, callback: F)
    where
        F: FnMut(&T),
    {
        match self {
            Backend::BruteForce(index) => index.for_each_object(callback),
            Backend::Grid(grid) => grid.for_each_object(callback),
        }
    }

    fn remove_all_objects(&mut self) {
        match self {
            Backend::BruteForce(index) => index.remove_all_objects(),
            Backend::Grid(grid) => grid.remove_all_objects(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Backend::BruteForce(index) => index.len(),
            Backend::Grid(grid) => grid.len(),
        }
    }
}

/// Shared proximity database. Cloning yields another handle to the same database.
#[derive(Debug)]
pub struct ProximityDatabase<T> {
    backend: Rc<RefCell<Backend<T>>>,
}

impl<T> Clone for ProximityDatabase<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Rc::clone(&self.backend),
        }
    }
}

impl<T: Clone> ProximityDatabase<T> {
    pub fn brute_force() -> Self {
        Self::from_backend(Backend::BruteForce(BruteForceIndex::new()))
    }

    /// Bin lattice covering the box of `dimensions` centered at `center`.
    pub fn locality_grid(center: Vec3, dimensions: Vec3, divisions: IVec3) -> Result<Self> {
        let grid = LocalityGrid::centered(center, dimensions, divisions)?;
        Ok(Self::from_backend(Backend::Grid(grid)))
    }

    pub fn from_kind(kind: &IndexKind) -> Result<Self> {
        match *kind {
            IndexKind::BruteForce => Ok(Self::brute_force()),
            IndexKind::LocalityGrid {
                center,
                dimensions,
                divisions,
            } => Self::locality_grid(center, dimensions, divisions),
        }
    }

    fn from_backend(backend: Backend<T>) -> Self {
        Self {
            backend: Rc::new(RefCell::new(backend)),
        }
    }

    /// Register `object`. It is not reported by queries until its first position update.
    pub fn allocate_token(&self, object: T) -> ProximityToken<T> {
        let slot = self.backend.borrow_mut().insert(object);
        ProximityToken {
            database: Rc::downgrade(&self.backend),
            slot,
        }
    }

    /// Append every placed object strictly within `radius` of `center`. `results` is not cleared.
    pub fn find_neighbors(&self, center: Vec3, radius: f32, results: &mut Vec<T>) {
        self.backend
            .borrow()
            .for_each_in_sphere(center, radius, |object, _| results.push(object.clone()));
    }

    /// Nearest placed object strictly within `radius` of `center`, skipping `ignore`.
    pub fn find_nearest_neighbor(&self, center: Vec3, radius: f32, ignore: Option<&T>) -> Option<T>
    where
        T: PartialEq,
    {
        let mut nearest: Option<(T, f32)> = None;
        self.backend
            .borrow()
            .for_each_in_sphere(center, radius, |object, distance_squared| {
                if ignore == Some(object) {
                    return;
                }
                let closer = match &nearest {
                    Some((_, best)) => distance_squared < *best,
                    None => true,
                };
                if closer {
                    nearest = Some((object.clone(), distance_squared));
                }
            });
        nearest.map(|(object, _)| object)
    }

    /// Visit every placed object regardless of location.
    pub fn for_each_object<F>(&self, callback: F)
    where
        F: FnMut(&T),
    {
        self.backend.borrow().for_each_object(callback);
    }

    /// Unplace every member. Tokens stay allocated and re-enter on their next update.
    pub fn remove_all_objects(&self) {
        self.backend.borrow_mut().remove_all_objects();
    }

    /// Number of allocated tokens, placed or not.
    pub fn len(&self) -> usize {
        self.backend.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind_name(&self) -> &'static str {
        match &*self.backend.borrow() {
            Backend::BruteForce(_) => "brute force",
            Backend::Grid(_) => "locality grid",
        }
    }

    /// Bin a point would be filed under. `None` for the brute-force backend.
    pub fn bin_for_location(&self, position: Vec3) -> Option<Bin> {
        match &*self.backend.borrow() {
            Backend::BruteForce(_) => None,
            Backend::Grid(grid) => Some(grid.bin_for_location(position)),
        }
    }

    /// Bin currently holding `token`. `None` for brute force or an unplaced token.
    pub fn bin_of(&self, token: &ProximityToken<T>) -> Option<Bin> {
        assert!(
            token.belongs_to(self),
            "token queried against a database it was not allocated from"
        );
        match &*self.backend.borrow() {
            Backend::BruteForce(_) => None,
            Backend::Grid(grid) => grid.bin_of(token.slot),
        }
    }
}

/// One member's registration in a ProximityDatabase.
///
/// Dropping the token removes the member; later queries never observe it.
#[derive(Debug)]
pub struct ProximityToken<T> {
    database: Weak<RefCell<Backend<T>>>,
    slot: usize,
}

impl<T: Clone> ProximityToken<T> {
    fn backend(&self) -> Rc<RefCell<Backend<T>>> {
        self.database
            .upgrade()
            .unwrap_or_else(|| panic!("proximity token used after its database was dropped"))
    }

    fn belongs_to(&self, database: &ProximityDatabase<T>) -> bool {
        std::ptr::eq(self.database.as_ptr(), Rc::as_ptr(&database.backend))
    }

    /// Must be called by the owner whenever its position changes.
    pub fn update_for_new_position(&mut self, position: Vec3) {
        self.backend().borrow_mut().update(self.slot, position);
    }

    /// Append every placed object strictly within `radius` of `center`. `results` is not cleared.
    pub fn find_neighbors(&self, center: Vec3, radius: f32, results: &mut Vec<T>) {
        self.backend()
            .borrow()
            .for_each_in_sphere(center, radius, |object, _| results.push(object.clone()));
    }
}

impl<T> Drop for ProximityToken<T> {
    fn drop(&mut self) {
        // A database dropped first has already released every member
        if let Some(backend) = self.database.upgrade() {
            backend.borrow_mut().remove(self.slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut v: Vec<u32>) -> Vec<u32> {
        v.sort_unstable();
        v
    }

    fn databases() -> Vec<ProximityDatabase<u32>> {
        vec![
            ProximityDatabase::brute_force(),
            ProximityDatabase::locality_grid(Vec3::ZERO, Vec3::new(20.0, 2.0, 20.0), IVec3::new(4, 1, 4))
                .expect("valid grid"),
        ]
    }

    #[test]
    fn tokens_report_and_forget_members() {
        for db in databases() {
            let mut a = db.allocate_token(1);
            let mut b = db.allocate_token(2);
            a.update_for_new_position(Vec3::new(0.0, 0.0, 0.0));
            b.update_for_new_position(Vec3::new(0.5, 0.0, 0.0));
            assert_eq!(db.len(), 2);

            let mut found = Vec::new();
            a.find_neighbors(Vec3::ZERO, 1.0, &mut found);
            assert_eq!(sorted(found), vec![1, 2], "{}", db.kind_name());

            drop(b);
            let mut found = Vec::new();
            a.find_neighbors(Vec3::ZERO, 1.0, &mut found);
            assert_eq!(found, vec![1], "{}", db.kind_name());
            assert_eq!(db.len(), 1);
        }
    }

    #[test]
    fn unplaced_tokens_are_invisible() {
        for db in databases() {
            let _token = db.allocate_token(9);
            let mut found = Vec::new();
            db.find_neighbors(Vec3::ZERO, 100.0, &mut found);
            assert!(found.is_empty(), "{}", db.kind_name());
        }
    }

    #[test]
    fn results_are_appended_not_replaced() {
        for db in databases() {
            let mut t = db.allocate_token(3);
            t.update_for_new_position(Vec3::new(1.0, 0.0, 1.0));
            let mut found = vec![42];
            db.find_neighbors(Vec3::new(1.0, 0.0, 1.0), 0.5, &mut found);
            assert_eq!(found, vec![42, 3]);
        }
    }

    #[test]
    fn radius_boundary_is_exclusive() {
        for db in databases() {
            let mut t = db.allocate_token(5);
            t.update_for_new_position(Vec3::new(2.0, 0.0, 0.0));
            let mut found = Vec::new();
            db.find_neighbors(Vec3::ZERO, 2.0, &mut found);
            assert!(found.is_empty(), "{}", db.kind_name());
            db.find_neighbors(Vec3::ZERO, 2.001, &mut found);
            assert_eq!(found, vec![5]);
        }
    }

    #[test]
    fn nearest_neighbor_skips_ignored_object() {
        for db in databases() {
            let mut tokens = Vec::new();
            for (id, x) in [(0u32, 0.0f32), (1, 1.0), (2, 3.0)] {
                let mut t = db.allocate_token(id);
                t.update_for_new_position(Vec3::new(x, 0.0, 0.0));
                tokens.push(t);
            }
            assert_eq!(db.find_nearest_neighbor(Vec3::ZERO, 5.0, None), Some(0));
            assert_eq!(db.find_nearest_neighbor(Vec3::ZERO, 5.0, Some(&0)), Some(1));
            assert_eq!(db.find_nearest_neighbor(Vec3::ZERO, 0.5, Some(&0)), None);
        }
    }

    #[test]
    fn remove_all_objects_unplaces_until_next_update() {
        for db in databases() {
            let mut t = db.allocate_token(7);
            t.update_for_new_position(Vec3::new(1.0, 0.0, 1.0));
            db.remove_all_objects();

            let mut seen = 0;
            db.for_each_object(|_| seen += 1);
            assert_eq!(seen, 0);
            assert_eq!(db.len(), 1);

            t.update_for_new_position(Vec3::new(1.0, 0.0, 1.0));
            db.for_each_object(|_| seen += 1);
            assert_eq!(seen, 1);
        }
    }

    #[test]
    fn token_outliving_database_drops_quietly() {
        let db = ProximityDatabase::brute_force();
        let mut t = db.allocate_token(1u32);
        t.update_for_new_position(Vec3::ZERO);
        drop(db);
        drop(t);
    }

    #[test]
    fn slots_are_reused_after_removal() {
        let mut slots = Slots::default();
        let a = slots.insert('a');
        let b = slots.insert('b');
        assert_eq!(slots.remove(a), 'a');
        let c = slots.insert('c');
        assert_eq!(c, a);
        assert_eq!(*slots.get(b), 'b');
        assert_eq!(slots.len(), 2);
        assert_eq!(slots.iter().count(), 2);
    }
}
