/*
 * Spatial Grid Module
 *
 * The "locality query" index: an axis-aligned super-brick split into
 * divx * divy * divz bins, plus one overflow bin for members outside the brick.
 *
 * - Each bin holds a list of proxy slots; a proxy remembers its bin and its
 *   position in that list, so unlinking is an O(1) swap-remove.
 * - Moving within the same bin costs nothing beyond storing the position.
 * - Queries visit only the bins overlapping the query sphere's bounding box,
 *   then apply the exact squared-distance test. The result set is identical
 *   to a brute-force scan.
 */

use glam::{IVec3, Vec3};

use super::Slots;
use crate::error::{FlockError, Result};

// Upper bound on the lattice; each bin costs an empty Vec up front
const MAX_BINS: usize = 1 << 22;

/// Which list a grid member is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bin {
    /// Linear index into the bin lattice
    Cell(usize),
    /// Catch-all for positions outside the super-brick
    Overflow,
}

#[derive(Debug)]
struct Proxy<T> {
    object: T,
    position: Vec3,
    bin: Option<Bin>,
    index_in_bin: usize,
}

#[derive(Debug)]
pub struct LocalityGrid<T> {
    origin: Vec3,
    size: Vec3,
    divx: usize,
    divy: usize,
    divz: usize,
    bins: Vec<Vec<usize>>,
    overflow: Vec<usize>,
    proxies: Slots<Proxy<T>>,
}

impl<T> LocalityGrid<T> {
    /// `origin` is the minimum corner of the super-brick, `size` its edge lengths.
    pub fn new(origin: Vec3, size: Vec3, divisions: IVec3) -> Result<Self> {
        if divisions.min_element() <= 0 {
            return Err(FlockError::InvalidDivisions {
                x: divisions.x,
                y: divisions.y,
                z: divisions.z,
            });
        }
        if !size.is_finite() || size.min_element() <= 0.0 || !origin.is_finite() {
            return Err(FlockError::InvalidGridSize {
                x: size.x,
                y: size.y,
                z: size.z,
            });
        }

        let (divx, divy, divz) = (divisions.x as usize, divisions.y as usize, divisions.z as usize);
        let invalid_divisions = || FlockError::InvalidDivisions {
            x: divisions.x,
            y: divisions.y,
            z: divisions.z,
        };
        let bin_count = divx
            .checked_mul(divy)
            .and_then(|n| n.checked_mul(divz))
            .filter(|&n| n <= MAX_BINS)
            .ok_or_else(invalid_divisions)?;

        Ok(Self {
            origin,
            size,
            divx,
            divy,
            divz,
            bins: vec![Vec::new(); bin_count],
            overflow: Vec::new(),
            proxies: Slots::default(),
        })
    }

    pub fn centered(center: Vec3, dimensions: Vec3, divisions: IVec3) -> Result<Self> {
        Self::new(center - dimensions * 0.5, dimensions, divisions)
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    #[inline]
    fn bin_coords_to_index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        debug_assert!(ix < self.divx && iy < self.divy && iz < self.divz);
        ix * self.divy * self.divz + iy * self.divz + iz
    }

    // Unclamped lattice coordinate along one axis
    #[inline]
    fn axis_coord(coord: f32, origin: f32, size: f32, divisions: usize) -> i64 {
        (((coord - origin) / size) * divisions as f32).floor() as i64
    }

    #[inline]
    fn inside_brick(&self, p: Vec3) -> bool {
        let max = self.origin + self.size;
        p.x >= self.origin.x
            && p.y >= self.origin.y
            && p.z >= self.origin.z
            && p.x < max.x
            && p.y < max.y
            && p.z < max.z
    }

    /// Bin a member at `position` belongs in.
    pub fn bin_for_location(&self, position: Vec3) -> Bin {
        if !self.inside_brick(position) {
            return Bin::Overflow;
        }

        // Rounding can land exactly on the far edge, so clamp the upper end
        let ix = Self::axis_coord(position.x, self.origin.x, self.size.x, self.divx).clamp(0, self.divx as i64 - 1);
        let iy = Self::axis_coord(position.y, self.origin.y, self.size.y, self.divy).clamp(0, self.divy as i64 - 1);
        let iz = Self::axis_coord(position.z, self.origin.z, self.size.z, self.divz).clamp(0, self.divz as i64 - 1);

        Bin::Cell(self.bin_coords_to_index(ix as usize, iy as usize, iz as usize))
    }

    pub fn bin_of(&self, slot: usize) -> Option<Bin> {
        self.proxies.get(slot).bin
    }

    fn bin_list_mut(&mut self, bin: Bin) -> &mut Vec<usize> {
        match bin {
            Bin::Cell(index) => &mut self.bins[index],
            Bin::Overflow => &mut self.overflow,
        }
    }

    fn add_to_bin(&mut self, slot: usize, bin: Bin) {
        let list = self.bin_list_mut(bin);
        list.push(slot);
        let index_in_bin = list.len() - 1;

        let proxy = self.proxies.get_mut(slot);
        proxy.bin = Some(bin);
        proxy.index_in_bin = index_in_bin;
    }

    fn remove_from_bin(&mut self, slot: usize) {
        let proxy = self.proxies.get_mut(slot);
        let Some(bin) = proxy.bin.take() else {
            return;
        };
        let index = proxy.index_in_bin;

        let list = self.bin_list_mut(bin);
        let removed = list.swap_remove(index);
        assert_eq!(removed, slot, "grid proxy not found at its recorded bin position");
        let moved = list.get(index).copied();

        // The former tail now sits where the removed proxy was
        if let Some(moved) = moved {
            self.proxies.get_mut(moved).index_in_bin = index;
        }
    }

    pub fn insert(&mut self, object: T) -> usize {
        self.proxies.insert(Proxy {
            object,
            position: Vec3::ZERO,
            bin: None,
            index_in_bin: 0,
        })
    }

    pub fn remove(&mut self, slot: usize) -> T {
        self.remove_from_bin(slot);
        self.proxies.remove(slot).object
    }

    pub fn update(&mut self, slot: usize, position: Vec3) {
        let new_bin = self.bin_for_location(position);
        let proxy = self.proxies.get_mut(slot);
        proxy.position = position;

        if proxy.bin != Some(new_bin) {
            self.remove_from_bin(slot);
            self.add_to_bin(slot, new_bin);
        }
    }

    #[inline]
    fn traverse_bin<F>(&self, list: &[usize], center: Vec3, radius_squared: f32, callback: &mut F)
    where
        F: FnMut(&T, f32),
    {
        for &slot in list {
            let proxy = self.proxies.get(slot);
            let distance_squared = (center - proxy.position).length_squared();
            if distance_squared < radius_squared {
                callback(&proxy.object, distance_squared);
            }
        }
    }

    pub fn for_each_in_sphere<F>(&self, center: Vec3, radius: f32, mut callback: F)
    where
        F: FnMut(&T, f32),
    {
        if !(radius > 0.0) {
            return;
        }
        let radius_squared = radius * radius;
        let low = center - Vec3::splat(radius);
        let high = center + Vec3::splat(radius);
        let brick_max = self.origin + self.size;

        let completely_outside = high.x < self.origin.x
            || high.y < self.origin.y
            || high.z < self.origin.z
            || low.x >= brick_max.x
            || low.y >= brick_max.y
            || low.z >= brick_max.z;

        if completely_outside {
            self.traverse_bin(&self.overflow, center, radius_squared, &mut callback);
            return;
        }

        // Any part of the query box outside the brick may hold overflow members
        let partly_out = low.x < self.origin.x
            || low.y < self.origin.y
            || low.z < self.origin.z
            || high.x >= brick_max.x
            || high.y >= brick_max.y
            || high.z >= brick_max.z;

        if partly_out {
            self.traverse_bin(&self.overflow, center, radius_squared, &mut callback);
        }

        let clamp_axis = |coord: f32, origin: f32, size: f32, divisions: usize| {
            Self::axis_coord(coord, origin, size, divisions).clamp(0, divisions as i64 - 1) as usize
        };
        let min_x = clamp_axis(low.x, self.origin.x, self.size.x, self.divx);
        let min_y = clamp_axis(low.y, self.origin.y, self.size.y, self.divy);
        let min_z = clamp_axis(low.z, self.origin.z, self.size.z, self.divz);
        let max_x = clamp_axis(high.x, self.origin.x, self.size.x, self.divx);
        let max_y = clamp_axis(high.y, self.origin.y, self.size.y, self.divy);
        let max_z = clamp_axis(high.z, self.origin.z, self.size.z, self.divz);

        for ix in min_x..=max_x {
            for iy in min_y..=max_y {
                for iz in min_z..=max_z {
                    let bin = &self.bins[self.bin_coords_to_index(ix, iy, iz)];
                    self.traverse_bin(bin, center, radius_squared, &mut callback);
                }
            }
        }
    }

    pub fn for_each_object<F>(&self, mut callback: F)
    where
        F: FnMut(&T),
    {
        for &slot in self.bins.iter().flatten().chain(self.overflow.iter()) {
            callback(&self.proxies.get(slot).object);
        }
    }

    pub fn remove_all_objects(&mut self) {
        for bin in &mut self.bins {
            bin.clear();
        }
        self.overflow.clear();
        for proxy in self.proxies.iter_mut() {
            proxy.bin = None;
        }
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
