//! Hilbert curve indexing
//!
//! The curve is walked one level at a time from the most significant bit,
//! carrying an entry mask `e` and a direction flag `d`. Each level turns a
//! 2-bit quadrant code into a 2-bit Gray-coded output, so for a fixed order
//! the map `(x, y) -> index` is a bijection onto `[0, 4^order)`.

use log::debug;

/// Largest order whose indices fit in a `u32`
pub const MAX_ORDER: u32 = 16;

#[inline]
fn swap_bits(code: u32) -> u32 {
    ((code & 1) << 1) | (code >> 1)
}

#[inline]
fn gray(code: u32) -> u32 {
    code ^ (code >> 1)
}

#[inline]
fn next_state(out: u32, e: &mut u32, d: &mut bool) {
    if out == 0 {
        *d = !*d;
    } else if out == 3 {
        *e ^= 3;
        *d = !*d;
    }
}

/// Hilbert index of grid cell `(x, y)` for a curve of the given order
pub fn hilbert_index(order: u32, x: u32, y: u32) -> u64 {
    let mut e = 0u32;
    let mut d = false;
    let mut index = 0u64;

    for i in (0..order).rev() {
        let mut code = (((y >> i) & 1) << 1) | ((x >> i) & 1);
        code ^= e;
        if !d {
            code = swap_bits(code);
        }
        let out = gray(code);
        index = (index << 2) | out as u64;
        next_state(out, &mut e, &mut d);
    }

    index
}

/// Grid cell visited at `index`, the inverse of [`hilbert_index`]
pub fn hilbert_point(order: u32, index: u64) -> (u32, u32) {
    let mut e = 0u32;
    let mut d = false;
    let (mut x, mut y) = (0u32, 0u32);

    for i in (0..order).rev() {
        let out = ((index >> (2 * i)) & 3) as u32;
        // The 2-bit Gray code is its own inverse
        let mut code = gray(out);
        if !d {
            code = swap_bits(code);
        }
        code ^= e;
        x |= (code & 1) << i;
        y |= ((code >> 1) & 1) << i;
        next_state(out, &mut e, &mut d);
    }

    (x, y)
}

/// Hilbert index for every cell of a `2^order` square grid, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HilbertLookupTable {
    order: u32,
    grid_size: usize,
    indices: Vec<u32>,
}

impl HilbertLookupTable {
    /// Compute the table for a curve order
    pub fn build(order: u32) -> Self {
        debug_assert!(order <= MAX_ORDER, "order {} exceeds {}", order, MAX_ORDER);

        let grid_size = 1usize << order;
        let mut indices = Vec::with_capacity(grid_size * grid_size);
        for y in 0..grid_size as u32 {
            for x in 0..grid_size as u32 {
                indices.push(hilbert_index(order, x, y) as u32);
            }
        }

        debug!("Built Hilbert lookup table of order {} ({} entries)", order, indices.len());
        Self {
            order,
            grid_size,
            indices,
        }
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Hilbert index of `(x, y)`, or `None` outside the grid
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.grid_size || y >= self.grid_size {
            return None;
        }
        Some(self.indices[y * self.grid_size + x])
    }

    /// All indices, row-major
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_bijection(order: u32) {
        let table = HilbertLookupTable::build(order);
        let cells = 1usize << (2 * order);
        assert_eq!(table.len(), cells);

        let mut seen = vec![false; cells];
        for &index in table.indices() {
            assert!((index as usize) < cells);
            assert!(!seen[index as usize], "index {} produced twice", index);
            seen[index as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_bijection_small_orders() {
        for order in 0..=7 {
            assert_bijection(order);
        }
    }

    #[test]
    fn test_order_four_table() {
        let table = HilbertLookupTable::build(4);
        assert_eq!(table.grid_size(), 16);
        let mut sorted = table.indices().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..256).collect::<Vec<u32>>());
    }

    #[test]
    fn test_consecutive_indices_are_neighbours() {
        let order = 5;
        let mut previous = hilbert_point(order, 0);
        for index in 1..(1u64 << (2 * order)) {
            let point = hilbert_point(order, index);
            let distance = previous.0.abs_diff(point.0) + previous.1.abs_diff(point.1);
            assert_eq!(distance, 1, "indices {} and {} are not adjacent", index - 1, index);
            previous = point;
        }
    }

    #[test]
    fn test_inverse() {
        let order = 6;
        for y in 0..64 {
            for x in 0..64 {
                assert_eq!(hilbert_point(order, hilbert_index(order, x, y)), (x, y));
            }
        }
    }

    #[test]
    fn test_curve_endpoints() {
        assert_eq!(hilbert_point(3, 0), (0, 0));
        assert_eq!(hilbert_point(3, 63), (7, 0));
        assert_eq!(hilbert_index(0, 0, 0), 0);
    }

    #[test]
    fn test_get_outside_grid() {
        let table = HilbertLookupTable::build(2);
        assert!(table.get(3, 3).is_some());
        assert_eq!(table.get(4, 0), None);
        assert_eq!(table.get(0, 4), None);
    }
}
