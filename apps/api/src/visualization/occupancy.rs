use rand::Rng;

use super::glyphs::Mask;

/// Tracks which canvas pixels are taken, with a summed-area table so that
/// "is this box free" is O(1).
pub struct OccupancyGrid {
    width: u32,
    height: u32,
    occupied: Vec<bool>,
    /// (width + 1) × (height + 1); entry (x, y) counts occupied pixels above
    /// and left of (x, y).
    integral: Vec<u32>,
}

impl OccupancyGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            occupied: vec![false; (width * height) as usize],
            integral: vec![0; ((width + 1) * (height + 1)) as usize],
        }
    }

    fn sum_at(&self, x: u32, y: u32) -> u32 {
        self.integral[(y * (self.width + 1) + x) as usize]
    }

    fn box_is_free(&self, x: u32, y: u32, w: u32, h: u32) -> bool {
        let total = self.sum_at(x + w, y + h) + self.sum_at(x, y)
            - self.sum_at(x + w, y)
            - self.sum_at(x, y + h);
        total == 0
    }

    /// Picks a uniformly random top-left corner where a `w`×`h` box is free.
    pub fn find_position<R: Rng>(&self, w: u32, h: u32, rng: &mut R) -> Option<(u32, u32)> {
        if w == 0 || h == 0 || w > self.width || h > self.height {
            return None;
        }

        let xs = self.width - w + 1;
        let ys = self.height - h + 1;
        let free = |i: u32| self.box_is_free(i % xs, i / xs, w, h);

        let count = (0..xs * ys).filter(|&i| free(i)).count();
        if count == 0 {
            return None;
        }

        let target = rng.gen_range(0..count);
        (0..xs * ys)
            .filter(|&i| free(i))
            .nth(target)
            .map(|i| (i % xs, i / xs))
    }

    /// Marks the set pixels of `mask` at offset (x, y) as occupied.
    pub fn occupy(&mut self, x: u32, y: u32, mask: &Mask) {
        for (mx, my) in mask.pixels() {
            let (px, py) = (x + mx, y + my);
            if px < self.width && py < self.height {
                self.occupied[(py * self.width + px) as usize] = true;
            }
        }
        self.rebuild_integral();
    }

    fn rebuild_integral(&mut self) {
        let stride = (self.width + 1) as usize;
        for y in 0..self.height as usize {
            let mut row_sum = 0u32;
            for x in 0..self.width as usize {
                row_sum += self.occupied[y * self.width as usize + x] as u32;
                self.integral[(y + 1) * stride + x + 1] = self.integral[y * stride + x + 1] + row_sum;
            }
        }
    }
}
