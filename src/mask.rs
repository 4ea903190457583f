/// Dense occupancy grid used for exact silhouette collision.
///
/// Rows are packed into `u64` words so an overlap test compares up to 64
/// cells per step. Bit `x % 64` of word `x / 64` holds column `x`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    words_per_row: usize,
    bits: Vec<u64>,
}

impl Mask {
    /// Empty mask of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        let words_per_row = (width as usize).div_ceil(64);
        Self {
            width,
            height,
            words_per_row,
            bits: vec![0; words_per_row * height as usize],
        }
    }

    /// Every cell occupied.
    pub fn filled(width: u32, height: u32) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                mask.set(x, y, true);
            }
        }
        mask
    }

    /// Ellipse inscribed in the bounding box, sampled at cell centers.
    pub fn ellipse(width: u32, height: u32) -> Self {
        let mut mask = Self::new(width, height);
        let rx = width as f32 * 0.5;
        let ry = height as f32 * 0.5;
        for y in 0..height {
            for x in 0..width {
                let nx = (x as f32 + 0.5 - rx) / rx;
                let ny = (y as f32 + 0.5 - ry) / ry;
                if nx * nx + ny * ny <= 1.0 {
                    mask.set(x, y, true);
                }
            }
        }
        mask
    }

    /// Build from a row-major alpha channel. Cells with alpha above
    /// `threshold` are occupied. Returns `None` if `alpha` has the wrong size.
    pub fn from_alpha(width: u32, height: u32, alpha: &[u8], threshold: u8) -> Option<Self> {
        if alpha.len() != width as usize * height as usize {
            return None;
        }
        let mut mask = Self::new(width, height);
        for (i, a) in alpha.iter().enumerate() {
            if *a > threshold {
                mask.set(i as u32 % width, i as u32 / width, true);
            }
        }
        Some(mask)
    }

    /// ASCII art: `#` is occupied, anything else is empty.
    pub fn from_rows(rows: &[&str]) -> Self {
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
        let mut mask = Self::new(width, rows.len() as u32);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    mask.set(x as u32, y as u32, true);
                }
            }
        }
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let word = y as usize * self.words_per_row + (x / 64) as usize;
        (self.bits[word] >> (x % 64)) & 1 == 1
    }

    /// Out-of-range writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, occupied: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let word = y as usize * self.words_per_row + (x / 64) as usize;
        let bit = 1u64 << (x % 64);
        if occupied {
            self.bits[word] |= bit;
        } else {
            self.bits[word] &= !bit;
        }
    }

    /// Number of occupied cells.
    pub fn count(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Upside-down copy, used for the top half of an obstacle.
    pub fn flipped_vertical(&self) -> Self {
        let mut out = Self::new(self.width, self.height);
        for y in 0..self.height as usize {
            let src = y * self.words_per_row;
            let dst = (self.height as usize - 1 - y) * self.words_per_row;
            out.bits[dst..dst + self.words_per_row]
                .copy_from_slice(&self.bits[src..src + self.words_per_row]);
        }
        out
    }

    /// `len` cells of row `y` starting at column `x`, low bit first.
    /// Caller guarantees `1 <= len <= 64` and `x + len <= width`.
    fn chunk(&self, x: u32, y: u32, len: u32) -> u64 {
        let col_word = (x / 64) as usize;
        let word = y as usize * self.words_per_row + col_word;
        let shift = x % 64;
        let mut v = self.bits[word] >> shift;
        if shift != 0 && col_word + 1 < self.words_per_row {
            v |= self.bits[word + 1] << (64 - shift);
        }
        if len < 64 {
            v &= (1u64 << len) - 1;
        }
        v
    }

    /// First occupied cell shared with `other` placed at `offset` in this
    /// mask's frame, scanning rows top to bottom. Coordinates are in this
    /// mask's frame.
    pub fn overlap(&self, other: &Mask, offset: (i32, i32)) -> Option<(u32, u32)> {
        let dx = offset.0 as i64;
        let dy = offset.1 as i64;
        let x0 = dx.max(0);
        let x1 = (self.width as i64).min(dx + other.width as i64);
        let y0 = dy.max(0);
        let y1 = (self.height as i64).min(dy + other.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }

        for y in y0..y1 {
            let mut x = x0;
            while x < x1 {
                let len = (x1 - x).min(64) as u32;
                let hit = self.chunk(x as u32, y as u32, len)
                    & other.chunk((x - dx) as u32, (y - dy) as u32, len);
                if hit != 0 {
                    return Some((x as u32 + hit.trailing_zeros(), y as u32));
                }
                x += len as i64;
            }
        }
        None
    }
}

/// Whole-unit offset of `b` relative to `a`. Each origin is snapped to the
/// grid first, halves to even, then the difference is taken.
pub fn relative_offset(origin_a: (f32, f32), origin_b: (f32, f32)) -> (i32, i32) {
    (
        snap(origin_b.0) - snap(origin_a.0),
        snap(origin_b.1) - snap(origin_a.1),
    )
}

fn snap(v: f32) -> i32 {
    v.round_ties_even() as i32
}

/// Whether two placed masks share any occupied cell.
pub fn overlaps(a: &Mask, origin_a: (f32, f32), b: &Mask, origin_b: (f32, f32)) -> bool {
    a.overlap(b, relative_offset(origin_a, origin_b)).is_some()
}
