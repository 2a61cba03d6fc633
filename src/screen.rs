/// pixels across
pub const SCREEN_WIDTH: usize = 64;
/// pixels down
pub const SCREEN_HEIGHT: usize = 32;
/// number of cells in the buffer
pub const SCREEN_SIZE: usize = SCREEN_WIDTH * SCREEN_HEIGHT;
/// bytes needed to pack the buffer at one bit per pixel
pub const SCREEN_PACKED_BYTES: usize = SCREEN_SIZE / 8;

/// The monochrome frame buffer the interpreter draws into. Cell 0 is the top
/// left corner; cells run left to right, then top to bottom.
#[derive(Clone, PartialEq, Eq)]
pub struct Screen {
    cells: Box<[bool; SCREEN_SIZE]>,
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen {
    pub fn new() -> Self {
        Screen {
            cells: Box::new([false; SCREEN_SIZE]),
        }
    }

    /// turn every pixel off
    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    /// toggle one pixel; indices past the end are dropped
    pub fn flip(&mut self, index: usize) {
        if let Some(cell) = self.cells.get_mut(index) {
            *cell = !*cell;
        }
    }

    pub fn is_set(&self, index: usize) -> bool {
        self.cells.get(index).copied().unwrap_or(false)
    }

    /// no wrapping: anything off the grid has no index
    pub fn coords_to_index(x: usize, y: usize) -> Option<usize> {
        if x < SCREEN_WIDTH && y < SCREEN_HEIGHT {
            Some(y * SCREEN_WIDTH + x)
        } else {
            None
        }
    }

    pub fn index_to_coords(index: usize) -> Option<(usize, usize)> {
        if index < SCREEN_SIZE {
            Some((index % SCREEN_WIDTH, index / SCREEN_WIDTH))
        } else {
            None
        }
    }

    /// number of pixels currently lit
    pub fn lit_count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    /// pack the buffer one bit per pixel, msb first, in the layout the
    /// `Display` trait draws
    pub fn packed(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; SCREEN_PACKED_BYTES];
        for (i, _) in self.cells.iter().enumerate().filter(|(_, c)| **c) {
            bytes[i / 8] |= 0x80 >> (i % 8);
        }
        bytes
    }
}

impl std::fmt::Debug for Screen {
    /// one line of `#` and `.` per row
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.chunks(SCREEN_WIDTH) {
            let line: String = row.iter().map(|c| if *c { '#' } else { '.' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
