#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileError {
    SizeMismatch { size: u32, len: usize },
}

impl std::fmt::Display for TileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TileError::SizeMismatch { size, len } => {
                write!(
                    f,
                    "rgba buffer length {len} does not match {size}x{size}x4"
                )
            }
        }
    }
}

impl std::error::Error for TileError {}

/// A generated fragment image: a square RGBA8 buffer at the base fragment
/// resolution. Immutable once constructed; the store owns it after insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    size: u32,
    data: Vec<u8>,
}

impl Tile {
    pub fn from_rgba(size: u32, data: Vec<u8>) -> Result<Self, TileError> {
        let expected = size as usize * size as usize * 4;
        if data.len() != expected {
            return Err(TileError::SizeMismatch {
                size,
                len: data.len(),
            });
        }
        Ok(Self { size, data })
    }

    /// A solid-color tile, mostly useful in tests and synthetic sources.
    pub fn filled(size: u32, rgba: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(size as usize * size as usize * 4);
        for _ in 0..(size as usize * size as usize) {
            data.extend_from_slice(&rgba);
        }
        Self { size, data }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size || y >= self.size {
            return None;
        }
        let i = (y as usize * self.size as usize + x as usize) * 4;
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    /// CSS-style `#rrggbb` string for the pixel, alpha dropped.
    pub fn pixel_hex(&self, x: u32, y: u32) -> Option<String> {
        let [r, g, b, _a] = self.pixel(x, y)?;
        Some(format!("#{r:02x}{g:02x}{b:02x}"))
    }
}

#[cfg(test)]
mod tests {
    use super::{Tile, TileError};

    #[test]
    fn rejects_wrong_buffer_length() {
        let err = Tile::from_rgba(2, vec![0; 15]).unwrap_err();
        assert_eq!(err, TileError::SizeMismatch { size: 2, len: 15 });
        assert!(Tile::from_rgba(2, vec![0; 16]).is_ok());
    }

    #[test]
    fn pixel_addressing_is_row_major() {
        let mut data = vec![0u8; 16];
        // Pixel (1, 0) red, pixel (0, 1) green.
        data[4] = 0xff;
        data[9] = 0xff;
        let tile = Tile::from_rgba(2, data).unwrap();
        assert_eq!(tile.pixel(1, 0), Some([0xff, 0, 0, 0]));
        assert_eq!(tile.pixel(0, 1), Some([0, 0xff, 0, 0]));
        assert_eq!(tile.pixel(2, 0), None);
        assert_eq!(tile.pixel_hex(1, 0).as_deref(), Some("#ff0000"));
    }
}
