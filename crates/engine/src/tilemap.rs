use thiserror::Error;

use crate::geometry::{Rect, Vec2};

#[derive(Debug, Clone, PartialEq)]
pub struct Tilemap {
    width: u32,
    height: u32,
    tile_width: f32,
    tile_height: f32,
    tiles: Vec<u32>,
    collision: Vec<(u32, u32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TilemapError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("tile size must be positive, got {width}x{height}")]
    InvalidTileSize { width: f32, height: f32 },
}

impl Tilemap {
    pub fn new(
        width: u32,
        height: u32,
        tile_width: f32,
        tile_height: f32,
        tiles: Vec<u32>,
    ) -> Result<Self, TilemapError> {
        if tile_width <= 0.0 || tile_height <= 0.0 {
            return Err(TilemapError::InvalidTileSize {
                width: tile_width,
                height: tile_height,
            });
        }
        let expected = width as usize * height as usize;
        let actual = tiles.len();
        if expected != actual {
            return Err(TilemapError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            tile_width,
            tile_height,
            tiles,
            collision: Vec::new(),
        })
    }

    /// Marks tile gids in each inclusive `(first, last)` range as solid.
    pub fn with_collision_ranges(mut self, ranges: &[(u32, u32)]) -> Self {
        self.collision = ranges.to_vec();
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> Vec2 {
        Vec2::new(self.tile_width, self.tile_height)
    }

    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * self.tile_width
    }

    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * self.tile_height
    }

    pub fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Option<u32> {
        self.index_of(x, y)
            .and_then(|index| self.tiles.get(index).copied())
    }

    pub fn is_collision_gid(&self, gid: u32) -> bool {
        gid != 0
            && self
                .collision
                .iter()
                .any(|(first, last)| (*first..=*last).contains(&gid))
    }

    pub fn is_solid_tile(&self, x: u32, y: u32) -> bool {
        self.tile_at(x, y)
            .is_some_and(|gid| self.is_collision_gid(gid))
    }

    pub fn tile_rect(&self, x: u32, y: u32) -> Rect {
        Rect::new(
            x as f32 * self.tile_width,
            y as f32 * self.tile_height,
            self.tile_width,
            self.tile_height,
        )
    }

    pub fn tile_coords_at(&self, point: Vec2) -> Option<(u32, u32)> {
        if point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let x = (point.x / self.tile_width).floor() as u32;
        let y = (point.y / self.tile_height).floor() as u32;
        self.index_of(x, y).map(|_| (x, y))
    }

    pub fn is_solid_at(&self, point: Vec2) -> bool {
        self.tile_coords_at(point)
            .is_some_and(|(x, y)| self.is_solid_tile(x, y))
    }

    /// Solid tile rectangles touching `area`, row-major.
    pub fn solid_rects_in(&self, area: &Rect) -> Vec<Rect> {
        let mut rects = Vec::new();
        if self.width == 0 || self.height == 0 {
            return rects;
        }
        let max_x = self.width as i64 - 1;
        let max_y = self.height as i64 - 1;
        let x0 = ((area.left() / self.tile_width).floor() as i64).clamp(0, max_x);
        let x1 = ((area.right() / self.tile_width).floor() as i64).clamp(0, max_x);
        let y0 = ((area.top() / self.tile_height).floor() as i64).clamp(0, max_y);
        let y1 = ((area.bottom() / self.tile_height).floor() as i64).clamp(0, max_y);
        for y in y0..=y1 {
            for x in x0..=x1 {
                if self.is_solid_tile(x as u32, y as u32) {
                    rects.push(self.tile_rect(x as u32, y as u32));
                }
            }
        }
        rects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_map() -> Tilemap {
        // 4x3, bottom row solid except the last column
        let tiles = vec![0, 0, 0, 0, 0, 0, 0, 0, 17, 18, 44, 3];
        Tilemap::new(4, 3, 16.0, 16.0, tiles)
            .expect("tilemap")
            .with_collision_ranges(&[(17, 44)])
    }

    #[test]
    fn tilemap_new_rejects_invalid_tile_count() {
        let result = Tilemap::new(2, 2, 16.0, 16.0, vec![1, 2, 3]);
        assert_eq!(
            result,
            Err(TilemapError::TileCountMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn collision_ranges_are_inclusive() {
        let map = floor_map();
        assert!(map.is_solid_tile(0, 2));
        assert!(map.is_solid_tile(2, 2));
        assert!(!map.is_solid_tile(3, 2));
        assert!(!map.is_solid_tile(9, 9));
        assert!(map.is_solid_at(Vec2::new(40.0, 40.0)));
        assert!(!map.is_solid_at(Vec2::new(-1.0, 40.0)));
    }

    #[test]
    fn solid_rects_in_clamps_area_to_map() {
        let map = floor_map();
        let rects = map.solid_rects_in(&Rect::new(-50.0, 20.0, 500.0, 500.0));
        assert_eq!(rects.len(), 3);
        assert_eq!(rects[0], Rect::new(0.0, 32.0, 16.0, 16.0));
        assert_eq!(map.pixel_width(), 64.0);
    }
}
