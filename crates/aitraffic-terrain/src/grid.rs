//! TerrainGrid: a lat/lon heightmap with elevation queries.

use serde::{Deserialize, Serialize};

use aitraffic_core::constants::M_TO_FT;

use crate::ground::{GroundQuery, GroundSample};

/// Terrain grid header metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainHeader {
    /// Southwest corner latitude (degrees).
    pub origin_lat: f64,
    /// Southwest corner longitude (degrees).
    pub origin_lon: f64,
    /// Arc-seconds per grid cell.
    pub cell_size: f64,
    /// Number of columns (west to east).
    pub width: u32,
    /// Number of rows (north to south).
    pub height: u32,
}

impl TerrainHeader {
    /// North edge latitude (degrees).
    pub fn north_lat(&self) -> f64 {
        self.origin_lat + (self.height as f64 * self.cell_size) / 3600.0
    }

    /// East edge longitude (degrees).
    pub fn east_lon(&self) -> f64 {
        self.origin_lon + (self.width as f64 * self.cell_size) / 3600.0
    }
}

/// Heightmap grid in geographic coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainGrid {
    pub header: TerrainHeader,
    /// Elevation values in meters, row-major (north-to-south, west-to-east).
    pub elevations: Vec<i16>,
    /// Packed water mask: bit 1 = land, bit 0 = water. One bit per cell.
    #[serde(default)]
    pub water_mask: Option<Vec<u8>>,
}

impl TerrainGrid {
    pub fn new(header: TerrainHeader, elevations: Vec<i16>, water_mask: Option<Vec<u8>>) -> Self {
        Self {
            header,
            elevations,
            water_mask,
        }
    }

    /// Convert lat/lon to grid row/col (fractional).
    /// Returns None if outside grid bounds.
    fn geo_to_grid(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        let h = &self.header;
        if h.width == 0 || h.height == 0 || h.cell_size <= 0.0 {
            return None;
        }

        // Column: west-to-east
        let col = (lon - h.origin_lon) * 3600.0 / h.cell_size;
        // Row: north-to-south (row 0 = north edge)
        let row = (h.north_lat() - lat) * 3600.0 / h.cell_size;

        if !(0.0..h.width as f64).contains(&col) || !(0.0..h.height as f64).contains(&row) {
            return None;
        }

        Some((row, col))
    }

    fn raw_elevation(&self, row: usize, col: usize) -> i16 {
        let h = &self.header;
        if row >= h.height as usize || col >= h.width as usize {
            return 0;
        }
        self.elevations
            .get(row * h.width as usize + col)
            .copied()
            .unwrap_or(0)
    }

    /// Elevation (m) at lat/lon with bilinear interpolation.
    pub fn elevation_m_at(&self, lat: f64, lon: f64) -> Option<f64> {
        let (row, col) = self.geo_to_grid(lat, lon)?;
        Some(self.bilinear(row, col))
    }

    fn bilinear(&self, row: f64, col: f64) -> f64 {
        let r0 = row.floor() as usize;
        let c0 = col.floor() as usize;
        let r1 = (r0 + 1).min(self.header.height as usize - 1);
        let c1 = (c0 + 1).min(self.header.width as usize - 1);

        let fr = row - r0 as f64;
        let fc = col - c0 as f64;

        let e00 = self.raw_elevation(r0, c0) as f64;
        let e01 = self.raw_elevation(r0, c1) as f64;
        let e10 = self.raw_elevation(r1, c0) as f64;
        let e11 = self.raw_elevation(r1, c1) as f64;

        let top = e00 * (1.0 - fc) + e01 * fc;
        let bot = e10 * (1.0 - fc) + e11 * fc;
        top * (1.0 - fr) + bot * fr
    }

    /// Whether lat/lon is water, by mask or, without one, by elevation <= 0.
    pub fn is_water(&self, lat: f64, lon: f64) -> bool {
        let Some((row, col)) = self.geo_to_grid(lat, lon) else {
            return true;
        };
        if let Some(ref mask) = self.water_mask {
            let r = (row.round() as usize).min(self.header.height as usize - 1);
            let c = (col.round() as usize).min(self.header.width as usize - 1);
            let idx = r * self.header.width as usize + c;
            return match mask.get(idx / 8) {
                Some(byte) => byte & (1 << (idx % 8)) == 0,
                None => true,
            };
        }
        self.bilinear(row, col) <= 0.0
    }
}

impl GroundQuery for TerrainGrid {
    fn ground_at(&self, lat_deg: f64, lon_deg: f64) -> Option<GroundSample> {
        let elevation_ft = self.elevation_m_at(lat_deg, lon_deg)? * M_TO_FT;
        if self.is_water(lat_deg, lon_deg) {
            Some(GroundSample::water(elevation_ft.max(0.0)))
        } else {
            Some(GroundSample::land(elevation_ft))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 5×5 grid, 1 arc-second per cell, centered at (26.5, 56.2).
    fn make_test_grid(mask: Option<Vec<u8>>) -> TerrainGrid {
        let cell_size = 1.0;
        let width = 5u32;
        let height = 5u32;
        let origin_lat = 26.5 - (height as f64 * cell_size / 3600.0) / 2.0;
        let origin_lon = 56.2 - (width as f64 * cell_size / 3600.0) / 2.0;

        // Elevation: center cell is 100m, edges are 0
        #[rustfmt::skip]
        let elevations: Vec<i16> = vec![
            0,   0,   0,   0,   0,
            0,  50,  50,  50,   0,
            0,  50, 100,  50,   0,
            0,  50,  50,  50,   0,
            0,   0,   0,   0,   0,
        ];

        TerrainGrid::new(
            TerrainHeader {
                origin_lat,
                origin_lon,
                cell_size,
                width,
                height,
            },
            elevations,
            mask,
        )
    }

    fn cell_center(grid: &TerrainGrid, row: f64, col: f64) -> (f64, f64) {
        let h = &grid.header;
        (
            h.north_lat() - row * h.cell_size / 3600.0,
            h.origin_lon + col * h.cell_size / 3600.0,
        )
    }

    #[test]
    fn test_elevation_query_center() {
        let grid = make_test_grid(None);
        let (lat, lon) = cell_center(&grid, 2.0, 2.0);
        let e = grid.elevation_m_at(lat, lon).expect("peak cell should be within grid");
        assert!((e - 100.0).abs() < 1.0, "peak elevation should be ~100m, got {e}");

        let ft = grid.elevation_ft(lat, lon).unwrap();
        assert!((ft - 328.08).abs() < 5.0, "peak in feet: {ft}");
    }

    #[test]
    fn test_outside_grid_is_unknown() {
        let grid = make_test_grid(None);
        assert!(grid.ground_at(27.5, 56.2).is_none(), "one degree north is off the grid");
    }

    #[test]
    fn test_elevation_bilinear_interpolation() {
        let grid = make_test_grid(None);
        // row 1 col 2 = 50, row 2 col 2 = 100
        let (lat, lon) = cell_center(&grid, 1.5, 2.0);
        let e = grid.elevation_m_at(lat, lon).unwrap();
        assert!((e - 75.0).abs() < 1.0, "interpolated elevation should be ~75m, got {e}");
    }

    #[test]
    fn test_water_without_mask() {
        let grid = make_test_grid(None);
        let (lat, lon) = cell_center(&grid, 2.0, 2.0);
        assert!(grid.ground_at(lat, lon).unwrap().solid, "peak is land");

        let (lat, lon) = cell_center(&grid, 4.5, 0.5);
        assert!(!grid.ground_at(lat, lon).unwrap().solid, "0m edge is water");
    }

    #[test]
    fn test_water_mask_overrides_elevation() {
        // every cell water
        let grid = make_test_grid(Some(vec![0u8; 4]));
        let (lat, lon) = cell_center(&grid, 2.0, 2.0);
        assert!(grid.is_water(lat, lon));
    }
}
