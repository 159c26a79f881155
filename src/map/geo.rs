//! Georeferencing and grid definitions.
//!
//! Only the single projection pair used by the export codec is provided;
//! full CRS handling lives outside this crate.

/// Georeferencing of the map: paper coordinates to projected coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Georeferencing {
    /// Denominator of the map scale, e.g. 15000 for 1:15000.
    pub scale_denominator: u32,
    /// Grivation (rotation between magnetic and grid north) in degrees.
    pub grivation_deg: f64,
    /// Projected coordinates of the map's reference point, in meters.
    pub ref_point: (f64, f64),
}

impl Default for Georeferencing {
    fn default() -> Self {
        Self {
            scale_denominator: 15000,
            grivation_deg: 0.0,
            ref_point: (0.0, 0.0),
        }
    }
}

impl Georeferencing {
    /// Map paper coordinates (mm) to projected coordinates (m).
    pub fn to_projected(&self, x_mm: f64, y_mm: f64) -> (f64, f64) {
        let factor = f64::from(self.scale_denominator) / 1000.0;
        let a = self.grivation_deg.to_radians();
        let (sin, cos) = a.sin_cos();
        (
            self.ref_point.0 + factor * (x_mm * cos + y_mm * sin),
            self.ref_point.1 + factor * (-x_mm * sin + y_mm * cos),
        )
    }

    /// Projected coordinates (m) back to map paper coordinates (mm).
    pub fn to_map(&self, x_m: f64, y_m: f64) -> (f64, f64) {
        let factor = 1000.0 / f64::from(self.scale_denominator);
        let a = self.grivation_deg.to_radians();
        let (sin, cos) = a.sin_cos();
        let dx = x_m - self.ref_point.0;
        let dy = y_m - self.ref_point.1;
        (factor * (dx * cos - dy * sin), factor * (dx * sin + dy * cos))
    }
}

/// Unit of the grid spacing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridUnit {
    MillimetersOnMap,
    MetersInTerrain,
}

/// The map's grid definition.
#[derive(Debug, Clone, PartialEq)]
pub struct MapGrid {
    pub unit: GridUnit,
    pub horizontal_spacing: f64,
    pub vertical_spacing: f64,
}

impl Default for MapGrid {
    fn default() -> Self {
        Self {
            unit: GridUnit::MetersInTerrain,
            horizontal_spacing: 500.0,
            vertical_spacing: 500.0,
        }
    }
}
