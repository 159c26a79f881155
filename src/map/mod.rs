//! The in-memory vector map model consumed by the export codec.
//!
//! This is a read-only data contract: ordered colors, ordered symbols, and
//! per-part object lists, plus georeferencing, grid and notes. Editing,
//! spatial indexing and rendering are the owning application's business.

pub mod color;
pub mod coord;
pub mod geo;
pub mod object;
pub mod symbol;

pub use color::{Cmyk, ColorRef, MapColor};
pub use coord::{Bounds, CoordFlags, MapCoord};
pub use geo::{Georeferencing, GridUnit, MapGrid};
pub use object::{
    HorizontalAlignment, Object, ObjectKind, PathObject, PointObject, TextLineLayout, TextObject,
    VerticalAlignment,
};
pub use symbol::{
    AreaSymbol, CapStyle, CombinedPart, CombinedSymbol, ElementSymbol, FillPattern,
    FillPatternKind, FontMetrics, ICON_SIZE, IconImage, JoinStyle, LineSymbol, LineSymbolBorder,
    PartRef, PointSymbol, PointSymbolElement, Symbol, SymbolKind, TextFraming, TextSymbol,
};

/// One part of the map, holding an ordered object list.
#[derive(Debug, Clone, Default)]
pub struct MapPart {
    pub name: String,
    pub objects: Vec<Object>,
}

/// The complete map model.
#[derive(Debug, Clone, Default)]
pub struct Map {
    pub colors: Vec<MapColor>,
    pub symbols: Vec<Symbol>,
    pub parts: Vec<MapPart>,
    pub georef: Georeferencing,
    pub grid: MapGrid,
    pub notes: String,
}

impl Map {
    /// Iterate all objects of all parts in drawing order.
    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.parts.iter().flat_map(|part| part.objects.iter())
    }

    /// Whether any symbol draws with the registration pseudo-color.
    pub fn uses_registration_color(&self) -> bool {
        self.symbols
            .iter()
            .any(|s| s.contains_color(self, ColorRef::Registration))
    }

    /// Bounding box of all objects in millimeters, `None` for an empty map.
    pub fn calculate_extent_mm(&self) -> Option<Bounds> {
        let mut result: Option<Bounds> = None;
        for object in self.objects() {
            if let Some(extent) = object.extent_mm() {
                match &mut result {
                    Some(bounds) => bounds.include_bounds(&extent),
                    None => result = Some(extent),
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_color_detection() {
        let mut map = Map::default();
        map.symbols.push(Symbol::new(
            [101, 0],
            "dot",
            SymbolKind::Point(PointSymbol {
                inner_radius: 250,
                inner_color: Some(ColorRef::Map(0)),
                ..Default::default()
            }),
        ));
        assert!(!map.uses_registration_color());

        map.symbols.push(Symbol::new(
            [102, 0],
            "reg mark",
            SymbolKind::Point(PointSymbol {
                inner_radius: 250,
                inner_color: Some(ColorRef::Registration),
                ..Default::default()
            }),
        ));
        assert!(map.uses_registration_color());
    }

    #[test]
    fn test_extent_over_parts() {
        let mut map = Map::default();
        let mut part = MapPart::default();
        part.objects.push(Object {
            symbol: 0,
            kind: ObjectKind::Point(PointObject {
                coord: MapCoord::new(-1000, 2000),
                rotation: 0.0,
            }),
        });
        part.objects.push(Object {
            symbol: 0,
            kind: ObjectKind::Path(PathObject {
                coords: vec![MapCoord::new(0, 0), MapCoord::new(5000, -3000)],
            }),
        });
        map.parts.push(part);

        let extent = map.calculate_extent_mm().unwrap();
        assert_eq!(
            (extent.min_x, extent.min_y, extent.max_x, extent.max_y),
            (-1.0, -3.0, 5.0, 2.0)
        );
    }
}
