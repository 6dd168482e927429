//! # Geometry Source
//!
//! Country boundaries read from a Natural Earth style shapefile. Only the
//! `ADM0_A3` attribute and the polygon geometry are kept; coordinates are
//! reprojected to Robinson on load.

use crate::cache::{CacheKey, CacheKeyBuilder};
use crate::projection;
use crate::{CountryCode, CountryRecord, HistomapError};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile::dbase::{FieldValue, Record};
use shapefile::{PolygonRing, Shape};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Attribute holding the three-letter country code.
pub const CODE_FIELD: &str = "ADM0_A3";

/// Supplier of projected country records.
///
/// `fingerprint` identifies the dataset as it currently is, so callers can
/// key caches on it without loading the geometry.
pub trait GeometrySource: Send + Sync {
    fn fingerprint(&self) -> Result<CacheKey, HistomapError>;

    fn load(&self) -> Result<Vec<CountryRecord>, HistomapError>;
}

// =============================================================================
// SHAPEFILE SOURCE
// =============================================================================

/// Geometry read from a `.shp` file and its `.dbf` sidecar.
#[derive(Debug, Clone)]
pub struct ShapefileSource {
    path: PathBuf,
}

impl ShapefileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GeometrySource for ShapefileSource {
    /// Path, plus modification time and size of the `.shp` file and its
    /// `.dbf` sidecar.
    fn fingerprint(&self) -> Result<CacheKey, HistomapError> {
        let metadata = std::fs::metadata(&self.path).map_err(|e| {
            HistomapError::Io(format!("Cannot stat '{}': {}", self.path.display(), e))
        })?;
        let builder = stamp(
            CacheKey::builder("geometry").text(&self.path.to_string_lossy()),
            &metadata,
        );

        // A missing sidecar fails on load; the key only has to differ.
        let key = match std::fs::metadata(self.path.with_extension("dbf")) {
            Ok(sidecar) => stamp(builder.text("dbf"), &sidecar).finish(),
            Err(_) => builder.text("no-dbf").finish(),
        };
        Ok(key)
    }

    fn load(&self) -> Result<Vec<CountryRecord>, HistomapError> {
        let mut reader = shapefile::Reader::from_path(&self.path).map_err(|e| {
            HistomapError::Geometry(format!("Cannot open '{}': {}", self.path.display(), e))
        })?;

        let mut countries = Vec::new();
        for item in reader.iter_shapes_and_records() {
            let (shape, record) = item.map_err(|e| {
                HistomapError::Geometry(format!("Malformed '{}': {}", self.path.display(), e))
            })?;
            let code = country_code(&record)?;
            let geometry = shape_to_multipolygon(&code, shape)?;
            countries.push(CountryRecord::new(code, projection::project(&geometry)));
        }
        Ok(countries)
    }
}

fn stamp(builder: CacheKeyBuilder, metadata: &std::fs::Metadata) -> CacheKeyBuilder {
    let modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    builder
        .bytes(&modified.to_le_bytes())
        .bytes(&metadata.len().to_le_bytes())
}

// =============================================================================
// CONVERSION
// =============================================================================

/// Extract the country code attribute of a record.
pub fn country_code(record: &Record) -> Result<CountryCode, HistomapError> {
    match record.get(CODE_FIELD) {
        Some(FieldValue::Character(value)) => Ok(CountryCode::new(
            value.as_deref().unwrap_or_default().trim(),
        )),
        Some(other) => Err(HistomapError::Geometry(format!(
            "Field {} is not a character field: {:?}",
            CODE_FIELD, other
        ))),
        None => Err(HistomapError::Geometry(format!(
            "Missing field {}",
            CODE_FIELD
        ))),
    }
}

/// Convert a shapefile shape into lon/lat polygons.
///
/// Inner rings attach to the closest preceding outer ring. A null shape
/// becomes an empty multipolygon, which the renderer rejects.
pub fn shape_to_multipolygon(
    code: &CountryCode,
    shape: Shape,
) -> Result<MultiPolygon<f64>, HistomapError> {
    let rings: Vec<(bool, LineString<f64>)> = match shape {
        Shape::NullShape => Vec::new(),
        Shape::Polygon(p) => p
            .rings()
            .iter()
            .map(|r| ring(r, |pt| Coord { x: pt.x, y: pt.y }))
            .collect(),
        Shape::PolygonM(p) => p
            .rings()
            .iter()
            .map(|r| ring(r, |pt| Coord { x: pt.x, y: pt.y }))
            .collect(),
        Shape::PolygonZ(p) => p
            .rings()
            .iter()
            .map(|r| ring(r, |pt| Coord { x: pt.x, y: pt.y }))
            .collect(),
        other => {
            return Err(HistomapError::Geometry(format!(
                "{}: unsupported shape type {:?}",
                code,
                other.shapetype()
            )));
        }
    };
    Ok(assemble(rings))
}

fn ring<P>(ring: &PolygonRing<P>, xy: impl Fn(&P) -> Coord<f64>) -> (bool, LineString<f64>) {
    let outer = matches!(ring, PolygonRing::Outer(_));
    (outer, ring.points().iter().map(xy).collect())
}

fn assemble(rings: Vec<(bool, LineString<f64>)>) -> MultiPolygon<f64> {
    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();
    for (outer, line) in rings {
        match polygons.last_mut() {
            Some((_, holes)) if !outer => holes.push(line),
            _ => polygons.push((line, Vec::new())),
        }
    }
    MultiPolygon::new(
        polygons
            .into_iter()
            .map(|(exterior, holes)| Polygon::new(exterior, holes))
            .collect(),
    )
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::join;
    use crate::projection::{EARTH_RADIUS, FYC};
    use crate::sources::{ClassificationTable, StageLegend};
    use shapefile::Point;
    use shapefile::dbase::{FieldName, TableWriterBuilder};

    fn square(x: f64, y: f64, size: f64) -> Vec<Point> {
        vec![
            Point::new(x, y),
            Point::new(x, y + size),
            Point::new(x + size, y + size),
            Point::new(x + size, y),
            Point::new(x, y),
        ]
    }

    #[test]
    fn outer_and_inner_rings_form_polygons_with_holes() {
        let polygon = shapefile::Polygon::with_rings(vec![
            PolygonRing::Outer(square(0.0, 0.0, 10.0)),
            PolygonRing::Inner(square(2.0, 2.0, 1.0)),
            PolygonRing::Outer(square(20.0, 0.0, 5.0)),
        ]);
        let mp = shape_to_multipolygon(&CountryCode::new("TST"), Shape::Polygon(polygon))
            .expect("convert");

        assert_eq!(mp.0.len(), 2);
        assert_eq!(mp.0[0].interiors().len(), 1);
        assert_eq!(mp.0[1].interiors().len(), 0);
        assert_eq!(mp.0[1].exterior().0[0], Coord { x: 20.0, y: 0.0 });
    }

    fn code_record(value: FieldValue) -> Record {
        let mut record = Record::default();
        record.insert(CODE_FIELD.to_string(), value);
        record
    }

    fn code_table() -> TableWriterBuilder {
        TableWriterBuilder::new()
            .add_character_field(FieldName::try_from(CODE_FIELD).expect("field name"), 3)
    }

    fn write_shapefile(path: &Path, table: TableWriterBuilder, rows: Vec<(Vec<Point>, Record)>) {
        let mut writer = shapefile::Writer::from_path(path, table).expect("writer");
        for (points, record) in rows {
            let polygon = shapefile::Polygon::new(PolygonRing::Outer(points));
            writer
                .write_shape_and_record(&polygon, &record)
                .expect("write shape");
        }
    }

    #[test]
    fn shapefile_loads_in_file_order_and_projected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("world.shp");
        write_shapefile(
            &path,
            code_table(),
            vec![
                (
                    square(0.0, 40.0, 5.0),
                    code_record(FieldValue::Character(Some("FRA".to_string()))),
                ),
                (
                    square(10.0, -85.0, 4.0),
                    code_record(FieldValue::Character(Some("ATA".to_string()))),
                ),
            ],
        );

        let countries = ShapefileSource::new(&path).load().expect("load");
        let codes: Vec<&str> = countries.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["FRA", "ATA"]);

        // lon 0, lat 40 sits exactly on a table row.
        let expected_y = FYC * EARTH_RADIUS * 0.4958;
        let france = &countries[0].geometry;
        assert_eq!(france.0.len(), 1);
        assert!(
            france.0[0]
                .exterior()
                .coords()
                .any(|c| c.x.abs() < 1e-6 && (c.y - expected_y).abs() < 1e-6 * expected_y),
            "lat 40 vertex not projected: {:?}",
            france.0[0].exterior()
        );

        let view = join(&countries, &ClassificationTable::default(), &StageLegend::default());
        assert_eq!(view.len(), 1);
        assert_eq!(view.countries()[0].code.as_str(), "FRA");
    }

    #[test]
    fn numeric_code_field_fails_to_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("numeric.shp");
        let table = TableWriterBuilder::new().add_numeric_field(
            FieldName::try_from(CODE_FIELD).expect("field name"),
            10,
            0,
        );
        write_shapefile(
            &path,
            table,
            vec![(square(0.0, 0.0, 1.0), code_record(FieldValue::Numeric(Some(250.0))))],
        );

        let err = ShapefileSource::new(&path).load().expect_err("numeric code");
        assert!(matches!(err, HistomapError::Geometry(_)));
    }

    #[test]
    fn fingerprint_tracks_dbf_sidecar() {
        let dir = tempfile::tempdir().expect("tempdir");
        let shp = dir.path().join("world.shp");
        std::fs::write(&shp, b"shapes").expect("write");
        let source = ShapefileSource::new(&shp);
        let without_sidecar = source.fingerprint().expect("fingerprint");

        let dbf = dir.path().join("world.dbf");
        std::fs::write(&dbf, b"FRA").expect("write");
        let first = source.fingerprint().expect("fingerprint");
        assert_ne!(without_sidecar, first);

        std::fs::write(&dbf, b"FRA ESP").expect("write");
        assert_ne!(first, source.fingerprint().expect("fingerprint"));
    }

    #[test]
    fn null_shape_is_empty() {
        let mp = shape_to_multipolygon(&CountryCode::new("TST"), Shape::NullShape).expect("null");
        assert!(mp.0.is_empty());
    }

    #[test]
    fn point_shape_is_rejected() {
        let err = shape_to_multipolygon(&CountryCode::new("TST"), Shape::Point(Point::new(1.0, 2.0)))
            .expect_err("point");
        assert!(matches!(err, HistomapError::Geometry(_)));
    }

    #[test]
    fn missing_file_fails_to_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = ShapefileSource::new(dir.path().join("absent.shp"));
        assert!(matches!(source.load(), Err(HistomapError::Geometry(_))));
        assert!(matches!(source.fingerprint(), Err(HistomapError::Io(_))));
    }

    #[test]
    fn fingerprint_tracks_file_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("world.shp");
        std::fs::write(&path, b"one").expect("write");
        let source = ShapefileSource::new(&path);
        let first = source.fingerprint().expect("fingerprint");
        assert_eq!(first, source.fingerprint().expect("fingerprint"));

        std::fs::write(&path, b"longer content").expect("write");
        assert_ne!(first, source.fingerprint().expect("fingerprint"));
    }

    #[test]
    fn code_field_is_read_and_trimmed() {
        let mut record = Record::default();
        record.insert(
            CODE_FIELD.to_string(),
            FieldValue::Character(Some("FRA ".to_string())),
        );
        assert_eq!(country_code(&record).expect("code").as_str(), "FRA");
    }

    #[test]
    fn missing_code_field_is_an_error() {
        let record = Record::default();
        assert!(matches!(
            country_code(&record),
            Err(HistomapError::Geometry(_))
        ));
    }
}
