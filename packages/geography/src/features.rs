//! Conversion between [`RegionGeometry`] values and `GeoJSON` features.
//!
//! Each feature in the boundaries artifact carries these properties:
//!
//! | property       | type             | required |
//! |----------------|------------------|----------|
//! | `region_id`    | string or number | yes      |
//! | `region_level` | string           | yes      |
//! | `display_name` | string           | yes      |
//! | `parent_name`  | string           | no       |

use std::io::{Read, Write};

use flood_impact_models::RegionLevel;
use geo::MultiPolygon;
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};

use crate::{GeographyError, RegionGeometry};

/// Reads a boundaries `FeatureCollection` from `reader`.
///
/// # Errors
///
/// Returns [`GeographyError`] if reading fails, the document is not a
/// `FeatureCollection`, or any feature is malformed.
pub fn read_region_geometries(mut reader: impl Read) -> Result<Vec<RegionGeometry>, GeographyError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_region_geometries(&text)
}

/// Parses a boundaries `FeatureCollection` document.
///
/// # Errors
///
/// Returns [`GeographyError`] if the document is not a `FeatureCollection`
/// or any feature is malformed.
pub fn parse_region_geometries(text: &str) -> Result<Vec<RegionGeometry>, GeographyError> {
    let GeoJson::FeatureCollection(collection) = text.parse::<GeoJson>()? else {
        return Err(GeographyError::NotFeatureCollection);
    };

    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| feature_to_region(index, feature))
        .collect()
}

/// Writes `regions` as a single `FeatureCollection` document.
///
/// # Errors
///
/// Returns [`GeographyError::Io`] if writing fails.
pub fn write_region_geometries(
    regions: &[RegionGeometry],
    mut writer: impl Write,
) -> Result<(), GeographyError> {
    let document = GeoJson::FeatureCollection(to_feature_collection(regions));
    writer.write_all(document.to_string().as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Builds a `FeatureCollection` with one feature per region.
#[must_use]
pub fn to_feature_collection(regions: &[RegionGeometry]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: regions.iter().map(region_to_feature).collect(),
        foreign_members: None,
    }
}

fn region_to_feature(region: &RegionGeometry) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert(
        "region_id".to_string(),
        JsonValue::from(region.region_id.as_str()),
    );
    properties.insert(
        "region_level".to_string(),
        JsonValue::from(region.region_level.as_ref()),
    );
    properties.insert(
        "display_name".to_string(),
        JsonValue::from(region.display_name.as_str()),
    );
    if let Some(parent) = &region.parent_name {
        properties.insert("parent_name".to_string(), JsonValue::from(parent.as_str()));
    }

    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(&region.polygon))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn feature_to_region(index: usize, feature: Feature) -> Result<RegionGeometry, GeographyError> {
    let region_id = required_property(index, &feature, "region_id")?;
    let region_level = required_property(index, &feature, "region_level")?
        .parse::<RegionLevel>()
        .map_err(|e| GeographyError::InvalidProperty {
            index,
            property: "region_level",
            message: e.to_string(),
        })?;
    let display_name = required_property(index, &feature, "display_name")?;
    let parent_name = string_property(index, &feature, "parent_name")?;

    let polygon = feature
        .geometry
        .and_then(to_multipolygon)
        .ok_or(GeographyError::UnsupportedGeometry { index })?;

    Ok(RegionGeometry {
        region_id,
        region_level,
        polygon,
        display_name,
        parent_name,
    })
}

fn required_property(
    index: usize,
    feature: &Feature,
    property: &'static str,
) -> Result<String, GeographyError> {
    string_property(index, feature, property)?
        .filter(|value| !value.is_empty())
        .ok_or(GeographyError::MissingProperty { index, property })
}

/// Reads a property as a string. Numeric identifiers (GAUL codes are
/// stored as integers upstream) are accepted and printed verbatim.
fn string_property(
    index: usize,
    feature: &Feature,
    property: &'static str,
) -> Result<Option<String>, GeographyError> {
    match feature.property(property) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.clone())),
        Some(JsonValue::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(GeographyError::InvalidProperty {
            index,
            property,
            message: format!("expected a string, found {other}"),
        }),
    }
}

/// Converts a `GeoJSON` geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
#[must_use]
pub fn to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}"#;

    fn collection(features: &[String]) -> String {
        format!(
            r#"{{"type":"FeatureCollection","features":[{}]}}"#,
            features.join(",")
        )
    }

    fn feature(properties: &str, geometry: &str) -> String {
        format!(r#"{{"type":"Feature","properties":{properties},"geometry":{geometry}}}"#)
    }

    #[test]
    fn parses_polygon_and_numeric_ids() {
        let doc = collection(&[
            feature(
                r#"{"region_id":"USA","region_level":"country","display_name":"United States"}"#,
                SQUARE,
            ),
            feature(
                r#"{"region_id":2720,"region_level":"admin1","display_name":"Galicia","parent_name":"Spain"}"#,
                SQUARE,
            ),
        ]);

        let regions = parse_region_geometries(&doc).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].region_id, "USA");
        assert_eq!(regions[0].region_level, RegionLevel::Country);
        assert_eq!(regions[0].polygon.0.len(), 1);
        assert_eq!(regions[1].region_id, "2720");
        assert_eq!(regions[1].parent_name.as_deref(), Some("Spain"));
    }

    #[test]
    fn written_collection_parses_back() {
        let doc = collection(&[feature(
            r#"{"region_id":"Western Africa","region_level":"subregion","display_name":"Western Africa"}"#,
            SQUARE,
        )]);
        let regions = parse_region_geometries(&doc).unwrap();

        let mut out = Vec::new();
        write_region_geometries(&regions, &mut out).unwrap();
        let reparsed = read_region_geometries(out.as_slice()).unwrap();
        assert_eq!(reparsed, regions);
    }

    #[test]
    fn rejects_bare_geometry() {
        assert!(matches!(
            parse_region_geometries(SQUARE),
            Err(GeographyError::NotFeatureCollection)
        ));
    }

    #[test]
    fn rejects_missing_region_id() {
        let doc = collection(&[feature(
            r#"{"region_level":"country","display_name":"Chile"}"#,
            SQUARE,
        )]);
        assert!(matches!(
            parse_region_geometries(&doc),
            Err(GeographyError::MissingProperty {
                index: 0,
                property: "region_id"
            })
        ));
    }

    #[test]
    fn rejects_unknown_level() {
        let doc = collection(&[feature(
            r#"{"region_id":"CHL","region_level":"province","display_name":"Chile"}"#,
            SQUARE,
        )]);
        assert!(matches!(
            parse_region_geometries(&doc),
            Err(GeographyError::InvalidProperty {
                property: "region_level",
                ..
            })
        ));
    }

    #[test]
    fn rejects_point_geometry() {
        let doc = collection(&[feature(
            r#"{"region_id":"CHL","region_level":"country","display_name":"Chile"}"#,
            r#"{"type":"Point","coordinates":[0,0]}"#,
        )]);
        assert!(matches!(
            parse_region_geometries(&doc),
            Err(GeographyError::UnsupportedGeometry { index: 0 })
        ));
    }
}
