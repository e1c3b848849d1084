//! Raw boundary sources: admin-1 units, countries, and the UN M49 table
//! that groups countries into subregions.

use std::collections::BTreeMap;
use std::io::Read;

use flood_impact_geography::features::to_multipolygon;
use flood_impact_geography::simplify::simplify_multipolygon;
use geo::MultiPolygon;
use geojson::GeoJson;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::PreprocessError;
use crate::events::normalize_code;

/// Admin-1 code property of the GAUL boundaries.
pub const ADMIN1_CODE_PROPERTY: &str = "ADM1_CODE";

/// ISO alpha-3 property of the country boundaries.
pub const COUNTRY_CODE_PROPERTY: &str = "ISO_A3";

/// Antarctica has no flood records and dwarfs everything on the map.
pub const ANTARCTICA_ISO: &str = "ATA";

/// Polygons keyed by region id.
pub type PolygonIndex = BTreeMap<String, MultiPolygon<f64>>;

/// Reads a `FeatureCollection`, keying each simplified polygon by the
/// `key_property` of its feature.
///
/// Features sharing a key are merged into one multipolygon. Features
/// without a key or a polygonal geometry are skipped.
///
/// # Errors
///
/// Returns [`PreprocessError`] if reading fails or the document is not a
/// `FeatureCollection`.
pub fn read_keyed_polygons(
    mut reader: impl Read,
    key_property: &str,
    tolerance: f64,
) -> Result<PolygonIndex, PreprocessError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let GeoJson::FeatureCollection(collection) = text.parse::<GeoJson>()? else {
        return Err(PreprocessError::NotFeatureCollection);
    };

    let mut index = PolygonIndex::new();
    let mut skipped = 0_usize;

    for feature in collection.features {
        let key = match feature.property(key_property) {
            Some(JsonValue::String(s)) => Some(normalize_code(s)),
            Some(JsonValue::Number(n)) => Some(normalize_code(&n.to_string())),
            _ => None,
        }
        .filter(|key| !key.is_empty());

        let polygon = feature.geometry.and_then(to_multipolygon);

        let (Some(key), Some(polygon)) = (key, polygon) else {
            skipped += 1;
            continue;
        };

        let simplified = simplify_multipolygon(&polygon, tolerance);
        index
            .entry(key)
            .or_insert_with(|| MultiPolygon(Vec::new()))
            .0
            .extend(simplified.0);
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} features without a {key_property} or polygon geometry");
    }
    log::debug!("Read {} {key_property} boundaries", index.len());

    Ok(index)
}

/// Reads the admin-1 boundaries, keyed by GAUL code.
///
/// # Errors
///
/// See [`read_keyed_polygons`].
pub fn read_admin1_boundaries(
    reader: impl Read,
    tolerance: f64,
) -> Result<PolygonIndex, PreprocessError> {
    read_keyed_polygons(reader, ADMIN1_CODE_PROPERTY, tolerance)
}

/// Reads the country boundaries, keyed by ISO alpha-3 code, without
/// Antarctica.
///
/// # Errors
///
/// See [`read_keyed_polygons`].
pub fn read_country_boundaries(
    reader: impl Read,
    tolerance: f64,
) -> Result<PolygonIndex, PreprocessError> {
    let mut countries = read_keyed_polygons(reader, COUNTRY_CODE_PROPERTY, tolerance)?;
    countries.remove(ANTARCTICA_ISO);
    Ok(countries)
}

#[derive(Debug, Deserialize)]
struct M49Row {
    #[serde(rename = "ISO-alpha3 Code", default)]
    iso: Option<String>,
    #[serde(rename = "Sub-region Name", default)]
    subregion: Option<String>,
}

/// Reads the UN M49 table into member ISO codes per subregion name.
///
/// Rows without a subregion (Antarctica among them) are skipped.
///
/// # Errors
///
/// Returns [`PreprocessError::M49`] if a row cannot be parsed.
pub fn read_subregion_members(
    reader: impl Read,
) -> Result<BTreeMap<String, Vec<String>>, PreprocessError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut members: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for row in csv_reader.deserialize::<M49Row>() {
        let row = row.map_err(|e| PreprocessError::M49 {
            line: e.position().map(csv::Position::line),
            message: e.to_string(),
        })?;

        let (Some(iso), Some(subregion)) = (row.iso, row.subregion) else {
            continue;
        };
        if iso.is_empty() || subregion.is_empty() || iso == ANTARCTICA_ISO {
            continue;
        }
        members.entry(subregion).or_default().push(iso);
    }

    Ok(members)
}

/// Builds one multipolygon per subregion from its member countries.
///
/// Members without a country boundary are left out; subregions with no
/// boundary at all are omitted.
#[must_use]
pub fn subregion_boundaries(
    members: &BTreeMap<String, Vec<String>>,
    countries: &PolygonIndex,
) -> PolygonIndex {
    members
        .iter()
        .filter_map(|(subregion, isos)| {
            let polygons: Vec<_> = isos
                .iter()
                .filter_map(|iso| countries.get(iso))
                .flat_map(|country| country.0.iter().cloned())
                .collect();
            if polygons.is_empty() {
                None
            } else {
                Some((subregion.clone(), MultiPolygon(polygons)))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64) -> String {
        format!(
            r#"{{"type":"Polygon","coordinates":[[[{x},{y}],[{x1},{y}],[{x1},{y1}],[{x},{y1}],[{x},{y}]]]}}"#,
            x1 = x + 1.0,
            y1 = y + 1.0
        )
    }

    fn collection(features: &[(&str, String)]) -> String {
        let features: Vec<String> = features
            .iter()
            .map(|(properties, geometry)| {
                format!(r#"{{"type":"Feature","properties":{properties},"geometry":{geometry}}}"#)
            })
            .collect();
        format!(
            r#"{{"type":"FeatureCollection","features":[{}]}}"#,
            features.join(",")
        )
    }

    #[test]
    fn keys_admin1_by_numeric_code() {
        let doc = collection(&[
            (r#"{"ADM1_CODE":2720}"#, square(0.0, 0.0)),
            (r#"{"ADM1_CODE":2721.0}"#, square(2.0, 0.0)),
        ]);

        let index = read_admin1_boundaries(doc.as_bytes(), 0.1).unwrap();
        assert_eq!(
            index.keys().cloned().collect::<Vec<_>>(),
            vec!["2720".to_string(), "2721".to_string()]
        );
    }

    #[test]
    fn merges_features_sharing_a_key() {
        let doc = collection(&[
            (r#"{"ISO_A3":"ESP"}"#, square(0.0, 0.0)),
            (r#"{"ISO_A3":"ESP"}"#, square(5.0, 5.0)),
        ]);

        let index = read_country_boundaries(doc.as_bytes(), 0.0).unwrap();
        assert_eq!(index["ESP"].0.len(), 2);
    }

    #[test]
    fn drops_antarctica_and_unkeyed_features() {
        let doc = collection(&[
            (r#"{"ISO_A3":"ATA"}"#, square(0.0, -80.0)),
            (r#"{"NAME":"Nowhere"}"#, square(0.0, 0.0)),
            (r#"{"ISO_A3":"PRT"}"#, "null".to_string()),
            (r#"{"ISO_A3":"ESP"}"#, square(0.0, 0.0)),
        ]);

        let index = read_country_boundaries(doc.as_bytes(), 0.0).unwrap();
        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["ESP"]);
    }

    #[test]
    fn rejects_non_collection() {
        assert!(matches!(
            read_country_boundaries(square(0.0, 0.0).as_bytes(), 0.1),
            Err(PreprocessError::NotFeatureCollection)
        ));
    }

    #[test]
    fn groups_countries_into_subregions() {
        let m49 = "Region Name,Sub-region Name,ISO-alpha3 Code\n\
                   Europe,Southern Europe,ESP\n\
                   Europe,Southern Europe,PRT\n\
                   ,,ATA\n\
                   Americas,Northern America,USA\n";
        let members = read_subregion_members(m49.as_bytes()).unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members["Southern Europe"], vec!["ESP", "PRT"]);

        let countries = read_country_boundaries(
            collection(&[
                (r#"{"ISO_A3":"ESP"}"#, square(0.0, 0.0)),
                (r#"{"ISO_A3":"PRT"}"#, square(-2.0, 0.0)),
            ])
            .as_bytes(),
            0.0,
        )
        .unwrap();

        let subregions = subregion_boundaries(&members, &countries);
        assert_eq!(subregions.len(), 1);
        assert_eq!(subregions["Southern Europe"].0.len(), 2);
    }
}
