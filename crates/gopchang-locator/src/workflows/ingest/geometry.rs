use geo::{Centroid, Coord, Geometry, MapCoords};
use geojson::JsonObject;
use serde_json::{json, Map, Value};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use super::crs::Crs;
use super::{GeometryError, IngestError};

const CRS_MEMBER: &str = "crs";
const NAME_MEMBER: &str = "name";

/// One district or facility: a `geo` geometry plus its attribute row.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Option<Geometry<f64>>,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Option<Geometry<f64>>, properties: Map<String, Value>) -> Self {
        Self {
            geometry,
            properties,
        }
    }

    /// Property rendered the way a CSV cell would carry it.
    pub fn property_text(&self, key: &str) -> Option<String> {
        value_text(self.properties.get(key)?)
    }

    /// Representative point: the point itself, or the area-weighted centroid.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        let (x, y) = self.geometry.as_ref()?.centroid()?.x_y();
        (x.is_finite() && y.is_finite()).then_some((x, y))
    }

    fn from_geojson(feature: geojson::Feature, origin: &Path) -> Result<Self, GeometryError> {
        let geometry = feature
            .geometry
            .map(|geometry| Geometry::<f64>::try_from(geometry.value))
            .transpose()
            .map_err(|err| GeometryError::Malformed {
                path: origin.to_path_buf(),
                detail: err.to_string(),
            })?;
        Ok(Self::new(geometry, feature.properties.unwrap_or_default()))
    }

    fn to_geojson(&self) -> geojson::Feature {
        geojson::Feature {
            bbox: None,
            geometry: self
                .geometry
                .as_ref()
                .map(|geometry| geojson::Geometry::new(geojson::Value::from(geometry))),
            id: None,
            properties: Some(self.properties.clone()),
            foreign_members: None,
        }
    }
}

/// Text form of a property value. Integral floats lose their fraction, so a
/// key exported as `3110001.0` still matches the CSV key `3110001`.
pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) if number.is_f64() => number.as_f64().map(float_text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        other => Some(other.to_string()),
    }
}

fn float_text(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

/// A named layer of features in one CRS. The legacy `crs` member is honoured
/// on read and written on output so downstream GIS tooling sees the
/// projected system.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    pub name: Option<String>,
    pub crs: Crs,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(name: impl Into<String>, crs: Crs, features: Vec<Feature>) -> Self {
        Self {
            name: Some(name.into()),
            crs,
            features,
        }
    }

    pub fn from_reader<R: Read>(reader: R, origin: &Path) -> Result<Self, IngestError> {
        let document: geojson::FeatureCollection =
            serde_json::from_reader(reader).map_err(|err| GeometryError::Malformed {
                path: origin.to_path_buf(),
                detail: err.to_string(),
            })?;

        let members = document.foreign_members.unwrap_or_default();
        let name = members
            .get(NAME_MEMBER)
            .and_then(Value::as_str)
            .map(str::to_string);
        let crs = declared_crs(members.get(CRS_MEMBER))?;
        let features = document
            .features
            .into_iter()
            .map(|feature| Feature::from_geojson(feature, origin))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name,
            crs,
            features,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file), path)
    }

    pub fn to_crs(mut self, target: Crs) -> Result<Self, GeometryError> {
        if self.crs == target {
            return Ok(self);
        }
        let reprojection = self.crs.reprojection(target)?;
        let project = |coord: Coord<f64>| {
            reprojection
                .apply(coord.x, coord.y)
                .map(|(x, y)| Coord { x, y })
        };
        for feature in &mut self.features {
            if let Some(geometry) = feature.geometry.take() {
                feature.geometry = Some(geometry.try_map_coords(project)?);
            }
        }
        self.crs = target;
        Ok(self)
    }

    fn to_geojson(&self) -> geojson::FeatureCollection {
        let mut members = JsonObject::new();
        if let Some(name) = &self.name {
            members.insert(NAME_MEMBER.to_string(), Value::String(name.clone()));
        }
        members.insert(CRS_MEMBER.to_string(), crs_member(self.crs));
        geojson::FeatureCollection {
            bbox: None,
            features: self.features.iter().map(Feature::to_geojson).collect(),
            foreign_members: Some(members),
        }
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), IngestError> {
        serde_json::to_writer(writer, &self.to_geojson()).map_err(IngestError::Json)
    }

    pub fn persist(&self, path: &Path) -> Result<PathBuf, IngestError> {
        let file = std::fs::File::create(path)?;
        let mut writer = std::io::BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(path.to_path_buf())
    }
}

/// CRS named by the legacy member; RFC 7946 documents without one are WGS84.
fn declared_crs(member: Option<&Value>) -> Result<Crs, GeometryError> {
    match member {
        None | Some(Value::Null) => Ok(Crs::Wgs84),
        Some(member) => {
            let name = member
                .pointer("/properties/name")
                .and_then(Value::as_str)
                .ok_or_else(|| GeometryError::UnsupportedCrs(member.to_string()))?;
            Crs::parse(name)
        }
    }
}

fn crs_member(crs: Crs) -> Value {
    json!({
        "type": "name",
        "properties": { "name": format!("urn:ogc:def:crs:EPSG::{}", crs.epsg()) }
    })
}
