//! Coordinate reference systems used by Seoul commercial-district datasets.
//!
//! The Korean belts share the GRS80 ellipsoid, and WGS84 differs from it by
//! well under a millimetre at this scale, so no datum shift is applied.

use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::GeometryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Crs {
    /// EPSG:4326, geographic lon/lat.
    Wgs84,
    /// EPSG:3857, spherical web mercator.
    WebMercator,
    /// EPSG:5179, Korea 2000 unified coordinate system.
    KoreaUnified,
    /// EPSG:5181, Korea 2000 central belt (false northing 500 000).
    KoreaCentralBelt,
    /// EPSG:5186, Korea 2000 central belt 2010 (false northing 600 000).
    KoreaCentralBelt2010,
}

impl Crs {
    pub fn from_epsg(code: u32) -> Result<Self, GeometryError> {
        match code {
            4326 => Ok(Self::Wgs84),
            3857 => Ok(Self::WebMercator),
            5179 => Ok(Self::KoreaUnified),
            5181 => Ok(Self::KoreaCentralBelt),
            5186 => Ok(Self::KoreaCentralBelt2010),
            other => Err(GeometryError::UnsupportedCrs(other.to_string())),
        }
    }

    /// Parses `EPSG:5186`, `urn:ogc:def:crs:EPSG::5186`, `5186` and the
    /// `CRS84` alias used by RFC 7946 documents.
    pub fn parse(raw: &str) -> Result<Self, GeometryError> {
        let trimmed = raw.trim();
        if trimmed.ends_with("CRS84") {
            return Ok(Self::Wgs84);
        }
        let code = trimmed
            .rsplit(':')
            .next()
            .and_then(|tail| tail.trim().parse::<u32>().ok())
            .ok_or_else(|| GeometryError::UnsupportedCrs(trimmed.to_string()))?;
        Self::from_epsg(code)
    }

    pub const fn epsg(self) -> u32 {
        match self {
            Self::Wgs84 => 4326,
            Self::WebMercator => 3857,
            Self::KoreaUnified => 5179,
            Self::KoreaCentralBelt => 5181,
            Self::KoreaCentralBelt2010 => 5186,
        }
    }

    /// Reprojects a single `[x, y]` pair from `self` into `target`.
    pub fn transform(self, target: Crs, x: f64, y: f64) -> Result<(f64, f64), GeometryError> {
        self.reprojection(target)?.apply(x, y)
    }

    /// Parsed source and target projections, reusable across many vertices.
    pub fn reprojection(self, target: Crs) -> Result<Reprojection, GeometryError> {
        Ok(Reprojection {
            from: self,
            to: target,
            source: self.projection()?,
            target: target.projection()?,
        })
    }

    fn projection(self) -> Result<Proj, GeometryError> {
        Proj::from_proj_string(self.definition())
            .map_err(|err| GeometryError::UnsupportedCrs(format!("{self}: {err}")))
    }

    const fn definition(self) -> &'static str {
        match self {
            Self::Wgs84 => "+proj=longlat +ellps=GRS80",
            Self::WebMercator => {
                "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +nadgrids=@null"
            }
            Self::KoreaUnified => {
                "+proj=tmerc +lat_0=38 +lon_0=127.5 +k=0.9996 +x_0=1000000 +y_0=2000000 +ellps=GRS80 +units=m"
            }
            Self::KoreaCentralBelt => {
                "+proj=tmerc +lat_0=38 +lon_0=127 +k=1 +x_0=200000 +y_0=500000 +ellps=GRS80 +units=m"
            }
            Self::KoreaCentralBelt2010 => {
                "+proj=tmerc +lat_0=38 +lon_0=127 +k=1 +x_0=200000 +y_0=600000 +ellps=GRS80 +units=m"
            }
        }
    }

    const fn is_geographic(self) -> bool {
        matches!(self, Self::Wgs84)
    }
}

/// A `from -> to` pair of parsed projections. Geographic coordinates are
/// degrees on both sides of [`Reprojection::apply`].
pub struct Reprojection {
    from: Crs,
    to: Crs,
    source: Proj,
    target: Proj,
}

impl Reprojection {
    pub fn apply(&self, x: f64, y: f64) -> Result<(f64, f64), GeometryError> {
        let invalid = || GeometryError::InvalidPosition(vec![x, y]);
        if !x.is_finite() || !y.is_finite() {
            return Err(invalid());
        }
        if self.from == self.to {
            return Ok((x, y));
        }

        let mut point = if self.from.is_geographic() {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };
        transform(&self.source, &self.target, &mut point).map_err(|_| invalid())?;

        let (out_x, out_y) = if self.to.is_geographic() {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };
        if out_x.is_finite() && out_y.is_finite() {
            Ok((out_x, out_y))
        } else {
            Err(invalid())
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl TryFrom<u32> for Crs {
    type Error = GeometryError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_epsg(value)
    }
}

impl From<Crs> for u32 {
    fn from(value: Crs) -> Self {
        value.epsg()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_origin_maps_to_false_origin() {
        let (x, y) = Crs::Wgs84
            .transform(Crs::KoreaCentralBelt2010, 127.0, 38.0)
            .expect("projects");
        assert!((x - 200_000.0).abs() < 1e-3, "easting {x}");
        assert!((y - 600_000.0).abs() < 1e-3, "northing {y}");
    }

    #[test]
    fn gangnam_station_survives_projection_and_back() {
        let (lon, lat) = (127.027_6, 37.497_9);
        let (x, y) = Crs::Wgs84
            .transform(Crs::KoreaCentralBelt2010, lon, lat)
            .expect("projects");
        assert!(x > 200_000.0 && x < 205_000.0, "easting {x}");
        assert!(y > 540_000.0 && y < 550_000.0, "northing {y}");

        let (back_lon, back_lat) = Crs::KoreaCentralBelt2010
            .transform(Crs::Wgs84, x, y)
            .expect("unprojects");
        assert!((back_lon - lon).abs() < 1e-7);
        assert!((back_lat - lat).abs() < 1e-7);
    }

    #[test]
    fn belts_differ_only_by_false_northing() {
        let reprojection = Crs::Wgs84
            .reprojection(Crs::KoreaCentralBelt2010)
            .expect("projections parse");
        let (_, north_2010) = reprojection.apply(126.98, 37.56).expect("projects");
        let (_, north_legacy) = Crs::Wgs84
            .transform(Crs::KoreaCentralBelt, 126.98, 37.56)
            .expect("projects");
        assert!((north_2010 - north_legacy - 100_000.0).abs() < 1e-6);
    }

    #[test]
    fn web_mercator_easting_is_linear_in_longitude() {
        let (x, _) = Crs::Wgs84
            .transform(Crs::WebMercator, 127.0, 37.5)
            .expect("projects");
        let expected = 6_378_137.0 * 127.0_f64.to_radians();
        assert!((x - expected).abs() < 1e-3, "easting {x}");
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        assert!(matches!(
            Crs::Wgs84.transform(Crs::KoreaUnified, f64::NAN, 37.5),
            Err(GeometryError::InvalidPosition(_))
        ));
    }

    #[test]
    fn parses_common_crs_spellings() {
        assert_eq!(Crs::parse("EPSG:5186").unwrap(), Crs::KoreaCentralBelt2010);
        assert_eq!(Crs::parse("urn:ogc:def:crs:EPSG::5179").unwrap(), Crs::KoreaUnified);
        assert_eq!(Crs::parse("urn:ogc:def:crs:OGC:1.3:CRS84").unwrap(), Crs::Wgs84);
        assert_eq!(Crs::parse("3857").unwrap(), Crs::WebMercator);
        assert!(matches!(
            Crs::parse("EPSG:2097"),
            Err(GeometryError::UnsupportedCrs(code)) if code == "2097"
        ));
    }
}
