use std::time::Duration;

use async_trait::async_trait;
use geo::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, REFERER},
    Client,
};
use serde::Deserialize;
use url::Url;

use super::Geocoder;
use crate::{
    error::{Error, Result},
    observability::log_debug,
    spatial::{BoundingBox, Region},
};

/// Public OpenStreetMap instance.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/";

/// Connection settings for [`NominatimGeocoder`].
#[derive(Debug, Clone)]
pub struct NominatimOptions {
    pub(crate) url: String,
    pub(crate) user_agent: String,
    pub(crate) referer: Option<String>,
    pub(crate) accept_language: String,
    pub(crate) timeout: Duration,
}

impl Default for NominatimOptions {
    fn default() -> Self {
        NominatimOptions {
            url: DEFAULT_NOMINATIM_URL.to_owned(),
            user_agent: "geoplaces".to_owned(),
            referer: None,
            accept_language: "en".to_owned(),
            timeout: Duration::from_secs(180),
        }
    }
}

impl NominatimOptions {
    /// Base URL of the instance; `search` is appended.
    pub fn url(self, url: impl Into<String>) -> Self {
        NominatimOptions {
            url: url.into(),
            ..self
        }
    }

    /// Sent on every request, as the usage policy requires.
    pub fn user_agent(self, user_agent: impl Into<String>) -> Self {
        NominatimOptions {
            user_agent: user_agent.into(),
            ..self
        }
    }

    /// Optional `Referer` header.
    pub fn referer(self, referer: impl Into<String>) -> Self {
        NominatimOptions {
            referer: Some(referer.into()),
            ..self
        }
    }

    /// Preferred language of returned names.
    pub fn accept_language(self, accept_language: impl Into<String>) -> Self {
        NominatimOptions {
            accept_language: accept_language.into(),
            ..self
        }
    }

    /// Per-request timeout.
    pub fn timeout(self, timeout: Duration) -> Self {
        NominatimOptions { timeout, ..self }
    }
}

/// [`Geocoder`] backed by a Nominatim search endpoint.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    search_url: Url,
}

impl NominatimGeocoder {
    /// Builds the HTTP client; fails on a malformed URL.
    pub fn new(options: NominatimOptions) -> Result<Self> {
        let setup_failed = |reason: String| Error::GeocodingFailed {
            query: options.url.clone(),
            reason,
        };
        let search_url = Url::parse(&options.url)
            .and_then(|base| base.join("search"))
            .map_err(|err| setup_failed(err.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&options.accept_language)
                .map_err(|err| setup_failed(err.to_string()))?,
        );
        if let Some(referer) = &options.referer {
            headers.insert(
                REFERER,
                HeaderValue::from_str(referer).map_err(|err| setup_failed(err.to_string()))?,
            );
        }
        let client = Client::builder()
            .user_agent(options.user_agent.as_str())
            .default_headers(headers)
            .timeout(options.timeout)
            .build()
            .map_err(|err| setup_failed(err.to_string()))?;

        Ok(Self { client, search_url })
    }

    async fn search(&self, query: &str, with_outline: bool) -> Result<SearchHit> {
        log_debug!(
            component = "geocode",
            event = "geocode",
            query = %query,
            outline = with_outline,
        );
        let failed = |reason: String| Error::GeocodingFailed {
            query: query.to_owned(),
            reason,
        };
        let mut params = vec![("q", query), ("format", "json"), ("limit", "1")];
        if with_outline {
            params.push(("polygon_geojson", "1"));
        }
        let hits: Vec<SearchHit> = self
            .client
            .get(self.search_url.clone())
            .query(&params)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| failed(err.to_string()))?
            .json()
            .await
            .map_err(|err| failed(err.to_string()))?;
        hits.into_iter()
            .next()
            .ok_or_else(|| failed("no result".to_owned()))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<Point<f64>> {
        self.search(address, false)
            .await?
            .point()
            .ok_or_else(|| Error::GeocodingFailed {
                query: address.to_owned(),
                reason: "result has no coordinates".to_owned(),
            })
    }

    async fn geocode_to_region(&self, place: &str) -> Result<Region> {
        let hit = self.search(place, true).await?;
        let outline = hit
            .geojson
            .as_ref()
            .and_then(|geojson| serde_json::from_value::<GeoJson>(geojson.clone()).ok())
            .and_then(GeoJson::into_area);
        match outline {
            Some(geometry) => Region::new(geometry),
            None => hit.bounds().map(Region::from).ok_or_else(|| Error::GeocodingFailed {
                query: place.to_owned(),
                reason: "result has neither an outline nor a bounding box".to_owned(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    /// `[south, north, west, east]`.
    #[serde(default)]
    boundingbox: Vec<String>,
    #[serde(default)]
    geojson: Option<serde_json::Value>,
}

impl SearchHit {
    fn point(&self) -> Option<Point<f64>> {
        Some(Point::new(self.lon.parse().ok()?, self.lat.parse().ok()?))
    }

    fn bounds(&self) -> Option<BoundingBox> {
        let [south, north, west, east] = self.boundingbox.as_slice() else {
            return None;
        };
        BoundingBox::new(
            west.parse().ok()?,
            south.parse().ok()?,
            east.parse().ok()?,
            north.parse().ok()?,
        )
        .ok()
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum GeoJson {
    Polygon(Vec<Vec<Vec<f64>>>),
    MultiPolygon(Vec<Vec<Vec<Vec<f64>>>>),
}

impl GeoJson {
    /// Areal outline; `None` when the rings are malformed.
    fn into_area(self) -> Option<Geometry<f64>> {
        match self {
            GeoJson::Polygon(rings) => polygon(rings).map(Geometry::Polygon),
            GeoJson::MultiPolygon(polygons) => polygons
                .into_iter()
                .map(polygon)
                .collect::<Option<Vec<_>>>()
                .map(|polygons| Geometry::MultiPolygon(MultiPolygon::new(polygons))),
        }
    }
}

fn polygon(rings: Vec<Vec<Vec<f64>>>) -> Option<Polygon<f64>> {
    let mut rings = rings.into_iter().map(ring);
    let exterior = rings.next()??;
    let interiors = rings.collect::<Option<Vec<_>>>()?;
    Some(Polygon::new(exterior, interiors))
}

fn ring(positions: Vec<Vec<f64>>) -> Option<LineString<f64>> {
    positions
        .into_iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Some(Coord { x: *x, y: *y }),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
        .map(LineString::new)
}
