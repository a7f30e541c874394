//! Detail routes for facilities.
//!
//! A route carries the site key and facility id in its path and the
//! localized name pair as query parameters:
//! `/sites/abu-dhabi/facilities/ghq?nameEn=General+HQ&nameAr=...`

use crate::{Facility, FacilityId, LocalizedName, SiteError, SiteMap};
use reqwest::Url;
use std::fmt;
use std::str::FromStr;

const ROUTE_BASE: &str = "app://site-map/";
const NAME_EN: &str = "nameEn";
const NAME_AR: &str = "nameAr";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRoute {
    pub site: String,
    pub facility: FacilityId,
    pub name: LocalizedName,
}

impl DetailRoute {
    pub fn for_facility(site: &SiteMap, facility: &Facility) -> Self {
        Self {
            site: site.key.clone(),
            facility: facility.id.clone(),
            name: facility.name.clone(),
        }
    }

    fn to_url(&self) -> Result<Url, SiteError> {
        let invalid = || SiteError::InvalidRoute(self.site.clone());
        let mut url = Url::parse(ROUTE_BASE).map_err(|_| invalid())?;
        url.path_segments_mut().map_err(|_| invalid())?.clear().extend([
            "sites",
            self.site.as_str(),
            "facilities",
            self.facility.as_str(),
        ]);
        url.query_pairs_mut()
            .append_pair(NAME_EN, &self.name.en)
            .append_pair(NAME_AR, &self.name.ar);
        Ok(url)
    }

    /// Resolves this route against an external dashboard base URL.
    pub fn external_url(&self, base: &str) -> Result<Url, SiteError> {
        let base = Url::parse(base).map_err(|err| SiteError::InvalidRoute(err.to_string()))?;
        let route = self.to_string();
        base.join(route.trim_start_matches('/'))
            .map_err(|err| SiteError::InvalidRoute(err.to_string()))
    }
}

impl fmt::Display for DetailRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let url = self.to_url().map_err(|_| fmt::Error)?;
        match url.query() {
            Some(query) => write!(f, "{}?{}", url.path(), query),
            None => f.write_str(url.path()),
        }
    }
}

impl FromStr for DetailRoute {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SiteError::InvalidRoute(s.to_string());

        let base = Url::parse(ROUTE_BASE).map_err(|_| invalid())?;
        let url = base.join(s).map_err(|_| invalid())?;

        let segments: Vec<&str> = url.path_segments().ok_or_else(invalid)?.collect();
        let [sites, site, facilities, facility] = segments.as_slice() else {
            return Err(invalid());
        };
        if *sites != "sites" || *facilities != "facilities" || site.is_empty() || facility.is_empty()
        {
            return Err(invalid());
        }

        let mut en = None;
        let mut ar = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                NAME_EN => en = Some(value.into_owned()),
                NAME_AR => ar = Some(value.into_owned()),
                _ => {}
            }
        }

        Ok(Self {
            site: site.to_string(),
            facility: facility.to_string(),
            name: LocalizedName::new(en.unwrap_or_default(), ar.unwrap_or_default()),
        })
    }
}
