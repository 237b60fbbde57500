// Fixed registry of background tile layers.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a registered basemap. The set is closed: every value of this
/// enum has exactly one descriptor in [`BASEMAPS`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BasemapId {
    #[default]
    Osm,
    CartoLight,
    CartoDark,
    Satellite,
}

impl BasemapId {
    pub const ALL: [BasemapId; 4] = [
        BasemapId::Osm,
        BasemapId::CartoLight,
        BasemapId::CartoDark,
        BasemapId::Satellite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BasemapId::Osm => "osm",
            BasemapId::CartoLight => "carto-light",
            BasemapId::CartoDark => "carto-dark",
            BasemapId::Satellite => "satellite",
        }
    }

    /// Position of this basemap in the registry, also its arena slot.
    pub fn index(&self) -> usize {
        match self {
            BasemapId::Osm => 0,
            BasemapId::CartoLight => 1,
            BasemapId::CartoDark => 2,
            BasemapId::Satellite => 3,
        }
    }

    pub fn descriptor(&self) -> &'static BasemapDescriptor {
        &BASEMAPS[self.index()]
    }
}

impl fmt::Display for BasemapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BasemapId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BasemapId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("Unknown basemap id '{}'", s))
    }
}

// XYZ tile template. `{s}` is replaced by one of `subdomains`.
#[derive(Debug, PartialEq)]
pub struct TileSource {
    pub url_template: &'static str,
    pub subdomains: &'static [&'static str],
    pub max_zoom: u32,
    pub attribution: &'static str,
}

impl TileSource {
    pub fn tile_url(&self, x: u32, y: u32, z: u32) -> String {
        let mut url = self
            .url_template
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string());
        if !self.subdomains.is_empty() {
            // Same tile always maps to the same host so browser caching works
            let pick = ((x as usize) + (y as usize)) % self.subdomains.len();
            url = url.replace("{s}", self.subdomains[pick]);
        }
        url
    }
}

#[derive(Debug, PartialEq)]
pub struct BasemapDescriptor {
    pub id: BasemapId,
    pub name: &'static str,
    pub source: TileSource,
}

const CARTO_SUBDOMAINS: &[&str] = &["a", "b", "c", "d"];
const CARTO_ATTRIBUTION: &str = "© OpenStreetMap contributors © CARTO";

pub static BASEMAPS: [BasemapDescriptor; 4] = [
    BasemapDescriptor {
        id: BasemapId::Osm,
        name: "OpenStreetMap",
        source: TileSource {
            url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
            subdomains: &[],
            max_zoom: 19,
            attribution: "© OpenStreetMap contributors",
        },
    },
    BasemapDescriptor {
        id: BasemapId::CartoLight,
        name: "Carte Claire",
        source: TileSource {
            url_template: "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png",
            subdomains: CARTO_SUBDOMAINS,
            max_zoom: 20,
            attribution: CARTO_ATTRIBUTION,
        },
    },
    BasemapDescriptor {
        id: BasemapId::CartoDark,
        name: "Carte Sombre",
        source: TileSource {
            url_template: "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}.png",
            subdomains: CARTO_SUBDOMAINS,
            max_zoom: 20,
            attribution: CARTO_ATTRIBUTION,
        },
    },
    BasemapDescriptor {
        id: BasemapId::Satellite,
        name: "Satellite",
        source: TileSource {
            url_template: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
            subdomains: &[],
            max_zoom: 19,
            attribution: "Tiles © Esri",
        },
    },
];

/// Entry of the basemap picker shown to the user.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BasemapOption {
    pub id: String,
    pub name: String,
}

pub fn basemap_options() -> Vec<BasemapOption> {
    BASEMAPS
        .iter()
        .map(|b| BasemapOption {
            id: b.id.as_str().to_string(),
            name: b.name.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_slots_match_ids() {
        for id in BasemapId::ALL {
            assert_eq!(id.descriptor().id, id);
        }
    }

    #[test]
    fn parse_round_trips_known_ids_and_rejects_others() {
        assert_eq!("carto-dark".parse::<BasemapId>(), Ok(BasemapId::CartoDark));
        assert_eq!("satellite".parse::<BasemapId>(), Ok(BasemapId::Satellite));
        assert!("stamen".parse::<BasemapId>().is_err());
    }

    #[test]
    fn options_keep_registry_order() {
        let ids: Vec<String> = basemap_options().into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec!["osm", "carto-light", "carto-dark", "satellite"]);
    }

    #[test]
    fn tile_urls_expand_templates() {
        let osm = BasemapId::Osm.descriptor();
        assert_eq!(
            osm.source.tile_url(3, 5, 4),
            "https://tile.openstreetmap.org/4/3/5.png"
        );

        // ArcGIS uses z/y/x ordering
        let sat = BasemapId::Satellite.descriptor();
        assert!(sat.source.tile_url(3, 5, 4).ends_with("/tile/4/5/3"));

        let light = BasemapId::CartoLight.descriptor();
        let url = light.source.tile_url(1, 2, 3);
        assert_eq!(url, "https://d.basemaps.cartocdn.com/light_all/3/1/2.png");
        assert_eq!(url, light.source.tile_url(1, 2, 3));
    }

    #[test]
    fn serde_uses_kebab_case_ids() {
        let json = serde_json::to_string(&BasemapId::CartoLight).unwrap();
        assert_eq!(json, "\"carto-light\"");
        assert!(serde_json::from_str::<BasemapId>("\"nope\"").is_err());
    }
}
