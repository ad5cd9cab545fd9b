//! Static station catalogue.
//!
//! Stations are reference data, never derived from the live feed. The
//! catalogue is a CSV export with columns `id,name,served_routes`, where
//! `served_routes` is a space-separated list of route ids.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    #[serde(with = "routes_list")]
    pub served_routes: Vec<String>,
}

/// Loads the station catalogue from a CSV file at `path`.
pub fn load_catalogue(path: &str) -> Result<Vec<Station>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening station catalogue {path}"))?;

    let mut stations = Vec::new();
    for result in rdr.deserialize() {
        let station: Station =
            result.with_context(|| format!("parsing station catalogue {path}"))?;
        stations.push(station);
    }

    Ok(stations)
}

mod routes_list {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(routes: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&routes.join(" "))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<String>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.split_whitespace().map(str::to_string).collect())
    }
}
