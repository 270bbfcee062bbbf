//! Item type → collection → family classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hub family of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HubFamily {
    App,
    Content,
    Dataset,
    Document,
    Event,
    Feedback,
    Initiative,
    InitiativeTemplate,
    Map,
    Project,
    Site,
    Template,
    Discussion,
    Team,
    People,
}

impl HubFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            HubFamily::App => "app",
            HubFamily::Content => "content",
            HubFamily::Dataset => "dataset",
            HubFamily::Document => "document",
            HubFamily::Event => "event",
            HubFamily::Feedback => "feedback",
            HubFamily::Initiative => "initiative",
            HubFamily::InitiativeTemplate => "initiativeTemplate",
            HubFamily::Map => "map",
            HubFamily::Project => "project",
            HubFamily::Site => "site",
            HubFamily::Template => "template",
            HubFamily::Discussion => "discussion",
            HubFamily::Team => "team",
            HubFamily::People => "people",
        }
    }

    /// Family for a collection name. `other` maps to content and `solution`
    /// to template.
    pub fn from_collection(collection: &str) -> Self {
        match collection {
            "other" => HubFamily::Content,
            "solution" => HubFamily::Template,
            name => name.parse().unwrap_or(HubFamily::Content),
        }
    }
}

impl fmt::Display for HubFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HubFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| format!("Unknown family: {}", s))
    }
}

/// Ordered collection table. The first collection listing a type wins.
const COLLECTIONS: &[(&str, &[&str])] = &[
    (
        "app",
        &[
            "Application",
            "Dashboard",
            "Insights Model",
            "Insights Page",
            "Insights Theme",
            "Insights Workbook",
            "Insights Workbook Package",
            "Mobile Application",
            "Native Application",
            "Notebook",
            "Operation View",
            "StoryMap",
            "Web AppBuilder Widget",
            "Web Experience",
            "Web Experience Template",
            "Web Mapping Application",
            "Workforce Project",
        ],
    ),
    (
        "dataset",
        &[
            "CSV Collection",
            "CSV",
            "Feature Collection",
            "Feature Layer",
            "Feature Service",
            "File Geodatabase",
            "GeoJSON",
            "GeoJson",
            "GeoPackage",
            "Geocoding Service",
            "Geoprocessing Service",
            "Image Layer",
            "KML Collection",
            "KML",
            "Map Service Layer",
            "Microsoft Excel",
            "Relational Database Connection",
            "Shapefile",
            "Table",
            "WFS",
        ],
    ),
    (
        "document",
        &[
            "CAD Drawing",
            "Document Link",
            "Hub Page",
            "Image",
            "iWork Keynote",
            "iWork Numbers",
            "iWork Pages",
            "Microsoft Powerpoint",
            "Microsoft Visio",
            "Microsoft Word",
            "PDF",
            "Pro Report",
            "Report Template",
            "Site Page",
        ],
    ),
    ("event", &["Hub Event"]),
    ("feedback", &["Form", "Quick Capture Project"]),
    ("initiative", &["Hub Initiative"]),
    ("initiativeTemplate", &["Hub Initiative Template"]),
    (
        "map",
        &[
            "City Engine Web Scene",
            "CityEngine Web Scene",
            "Image Collection",
            "Image Service",
            "Map Service",
            "Raster Layer",
            "Scene Layer",
            "Scene Service",
            "Vector Tile Service",
            "Web Map",
            "Web Scene",
            "WMS",
            "WMTS",
        ],
    ),
    ("project", &["Hub Project"]),
    ("site", &["Hub Site Application", "Site Application"]),
    ("discussion", &["Discussion"]),
    ("solution", &["Solution"]),
    (
        "other",
        &[
            "360 VR Experience",
            "Code Attachment",
            "Code Sample",
            "Desktop Style",
            "Feature Collection Template",
            "Layer Package",
            "Mission",
            "Ortho Mapping Project",
            "Style",
            "Tile Package",
            "Vector Tile Package",
        ],
    ),
];

/// Collection containing an item type, compared case-insensitively.
pub fn get_collection(item_type: &str) -> Option<&'static str> {
    COLLECTIONS
        .iter()
        .find(|(_, types)| types.iter().any(|t| t.eq_ignore_ascii_case(item_type)))
        .map(|(collection, _)| *collection)
}

/// Hub family for an item type, applying per-type overrides before the
/// collection table. Unknown types fall back to `content`.
pub fn get_family(item_type: &str) -> HubFamily {
    match item_type.to_lowercase().as_str() {
        "image service" => HubFamily::Dataset,
        "feature service" | "raster layer" => HubFamily::Map,
        "microsoft excel" => HubFamily::Document,
        "cad drawing" | "feature collection template" | "report template" => HubFamily::Content,
        _ => get_collection(item_type)
            .map(HubFamily::from_collection)
            .unwrap_or(HubFamily::Content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_lookup_is_case_insensitive() {
        assert_eq!(get_collection("web map"), Some("map"));
        assert_eq!(get_collection("Feature Layer"), Some("dataset"));
        assert_eq!(get_collection("Unknown Thing"), None);
    }

    #[test]
    fn test_family_overrides() {
        assert_eq!(get_family("Image Service"), HubFamily::Dataset);
        assert_eq!(get_family("Feature Service"), HubFamily::Map);
        assert_eq!(get_family("Raster Layer"), HubFamily::Map);
        assert_eq!(get_family("Microsoft Excel"), HubFamily::Document);
        assert_eq!(get_family("CAD Drawing"), HubFamily::Content);
        assert_eq!(get_family("Report Template"), HubFamily::Content);
    }

    #[test]
    fn test_family_from_collection() {
        assert_eq!(get_family("Web Mapping Application"), HubFamily::App);
        assert_eq!(get_family("Solution"), HubFamily::Template);
        assert_eq!(get_family("Tile Package"), HubFamily::Content);
        assert_eq!(get_family("Hub Project"), HubFamily::Project);
        assert_eq!(get_family("Hub Initiative Template"), HubFamily::InitiativeTemplate);
        assert_eq!(get_family(""), HubFamily::Content);
    }

    #[test]
    fn test_family_serde() {
        assert_eq!(
            serde_json::to_value(HubFamily::InitiativeTemplate).unwrap(),
            serde_json::json!("initiativeTemplate")
        );
        assert_eq!("team".parse::<HubFamily>().unwrap(), HubFamily::Team);
    }
}
