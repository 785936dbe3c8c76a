use serde::{Deserialize, Serialize};

use crate::search::loader::RawRow;

/// Read a column from a validated row / 读取已校验行的列
fn column(row: &RawRow, name: &str) -> String {
    row.get(name).cloned().unwrap_or_default()
}

/// project.csv
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub project_name: String,
    pub project_type: String,
    pub project_category: String,
    pub status: String,
    pub possession_date: String,
    pub city_id: String,
}

impl Project {
    pub const COLUMNS: &'static [&'static str] = &[
        "id",
        "projectName",
        "projectType",
        "projectCategory",
        "status",
        "possessionDate",
        "cityId",
    ];

    pub fn from_row(row: &RawRow) -> Self {
        Self {
            id: column(row, "id"),
            project_name: column(row, "projectName"),
            project_type: column(row, "projectType"),
            project_category: column(row, "projectCategory"),
            status: column(row, "status"),
            possession_date: column(row, "possessionDate"),
            city_id: column(row, "cityId"),
        }
    }
}

/// ProjectAddress.csv
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectAddress {
    pub id: String,
    pub project_id: String,
    pub full_address: String,
    pub pincode: String,
    pub landmark: String,
}

impl ProjectAddress {
    pub const COLUMNS: &'static [&'static str] =
        &["id", "projectId", "fullAddress", "pincode", "landmark"];

    pub fn from_row(row: &RawRow) -> Self {
        Self {
            id: column(row, "id"),
            project_id: column(row, "projectId"),
            full_address: column(row, "fullAddress"),
            pincode: column(row, "pincode"),
            landmark: column(row, "landmark"),
        }
    }
}

/// ProjectConfiguration.csv
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfiguration {
    pub id: String,
    pub project_id: String,
    /// Unit type label, e.g. "3BHK" / 户型
    pub unit_type: String,
    pub custom_bhk: String,
}

impl ProjectConfiguration {
    pub const COLUMNS: &'static [&'static str] = &["id", "projectId", "type", "customBHK"];

    pub fn from_row(row: &RawRow) -> Self {
        Self {
            id: column(row, "id"),
            project_id: column(row, "projectId"),
            unit_type: column(row, "type"),
            custom_bhk: column(row, "customBHK"),
        }
    }
}

/// ProjectConfigurationVariant.csv
///
/// Numeric and list columns stay raw here; the joiner owns their coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfigurationVariant {
    pub id: String,
    pub configuration_id: String,
    pub bathrooms: String,
    pub floor_plan_image: String,
    pub carpet_area: String,
    pub price: String,
    pub property_images: String,
    pub about_property: String,
}

impl ProjectConfigurationVariant {
    pub const COLUMNS: &'static [&'static str] = &[
        "id",
        "configurationId",
        "bathrooms",
        "floorPlanImage",
        "carpetArea",
        "price",
        "propertyImages",
        "aboutProperty",
    ];

    pub fn from_row(row: &RawRow) -> Self {
        Self {
            id: column(row, "id"),
            configuration_id: column(row, "configurationId"),
            bathrooms: column(row, "bathrooms"),
            floor_plan_image: column(row, "floorPlanImage"),
            carpet_area: column(row, "carpetArea"),
            price: column(row, "price"),
            property_images: column(row, "propertyImages"),
            about_property: column(row, "aboutProperty"),
        }
    }
}

/// Denormalized, searchable property record / 反规范化的房源记录
///
/// Identity is the variant id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub project_id: String,
    pub project_name: String,
    pub status: String,
    pub possession_date: String,
    pub full_address: String,
    pub pincode: String,
    #[serde(rename = "bhk")]
    pub unit_type: String,
    /// Smallest currency unit / 最小货币单位
    pub price: u64,
    pub bathrooms: u32,
    pub carpet_area: String,
    pub about_property: String,
    pub floor_plan_image: String,
    pub property_images: Vec<String>,
}
