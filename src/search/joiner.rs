//! Entity joiner / 实体合并
//!
//! Variant -> configuration -> project -> address. Any link that does not
//! resolve drops the variant; it is counted, never raised.

use std::collections::HashMap;

use serde::Serialize;

use super::loader::RawRow;
use crate::models::{
    Project, ProjectAddress, ProjectConfiguration, ProjectConfigurationVariant, Property,
};

/// Raw rows of the four tables / 四张表的原始行
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    pub projects: Vec<RawRow>,
    pub addresses: Vec<RawRow>,
    pub configurations: Vec<RawRow>,
    pub variants: Vec<RawRow>,
}

/// Data-quality counters for one merge / 合并数据质量统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinReport {
    pub variants_seen: usize,
    pub properties: usize,
    pub missing_configuration: usize,
    pub missing_project: usize,
    pub missing_address: usize,
    /// Numeric fields that fell back to zero / 回退为0的数值字段
    pub coerced_numbers: usize,
    /// Image lists that failed to parse and were emptied / 解析失败的图片列表
    pub malformed_images: usize,
}

impl JoinReport {
    /// Variants dropped because a link did not resolve / 因外键缺失被丢弃的数量
    pub fn skipped(&self) -> usize {
        self.missing_configuration + self.missing_project + self.missing_address
    }
}

#[derive(Debug, Clone, Default)]
pub struct JoinOutcome {
    pub properties: Vec<Property>,
    pub report: JoinReport,
}

/// Type the raw rows and merge them / 转换原始行并合并
pub fn join_rows(tables: &RawTables) -> JoinOutcome {
    let projects: Vec<Project> = tables.projects.iter().map(Project::from_row).collect();
    let addresses: Vec<ProjectAddress> =
        tables.addresses.iter().map(ProjectAddress::from_row).collect();
    let configurations: Vec<ProjectConfiguration> = tables
        .configurations
        .iter()
        .map(ProjectConfiguration::from_row)
        .collect();
    let variants: Vec<ProjectConfigurationVariant> = tables
        .variants
        .iter()
        .map(ProjectConfigurationVariant::from_row)
        .collect();

    join(&projects, &addresses, &configurations, &variants)
}

/// Merge the four tables into properties, in variant order / 按变体顺序合并
pub fn join(
    projects: &[Project],
    addresses: &[ProjectAddress],
    configurations: &[ProjectConfiguration],
    variants: &[ProjectConfigurationVariant],
) -> JoinOutcome {
    // Later rows overwrite earlier ones on duplicate keys / 重复键后者覆盖前者
    let project_map: HashMap<&str, &Project> =
        projects.iter().map(|p| (p.id.as_str(), p)).collect();
    let address_map: HashMap<&str, &ProjectAddress> =
        addresses.iter().map(|a| (a.project_id.as_str(), a)).collect();
    let config_map: HashMap<&str, &ProjectConfiguration> =
        configurations.iter().map(|c| (c.id.as_str(), c)).collect();

    let mut report = JoinReport {
        variants_seen: variants.len(),
        ..Default::default()
    };
    let mut properties = Vec::with_capacity(variants.len());

    for variant in variants {
        let Some(config) = config_map.get(variant.configuration_id.as_str()) else {
            report.missing_configuration += 1;
            continue;
        };
        let Some(project) = project_map.get(config.project_id.as_str()) else {
            report.missing_project += 1;
            continue;
        };
        let Some(address) = address_map.get(config.project_id.as_str()) else {
            report.missing_address += 1;
            continue;
        };

        let price = parse_leading_int(&variant.price).unwrap_or_else(|| {
            report.coerced_numbers += 1;
            0
        });
        let bathrooms = parse_leading_int(&variant.bathrooms)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or_else(|| {
                report.coerced_numbers += 1;
                0
            });
        let property_images = parse_images(&variant.id, &variant.property_images, &mut report);

        properties.push(Property {
            id: variant.id.clone(),
            project_id: project.id.clone(),
            project_name: project.project_name.clone(),
            status: project.status.clone(),
            possession_date: project.possession_date.clone(),
            full_address: address.full_address.clone(),
            pincode: address.pincode.clone(),
            unit_type: config.unit_type.clone(),
            price,
            bathrooms,
            carpet_area: variant.carpet_area.clone(),
            about_property: variant.about_property.clone(),
            floor_plan_image: variant.floor_plan_image.clone(),
            property_images,
        });
    }

    report.properties = properties.len();

    tracing::info!(
        "Merged {} properties from {} variants",
        report.properties,
        report.variants_seen
    );
    if report.skipped() > 0 {
        tracing::warn!(
            "Skipped {} orphan variants (configuration: {}, project: {}, address: {})",
            report.skipped(),
            report.missing_configuration,
            report.missing_project,
            report.missing_address
        );
    }

    JoinOutcome { properties, report }
}

/// Parse the leading integer of a text field / 解析前导整数
///
/// Leading whitespace and a `+` sign are accepted, then the longest run of
/// ASCII digits is taken: "1200000.50" -> 1200000. No digits, a minus sign,
/// or overflow -> None.
pub fn parse_leading_int(text: &str) -> Option<u64> {
    let text = text.trim_start();
    let text = text.strip_prefix('+').unwrap_or(text);
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    text[..end].parse().ok()
}

fn parse_images(variant_id: &str, raw: &str, report: &mut JoinReport) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(images) => images,
        Err(e) => {
            report.malformed_images += 1;
            tracing::warn!("Variant {} has a malformed image list, using none: {}", variant_id, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: &str, status: &str) -> Project {
        Project {
            id: id.to_string(),
            project_name: format!("Project {}", id),
            project_type: "Residential".to_string(),
            project_category: "Apartment".to_string(),
            status: status.to_string(),
            possession_date: "2026-03-01".to_string(),
            city_id: "1".to_string(),
        }
    }

    fn address(id: &str, project_id: &str, full_address: &str) -> ProjectAddress {
        ProjectAddress {
            id: id.to_string(),
            project_id: project_id.to_string(),
            full_address: full_address.to_string(),
            pincode: "411045".to_string(),
            landmark: String::new(),
        }
    }

    fn config(id: &str, project_id: &str, unit_type: &str) -> ProjectConfiguration {
        ProjectConfiguration {
            id: id.to_string(),
            project_id: project_id.to_string(),
            unit_type: unit_type.to_string(),
            custom_bhk: String::new(),
        }
    }

    fn variant(id: &str, configuration_id: &str, price: &str) -> ProjectConfigurationVariant {
        ProjectConfigurationVariant {
            id: id.to_string(),
            configuration_id: configuration_id.to_string(),
            bathrooms: "2".to_string(),
            floor_plan_image: "plan.png".to_string(),
            carpet_area: "1100 sqft".to_string(),
            price: price.to_string(),
            property_images: r#"["a.jpg","b.jpg"]"#.to_string(),
            about_property: "Corner unit".to_string(),
        }
    }

    #[test]
    fn test_join_resolves_every_link() {
        let outcome = join(
            &[project("p1", "Ready")],
            &[address("a1", "p1", "Baner, Pune")],
            &[config("c1", "p1", "3BHK")],
            &[variant("v1", "c1", "1200000")],
        );

        assert_eq!(outcome.properties.len(), 1);
        let p = &outcome.properties[0];
        assert_eq!(p.id, "v1");
        assert_eq!(p.project_id, "p1");
        assert_eq!(p.project_name, "Project p1");
        assert_eq!(p.status, "Ready");
        assert_eq!(p.full_address, "Baner, Pune");
        assert_eq!(p.pincode, "411045");
        assert_eq!(p.unit_type, "3BHK");
        assert_eq!(p.price, 1_200_000);
        assert_eq!(p.bathrooms, 2);
        assert_eq!(p.carpet_area, "1100 sqft");
        assert_eq!(p.property_images, vec!["a.jpg", "b.jpg"]);
        assert_eq!(outcome.report.skipped(), 0);
    }

    #[test]
    fn test_orphans_are_dropped_and_counted() {
        let projects = [project("p1", "Ready"), project("p2", "Ready")];
        // p2 has no address
        let addresses = [address("a1", "p1", "Baner, Pune")];
        let configs = [
            config("c1", "p1", "3BHK"),
            config("c2", "p2", "2BHK"),
            config("c3", "p9", "1BHK"),
        ];
        let variants = [
            variant("v1", "c1", "100"),
            variant("v2", "c2", "100"),
            variant("v3", "c3", "100"),
            variant("v4", "c404", "100"),
            variant("v5", "c1", "200"),
        ];

        let outcome = join(&projects, &addresses, &configs, &variants);
        let ids: Vec<&str> = outcome.properties.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["v1", "v5"]);
        assert_eq!(outcome.report.variants_seen, 5);
        assert_eq!(outcome.report.properties, 2);
        assert_eq!(outcome.report.missing_configuration, 1);
        assert_eq!(outcome.report.missing_project, 1);
        assert_eq!(outcome.report.missing_address, 1);
        assert_eq!(outcome.report.skipped(), 3);
    }

    #[test]
    fn test_duplicate_keys_last_write_wins() {
        let outcome = join(
            &[project("p1", "Ready"), project("p1", "Under Construction")],
            &[address("a1", "p1", "Old Road, Pune"), address("a2", "p1", "New Road, Pune")],
            &[config("c1", "p1", "2BHK"), config("c1", "p1", "3BHK")],
            &[variant("v1", "c1", "100")],
        );

        let p = &outcome.properties[0];
        assert_eq!(p.status, "Under Construction");
        assert_eq!(p.full_address, "New Road, Pune");
        assert_eq!(p.unit_type, "3BHK");
    }

    #[test]
    fn test_price_coercion() {
        let outcome = join(
            &[project("p1", "Ready")],
            &[address("a1", "p1", "Pune")],
            &[config("c1", "p1", "3BHK")],
            &[
                variant("v1", "c1", "1200000"),
                variant("v2", "c1", "abc"),
                variant("v3", "c1", ""),
                variant("v4", "c1", "-5"),
            ],
        );

        let prices: Vec<u64> = outcome.properties.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![1_200_000, 0, 0, 0]);
        assert_eq!(outcome.report.coerced_numbers, 3);
        assert_eq!(outcome.properties.len(), 4);
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("1200000"), Some(1_200_000));
        assert_eq!(parse_leading_int("  42"), Some(42));
        assert_eq!(parse_leading_int("+7"), Some(7));
        assert_eq!(parse_leading_int("1200000.50"), Some(1_200_000));
        assert_eq!(parse_leading_int("3 baths"), Some(3));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-5"), None);
        assert_eq!(parse_leading_int("99999999999999999999999"), None);
    }

    #[test]
    fn test_image_list_fallback() {
        let mut empty = variant("v1", "c1", "1");
        empty.property_images = String::new();
        let mut broken = variant("v2", "c1", "1");
        broken.property_images = "[not json".to_string();

        let outcome = join(
            &[project("p1", "Ready")],
            &[address("a1", "p1", "Pune")],
            &[config("c1", "p1", "3BHK")],
            &[empty, broken],
        );

        assert_eq!(outcome.properties.len(), 2);
        assert!(outcome.properties[0].property_images.is_empty());
        assert!(outcome.properties[1].property_images.is_empty());
        assert_eq!(outcome.report.malformed_images, 1);
    }

    #[test]
    fn test_join_rows_from_raw_tables() {
        fn row(pairs: &[(&str, &str)]) -> RawRow {
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
        }

        let tables = RawTables {
            projects: vec![row(&[
                ("id", "p1"),
                ("projectName", "Skyline"),
                ("status", "Ready"),
            ])],
            addresses: vec![row(&[
                ("id", "a1"),
                ("projectId", "p1"),
                ("fullAddress", "Wakad, Pune"),
            ])],
            configurations: vec![row(&[("id", "c1"), ("projectId", "p1"), ("type", "2BHK")])],
            variants: vec![row(&[
                ("id", "v1"),
                ("configurationId", "c1"),
                ("price", "5000000"),
                ("bathrooms", "2"),
            ])],
        };

        let outcome = join_rows(&tables);
        assert_eq!(outcome.properties.len(), 1);
        assert_eq!(outcome.properties[0].project_name, "Skyline");
        assert_eq!(outcome.properties[0].price, 5_000_000);
        assert!(outcome.properties[0].property_images.is_empty());
    }
}
