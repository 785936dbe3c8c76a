//! Filter evaluator and result limiter / 条件过滤与结果截断
//!
//! Every criterion is optional; an absent criterion never constrains.
//! Checks run in a fixed order (city, unit type, price, status, locality)
//! and stop at the first mismatch.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::models::Property;

/// Sparse filter criteria, as produced by the query parser / 稀疏过滤条件
///
/// Decoding is per field: a malformed field is dropped and the others are
/// kept, see [`FilterCriteria::from_json_object`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Bedroom count prefix, e.g. "3" / 户型前缀
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_type: Option<String>,
    /// Inclusive price ceiling / 价格上限（含）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_budget: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub possession_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
}

impl FilterCriteria {
    /// True when no criterion constrains the result / 无任何条件
    pub fn is_empty(&self) -> bool {
        NormalizedCriteria::new(self).is_empty()
    }

    /// Lenient decode from a JSON object / 逐字段宽松解析
    ///
    /// Language models emit numbers and strings interchangeably, and
    /// sometimes both `bhk` and `unitType`. The first key that decodes wins;
    /// a field of the wrong shape becomes `None`.
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        Self {
            city: field(object, &["city"], text_value),
            unit_type: field(object, &["unitType", "bhk"], unit_type_value),
            max_budget: field(object, &["maxBudget", "budget"], budget_value),
            possession_status: field(object, &["possessionStatus"], text_value),
            locality: field(object, &["locality"], text_value),
        }
    }
}

impl<'de> Deserialize<'de> for FilterCriteria {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let object = Option::<Map<String, Value>>::deserialize(deserializer)?;
        Ok(object
            .map(|object| Self::from_json_object(&object))
            .unwrap_or_default())
    }
}

fn field<T>(
    object: &Map<String, Value>,
    keys: &[&str],
    decode: fn(&Value) -> Option<T>,
) -> Option<T> {
    keys.iter().find_map(|key| {
        let value = object.get(*key).filter(|v| !v.is_null())?;
        let decoded = decode(value);
        if decoded.is_none() {
            tracing::warn!("Ignoring malformed filter field {}: {}", key, value);
        }
        decoded
    })
}

fn text_value(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn unit_type_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => match n.as_u64() {
            Some(n) => (n > 0).then(|| n.to_string()),
            None => n.as_f64().filter(|f| *f > 0.0).map(|f| {
                if f.fract() == 0.0 {
                    (f as u64).to_string()
                } else {
                    f.to_string()
                }
            }),
        },
        _ => None,
    }
}

fn budget_value(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => s.trim().parse::<u64>().ok().filter(|n| *n > 0),
        Value::Number(n) => match n.as_u64() {
            Some(n) => (n > 0).then_some(n),
            None => n.as_f64().filter(|f| *f >= 1.0).map(|f| f as u64),
        },
        _ => None,
    }
}

/// Criteria after trim + lowercase; blanks dropped / 规范化后的条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedCriteria {
    pub city: Option<String>,
    pub unit_type: Option<String>,
    pub max_budget: Option<u64>,
    pub possession_status: Option<String>,
    pub locality: Option<String>,
}

fn normalize(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
}

impl NormalizedCriteria {
    pub fn new(criteria: &FilterCriteria) -> Self {
        Self {
            city: normalize(&criteria.city),
            unit_type: normalize(&criteria.unit_type),
            max_budget: criteria.max_budget.filter(|b| *b > 0),
            possession_status: normalize(&criteria.possession_status),
            locality: normalize(&criteria.locality),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.city.is_none()
            && self.unit_type.is_none()
            && self.max_budget.is_none()
            && self.possession_status.is_none()
            && self.locality.is_none()
    }

    /// Evaluate one property / 判断单个房源是否匹配
    pub fn matches(&self, property: &Property) -> bool {
        let address = property.full_address.to_lowercase();

        if let Some(city) = &self.city {
            let hit = address.contains(city.as_str());
            tracing::trace!("{} city check: {} ('{}' in '{}')", property.id, hit, city, address);
            if !hit {
                return false;
            }
        }

        if let Some(unit_type) = &self.unit_type {
            let hit = unit_type_matches(&property.unit_type, unit_type);
            tracing::trace!(
                "{} unit type check: {} ('{}' starts with '{}')",
                property.id,
                hit,
                property.unit_type,
                unit_type
            );
            if !hit {
                return false;
            }
        }

        if let Some(max_budget) = self.max_budget {
            let hit = property.price <= max_budget;
            tracing::trace!(
                "{} budget check: {} ({} <= {})",
                property.id,
                hit,
                property.price,
                max_budget
            );
            if !hit {
                return false;
            }
        }

        if let Some(status) = &self.possession_status {
            let hit = property.status.trim().to_lowercase() == *status;
            tracing::trace!(
                "{} status check: {} ('{}' == '{}')",
                property.id,
                hit,
                property.status,
                status
            );
            if !hit {
                return false;
            }
        }

        if let Some(locality) = &self.locality {
            let hit = address.contains(locality.as_str());
            tracing::trace!(
                "{} locality check: {} ('{}' in '{}')",
                property.id,
                hit,
                locality,
                address
            );
            if !hit {
                return false;
            }
        }

        true
    }
}

/// Prefix match on the unit-type label / 户型前缀匹配
///
/// A numeric prefix must end on a digit boundary: "3" accepts "3BHK" and
/// "3 BHK" but not "30BHK".
fn unit_type_matches(label: &str, prefix: &str) -> bool {
    let label = label.trim().to_lowercase();
    match label.strip_prefix(prefix) {
        Some(rest) => {
            let digit_prefix = prefix.ends_with(|c: char| c.is_ascii_digit());
            !(digit_prefix && rest.starts_with(|c: char| c.is_ascii_digit()))
        }
        None => false,
    }
}

/// Properties satisfying every present criterion, in input order / 过滤房源
pub fn filter_properties<'a>(
    criteria: &FilterCriteria,
    properties: &'a [Property],
) -> Vec<&'a Property> {
    let normalized = NormalizedCriteria::new(criteria);
    if normalized.is_empty() {
        return properties.iter().collect();
    }

    properties.iter().filter(|p| normalized.matches(p)).collect()
}

/// First `max` items, no ranking / 截取前 max 条
pub fn limit<T>(items: &[T], max: usize) -> &[T] {
    &items[..items.len().min(max)]
}
