use serde::{Deserialize, Serialize};

wire_enum! {
    pub enum CustomFieldType {
        String = 0,
        Long = 1,
        Double = 2,
        DateTime = 3,
        Hierarchy = 4,
        Text = 5,
    }
}

wire_enum! {
    pub enum RoundingType {
        Nearest = 0,
        Floor = 1,
        Ceiling = 2,
    }
}

wire_enum! {
    /// What a category reports: whole-interaction classifications, time
    /// segments, or both.
    pub enum CategoryResultMode {
        None = 0,
        Classifications = 1,
        Segments = 2,
        ClassificationsAndSegments = 3,
    }
}

wire_enum! {
    pub enum CategoryTrackingMode {
        None = 0,
        Hits = 1,
        Misses = 2,
        HitsAndMisses = 3,
    }
}

/// List payload wrapper used by several read endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayResponse<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> Default for ArrayResponse<T> {
    fn default() -> Self {
        Self { results: Vec::new() }
    }
}

impl<T> From<Vec<T>> for ArrayResponse<T> {
    fn from(results: Vec<T>) -> Self {
        Self { results }
    }
}

pub type CategoryInfoArrayResponse = ArrayResponse<CategoryInfoResponse>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub label: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub override_value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradientValue {
    pub value: Option<f64>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradientConfig {
    pub ranges: Vec<GradientValue>,
    pub lower: Option<GradientValue>,
    pub upper: Option<GradientValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreRenderOptions {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub scale: Option<f64>,
    pub precision: Option<i32>,
    pub rounding: Option<RoundingType>,
    pub labels_only: bool,
    pub ranges: Vec<ScoreRange>,
    pub gradient: Option<GradientConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryGroup {
    pub display_name: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryInfoResponse {
    pub key: Option<String>,
    pub category_type: Option<String>,
    pub display_name: Option<String>,
    pub short_name: Option<String>,
    pub description: Option<String>,
    pub render_options: Option<ScoreRenderOptions>,
    pub hidden: bool,
    pub show_in_summary: bool,
    pub show_in_filter: bool,
    pub result_mode: CategoryResultMode,
    pub tracking_mode: CategoryTrackingMode,
    pub is_library: bool,
    pub example_phrases: Vec<String>,
    pub enable_realtime: bool,
    pub participant_options: Option<String>,
    pub groups: Vec<CategoryGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomFieldResponse {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub field_type: CustomFieldType,
    pub high_cardinality: bool,
    pub tags: Vec<String>,
    pub is_deleted: bool,
    pub order: i32,
    pub group_name: Option<String>,
    pub hide_in_filter: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomFieldsResponse {
    pub custom_fields: Vec<CustomFieldResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticipantTypeSummary {
    pub id: Option<String>,
    pub sources: Vec<String>,
    pub is_internal: bool,
    pub ignore_in_analytics: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticipantTypesResponse {
    pub types: Vec<ParticipantTypeSummary>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_categories_response() {
        let categories: CategoryInfoArrayResponse = serde_json::from_value(json!({
            "results": [{
                "key": "greeting",
                "resultMode": "ClassificationsAndSegments",
                "trackingMode": 1,
                "renderOptions": { "min": 0.0, "max": 1.0, "rounding": "Floor" },
                "groups": [{ "id": "g1", "displayName": "Openers" }]
            }]
        }))
        .unwrap();

        let category = &categories.results[0];
        assert_eq!(category.key.as_deref(), Some("greeting"));
        assert_eq!(category.result_mode, CategoryResultMode::ClassificationsAndSegments);
        assert_eq!(category.tracking_mode, CategoryTrackingMode::Hits);
        assert_eq!(
            category.render_options.as_ref().unwrap().rounding,
            Some(RoundingType::Floor)
        );
        assert_eq!(category.groups[0].id.as_deref(), Some("g1"));
    }

    #[test]
    fn test_custom_fields_response() {
        let fields: CustomFieldsResponse = serde_json::from_value(json!({
            "customFields": [
                { "id": "region", "fieldType": "Hierarchy", "tags": ["geo"] },
                { "id": "score", "fieldType": 2 }
            ]
        }))
        .unwrap();
        assert_eq!(fields.custom_fields[0].field_type, CustomFieldType::Hierarchy);
        assert_eq!(fields.custom_fields[1].field_type, CustomFieldType::Double);
        assert_eq!(fields.custom_fields[0].tags, vec!["geo".to_string()]);
    }

    #[test]
    fn test_empty_array_response() {
        let empty: ArrayResponse<CategoryInfoResponse> = serde_json::from_value(json!({})).unwrap();
        assert!(empty.results.is_empty());
    }
}
