use std::fmt;

use serde::{Deserialize, Serialize};

/// Upper bound on annotations returned per feature.
pub const MAX_RESULTS: u32 = 50;

/// Model pinned for the features that accept one.
pub const LATEST_MODEL: &str = "builtin/latest";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureType {
    LandmarkDetection,
    FaceDetection,
    ObjectLocalization,
    LogoDetection,
    LabelDetection,
    DocumentTextDetection,
    SafeSearchDetection,
    ImageProperties,
    CropHints,
}

impl FeatureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::LandmarkDetection => "LANDMARK_DETECTION",
            FeatureType::FaceDetection => "FACE_DETECTION",
            FeatureType::ObjectLocalization => "OBJECT_LOCALIZATION",
            FeatureType::LogoDetection => "LOGO_DETECTION",
            FeatureType::LabelDetection => "LABEL_DETECTION",
            FeatureType::DocumentTextDetection => "DOCUMENT_TEXT_DETECTION",
            FeatureType::SafeSearchDetection => "SAFE_SEARCH_DETECTION",
            FeatureType::ImageProperties => "IMAGE_PROPERTIES",
            FeatureType::CropHints => "CROP_HINTS",
        }
    }

    /// Whether the annotation API lets the caller pick a model for this feature.
    pub fn takes_model(&self) -> bool {
        matches!(
            self,
            FeatureType::ObjectLocalization
                | FeatureType::LogoDetection
                | FeatureType::DocumentTextDetection
        )
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureType,
    pub max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Feature {
    pub fn new(kind: FeatureType) -> Self {
        Self {
            kind,
            max_results: MAX_RESULTS,
            model: kind.takes_model().then(|| LATEST_MODEL.to_string()),
        }
    }
}

/// The fixed feature set requested for every uploaded image.
pub fn default_features() -> Vec<Feature> {
    [
        FeatureType::LandmarkDetection,
        FeatureType::FaceDetection,
        FeatureType::ObjectLocalization,
        FeatureType::LogoDetection,
        FeatureType::LabelDetection,
        FeatureType::DocumentTextDetection,
        FeatureType::SafeSearchDetection,
        FeatureType::ImageProperties,
        FeatureType::CropHints,
    ]
    .into_iter()
    .map(Feature::new)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_features_cover_all_nine_types() {
        let features = default_features();
        assert_eq!(features.len(), 9);
        assert!(features.iter().all(|f| f.max_results == 50));
        assert_eq!(features[0].kind, FeatureType::LandmarkDetection);
        assert_eq!(features[8].kind, FeatureType::CropHints);
    }

    #[test]
    fn model_only_on_supported_features() {
        for f in default_features() {
            if f.kind.takes_model() {
                assert_eq!(f.model.as_deref(), Some("builtin/latest"), "{}", f.kind);
            } else {
                assert!(f.model.is_none(), "{} should not carry a model", f.kind);
            }
        }
    }

    #[test]
    fn feature_serializes_wire_names() {
        let v = serde_json::to_value(Feature::new(FeatureType::LogoDetection)).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "type": "LOGO_DETECTION",
                "maxResults": 50,
                "model": "builtin/latest"
            })
        );

        let v = serde_json::to_value(Feature::new(FeatureType::SafeSearchDetection)).unwrap();
        assert_eq!(
            v,
            serde_json::json!({ "type": "SAFE_SEARCH_DETECTION", "maxResults": 50 })
        );
    }

    #[test]
    fn as_str_matches_serde() {
        for f in default_features() {
            let v = serde_json::to_value(f.kind).unwrap();
            assert_eq!(v.as_str(), Some(f.kind.as_str()));
        }
    }
}
