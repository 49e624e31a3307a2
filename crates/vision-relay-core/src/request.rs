use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::feature::{default_features, Feature};

/// Aspect ratios the crop-hint feature is asked to fit.
pub const CROP_HINT_ASPECT_RATIOS: [f64; 3] = [0.8, 1.0, 1.2];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Base64-encoded image bytes.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropHintsParams {
    pub aspect_ratios: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContext {
    pub crop_hints_params: CropHintsParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageRequest {
    pub features: Vec<Feature>,
    pub image: Image,
    pub image_context: ImageContext,
}

/// Body of an `images:annotate` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchAnnotateImagesRequest {
    pub requests: Vec<AnnotateImageRequest>,
}

impl BatchAnnotateImagesRequest {
    /// Build the single-image request with the fixed feature set.
    pub fn for_image(bytes: &[u8]) -> Self {
        Self {
            requests: vec![AnnotateImageRequest {
                features: default_features(),
                image: Image {
                    content: B64.encode(bytes),
                },
                image_context: ImageContext {
                    crop_hints_params: CropHintsParams {
                        aspect_ratios: CROP_HINT_ASPECT_RATIOS.to_vec(),
                    },
                },
            }],
        }
    }
}
