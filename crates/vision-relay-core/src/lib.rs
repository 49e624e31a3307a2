pub mod error;
pub mod feature;
pub mod request;
pub mod response;

pub use error::RelayError;
pub use feature::{default_features, Feature, FeatureType};
pub use request::{AnnotateImageRequest, BatchAnnotateImagesRequest};
pub use response::{upstream_error, UpstreamError};
