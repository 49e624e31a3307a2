mod http;
mod traits;

pub use http::{VisionClient, DEFAULT_ENDPOINT};
pub use traits::{Annotator, ClientError};
