//! Data contracts shared by the dispatch engine and its hosts: transformation
//! kinds, typed parameters, the effect catalog and the boundary error shapes.

pub mod catalog;
pub mod errors;
pub mod kinds;
pub mod media;
pub mod params;
pub mod response;

pub use catalog::{EffectCatalog, EffectDescriptor, EffectMode, FieldSpec, ResultLocation};
pub use errors::{ErrorCategory, TransformError, ValidationError};
pub use kinds::TransformationKind;
pub use media::{MediaType, UploadFormat};
pub use params::{ParamValue, TransformationParams};
pub use response::{TransformResponse, TransformedMedia};
