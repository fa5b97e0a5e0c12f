mod descriptors;

use std::sync::OnceLock;

use indexmap::IndexMap;
use serde::Serialize;

use crate::kinds::TransformationKind;
use crate::media::MediaType;

pub use descriptors::default_descriptors;

pub const DEFAULT_IMAGE_FIELD: &str = "image";

/// Whether the submission answers with the result or with a job handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectMode {
    Sync,
    Async,
}

/// One entry of a descriptor's outgoing form, in send order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum FieldSpec {
    /// Copies a named request parameter into `field`.
    Param {
        param: &'static str,
        field: &'static str,
        required: bool,
    },
    /// A fixed marker the endpoint expects on every call.
    Const {
        field: &'static str,
        value: &'static str,
    },
}

impl FieldSpec {
    pub const fn required(param: &'static str, field: &'static str) -> Self {
        Self::Param {
            param,
            field,
            required: true,
        }
    }

    pub const fn optional(param: &'static str, field: &'static str) -> Self {
        Self::Param {
            param,
            field,
            required: false,
        }
    }

    pub const fn constant(field: &'static str, value: &'static str) -> Self {
        Self::Const { field, value }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::Param { field, .. } | Self::Const { field, .. } => *field,
        }
    }
}

/// Where a successful response keeps its result, as a path of object keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", content = "path", rename_all = "snake_case")]
pub enum ResultLocation {
    /// A base64 blob.
    Inline(&'static [&'static str]),
    Remote(&'static [&'static str]),
    /// The first element of a list; elements may be URLs or base64 blobs.
    FirstItem(&'static [&'static str]),
}

impl ResultLocation {
    pub fn path(&self) -> &'static [&'static str] {
        match self {
            Self::Inline(path) | Self::Remote(path) | Self::FirstItem(path) => *path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectDescriptor {
    pub kind: TransformationKind,
    /// Submission path relative to the provider API base.
    pub endpoint: &'static str,
    pub mode: EffectMode,
    /// Form field that carries the caller's primary image.
    pub image_field: &'static str,
    pub fields: &'static [FieldSpec],
    /// For async kinds this is applied to the job-status response.
    pub result: ResultLocation,
    pub media: MediaType,
}

impl EffectDescriptor {
    pub fn is_async(&self) -> bool {
        self.mode == EffectMode::Async
    }

    pub fn endpoint_url(&self, api_base: &str) -> String {
        format!(
            "{}/{}",
            api_base.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone)]
pub struct EffectCatalog {
    effects: IndexMap<TransformationKind, EffectDescriptor>,
}

impl EffectCatalog {
    pub fn new(descriptors: impl IntoIterator<Item = EffectDescriptor>) -> Self {
        Self {
            effects: descriptors
                .into_iter()
                .map(|descriptor| (descriptor.kind, descriptor))
                .collect(),
        }
    }

    /// The process-wide default table, built on first use.
    pub fn shared() -> &'static EffectCatalog {
        static CATALOG: OnceLock<EffectCatalog> = OnceLock::new();
        CATALOG.get_or_init(EffectCatalog::default)
    }

    pub fn get(&self, kind: TransformationKind) -> Option<&EffectDescriptor> {
        self.effects.get(&kind)
    }

    pub fn list(&self) -> impl Iterator<Item = &EffectDescriptor> {
        self.effects.values()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl Default for EffectCatalog {
    fn default() -> Self {
        Self::new(default_descriptors())
    }
}
