use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::errors::ValidationError;
use crate::kinds::TransformationKind;
use crate::media::sniff_image;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Expression {
    Laugh,
    Pout,
    Sad,
    Smile,
    OpenEyes,
}

impl Expression {
    pub fn service_choice(self) -> u16 {
        match self {
            Self::Laugh => 10,
            Self::Pout => 11,
            Self::Sad => 12,
            Self::Smile => 13,
            Self::OpenEyes => 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClothesType {
    UpperBody,
    LowerBody,
    FullBody,
}

impl ClothesType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UpperBody => "upper_body",
            Self::LowerBody => "lower_body",
            Self::FullBody => "full_body",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartoonStyle {
    #[serde(rename = "anime")]
    Anime,
    #[serde(rename = "3d_cartoon")]
    ThreeDCartoon,
    #[serde(rename = "handdrawn")]
    HandDrawn,
    #[serde(rename = "sketch")]
    Sketch,
    #[serde(rename = "artstyle")]
    ArtStyle,
}

impl CartoonStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anime => "anime",
            Self::ThreeDCartoon => "3d_cartoon",
            Self::HandDrawn => "handdrawn",
            Self::Sketch => "sketch",
            Self::ArtStyle => "artstyle",
        }
    }
}

/// Kind-specific inputs. Each variant carries exactly what its kind needs;
/// image-valued fields travel as base64 (optionally `data:` prefixed) in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "kebab-case")]
pub enum TransformationParams {
    Age {
        target_age: u8,
    },
    GenderSwap {
        target: Gender,
    },
    FaceBeauty {
        sharp: f64,
        smooth: f64,
        white: f64,
    },
    SmartBeauty {
        beauty_level: f64,
        multi_face: Option<bool>,
    },
    FaceFusion {
        #[serde(with = "base64_bytes")]
        template_image: Vec<u8>,
        source_similarity: f64,
    },
    Expression {
        expression: Expression,
    },
    CinematicEffect {
        template: Option<String>,
    },
    StyleTransfer {
        #[serde(with = "base64_bytes")]
        style_image: Vec<u8>,
    },
    Hairstyle {
        hair_style: String,
        color: Option<String>,
    },
    AnimeGeneration {
        style_index: u8,
    },
    TryOnClothes {
        #[serde(with = "base64_bytes")]
        clothes_image: Vec<u8>,
        clothes_type: ClothesType,
    },
    Cartoon {
        style: CartoonStyle,
    },
    Upscale {
        factor: u8,
    },
    ImageCrop {
        width: u32,
        height: u32,
    },
    Colorize {},
    FaceRestore {},
    BackgroundRemoval {},
    SkinRetouch {
        retouch_degree: f64,
        whitening_degree: f64,
    },
    LipColor {
        r: u8,
        g: u8,
        b: u8,
        alpha: u8,
    },
    FaceSlimming {
        slim_degree: f64,
    },
    Sharpen {},
    Denoise {},
    OldPhotoRestore {},
    ContrastEnhance {},
    ImageExtend {
        #[serde(default)]
        top: f64,
        #[serde(default)]
        bottom: f64,
        #[serde(default)]
        left: f64,
        #[serde(default)]
        right: f64,
    },
    ObjectRemoval {
        #[serde(with = "base64_bytes")]
        mask_image: Vec<u8>,
    },
    FaceFilter {
        resource_type: String,
        strength: f64,
    },
}

/// A parameter value ready to be placed into a provider form.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue<'a> {
    Text(String),
    Image(&'a [u8]),
}

pub const UPSCALE_FACTORS: [u8; 3] = [2, 3, 4];
pub const MAX_CROP_EDGE: u32 = 4096;

impl TransformationParams {
    /// Parses the params object sent by a host for an already-resolved kind.
    pub fn from_json(kind: TransformationKind, params: Value) -> Result<Self, ValidationError> {
        let params = if params.is_null() {
            Value::Object(Map::new())
        } else {
            params
        };
        serde_json::from_value(json!({ "kind": kind.as_str(), "params": params })).map_err(
            |err| ValidationError::MalformedParams {
                kind,
                reason: err.to_string(),
            },
        )
    }

    /// Parses a `{"kind": "...", "params": {...}}` request envelope.
    pub fn from_request(envelope: &Value) -> Result<Self, ValidationError> {
        let raw_kind = envelope
            .get("kind")
            .and_then(Value::as_str)
            .ok_or(ValidationError::MissingParam("kind"))?;
        let kind = raw_kind.parse::<TransformationKind>()?;
        let params = envelope.get("params").cloned().unwrap_or(Value::Null);
        Self::from_json(kind, params)
    }

    pub fn kind(&self) -> TransformationKind {
        match self {
            Self::Age { .. } => TransformationKind::Age,
            Self::GenderSwap { .. } => TransformationKind::GenderSwap,
            Self::FaceBeauty { .. } => TransformationKind::FaceBeauty,
            Self::SmartBeauty { .. } => TransformationKind::SmartBeauty,
            Self::FaceFusion { .. } => TransformationKind::FaceFusion,
            Self::Expression { .. } => TransformationKind::Expression,
            Self::CinematicEffect { .. } => TransformationKind::CinematicEffect,
            Self::StyleTransfer { .. } => TransformationKind::StyleTransfer,
            Self::Hairstyle { .. } => TransformationKind::Hairstyle,
            Self::AnimeGeneration { .. } => TransformationKind::AnimeGeneration,
            Self::TryOnClothes { .. } => TransformationKind::TryOnClothes,
            Self::Cartoon { .. } => TransformationKind::Cartoon,
            Self::Upscale { .. } => TransformationKind::Upscale,
            Self::ImageCrop { .. } => TransformationKind::ImageCrop,
            Self::Colorize {} => TransformationKind::Colorize,
            Self::FaceRestore {} => TransformationKind::FaceRestore,
            Self::BackgroundRemoval {} => TransformationKind::BackgroundRemoval,
            Self::SkinRetouch { .. } => TransformationKind::SkinRetouch,
            Self::LipColor { .. } => TransformationKind::LipColor,
            Self::FaceSlimming { .. } => TransformationKind::FaceSlimming,
            Self::Sharpen {} => TransformationKind::Sharpen,
            Self::Denoise {} => TransformationKind::Denoise,
            Self::OldPhotoRestore {} => TransformationKind::OldPhotoRestore,
            Self::ContrastEnhance {} => TransformationKind::ContrastEnhance,
            Self::ImageExtend { .. } => TransformationKind::ImageExtend,
            Self::ObjectRemoval { .. } => TransformationKind::ObjectRemoval,
            Self::FaceFilter { .. } => TransformationKind::FaceFilter,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Age { target_age } => {
                if !(1..=100).contains(target_age) {
                    return Err(ValidationError::invalid(
                        "target_age",
                        format!("{target_age} is outside 1..=100"),
                    ));
                }
            }
            Self::FaceBeauty {
                sharp,
                smooth,
                white,
            } => {
                check_range("sharp", *sharp, 0.0, 1.0)?;
                check_range("smooth", *smooth, 0.0, 1.0)?;
                check_range("white", *white, 0.0, 1.0)?;
            }
            Self::SmartBeauty { beauty_level, .. } => {
                check_range("beauty_level", *beauty_level, 0.0, 1.0)?;
            }
            Self::FaceFusion {
                template_image,
                source_similarity,
            } => {
                sniff_image("template_image", template_image)?;
                check_range("source_similarity", *source_similarity, 0.0, 1.0)?;
            }
            Self::CinematicEffect { template } => {
                check_optional_text("template", template.as_deref())?;
            }
            Self::StyleTransfer { style_image } => {
                sniff_image("style_image", style_image)?;
            }
            Self::Hairstyle { hair_style, color } => {
                check_text("hair_style", hair_style)?;
                check_optional_text("color", color.as_deref())?;
            }
            Self::AnimeGeneration { style_index } => {
                if *style_index > 9 {
                    return Err(ValidationError::invalid(
                        "style_index",
                        format!("{style_index} is outside 0..=9"),
                    ));
                }
            }
            Self::TryOnClothes { clothes_image, .. } => {
                sniff_image("clothes_image", clothes_image)?;
            }
            Self::Upscale { factor } => {
                if !UPSCALE_FACTORS.contains(factor) {
                    return Err(ValidationError::invalid(
                        "factor",
                        format!("{factor}x is not supported (expected 2, 3 or 4)"),
                    ));
                }
            }
            Self::ImageCrop { width, height } => {
                check_edge("width", *width)?;
                check_edge("height", *height)?;
            }
            Self::SkinRetouch {
                retouch_degree,
                whitening_degree,
            } => {
                check_range("retouch_degree", *retouch_degree, 0.0, 1.0)?;
                check_range("whitening_degree", *whitening_degree, 0.0, 1.0)?;
            }
            Self::LipColor { alpha, .. } => {
                if *alpha > 100 {
                    return Err(ValidationError::invalid(
                        "alpha",
                        format!("{alpha} is outside 0..=100"),
                    ));
                }
            }
            Self::FaceSlimming { slim_degree } => {
                check_range("slim_degree", *slim_degree, 0.0, 2.0)?;
            }
            Self::ImageExtend {
                top,
                bottom,
                left,
                right,
            } => {
                check_range("top", *top, 0.0, 2.0)?;
                check_range("bottom", *bottom, 0.0, 2.0)?;
                check_range("left", *left, 0.0, 2.0)?;
                check_range("right", *right, 0.0, 2.0)?;
                if [top, bottom, left, right].iter().all(|edge| **edge == 0.0) {
                    return Err(ValidationError::invalid(
                        "top",
                        "at least one edge must be extended",
                    ));
                }
            }
            Self::ObjectRemoval { mask_image } => {
                sniff_image("mask_image", mask_image)?;
            }
            Self::FaceFilter {
                resource_type,
                strength,
            } => {
                check_text("resource_type", resource_type)?;
                check_range("strength", *strength, 0.0, 1.0)?;
            }
            Self::GenderSwap { .. }
            | Self::Expression { .. }
            | Self::Cartoon { .. }
            | Self::Colorize {}
            | Self::FaceRestore {}
            | Self::BackgroundRemoval {}
            | Self::Sharpen {}
            | Self::Denoise {}
            | Self::OldPhotoRestore {}
            | Self::ContrastEnhance {} => {}
        }
        Ok(())
    }

    /// Looks up one named parameter in the provider's text encoding.
    ///
    /// Returns `None` for names this variant does not carry and for optional
    /// values that were left out.
    pub fn value(&self, name: &str) -> Option<ParamValue<'_>> {
        let text = |value: String| Some(ParamValue::Text(value));
        match (self, name) {
            (Self::Age { target_age }, "target_age") => text(target_age.to_string()),
            (Self::GenderSwap { target }, "target") => text(
                match target {
                    Gender::Male => "0",
                    Gender::Female => "1",
                }
                .to_string(),
            ),
            (Self::FaceBeauty { sharp, .. }, "sharp") => text(trim_float(*sharp)),
            (Self::FaceBeauty { smooth, .. }, "smooth") => text(trim_float(*smooth)),
            (Self::FaceBeauty { white, .. }, "white") => text(trim_float(*white)),
            (Self::SmartBeauty { beauty_level, .. }, "beauty_level") => {
                text(trim_float(*beauty_level))
            }
            (Self::SmartBeauty { multi_face, .. }, "multi_face") => multi_face
                .map(|enabled| ParamValue::Text(if enabled { "1" } else { "0" }.to_string())),
            (Self::FaceFusion { template_image, .. }, "template_image") => {
                Some(ParamValue::Image(template_image))
            }
            (
                Self::FaceFusion {
                    source_similarity, ..
                },
                "source_similarity",
            ) => text(trim_float(*source_similarity)),
            (Self::Expression { expression }, "expression") => {
                text(expression.service_choice().to_string())
            }
            (Self::CinematicEffect { template }, "template") => non_blank(template.as_deref()),
            (Self::StyleTransfer { style_image }, "style_image") => {
                Some(ParamValue::Image(style_image))
            }
            (Self::Hairstyle { hair_style, .. }, "hair_style") => {
                text(hair_style.trim().to_string())
            }
            (Self::Hairstyle { color, .. }, "color") => non_blank(color.as_deref()),
            (Self::AnimeGeneration { style_index }, "style_index") => text(style_index.to_string()),
            (Self::TryOnClothes { clothes_image, .. }, "clothes_image") => {
                Some(ParamValue::Image(clothes_image))
            }
            (Self::TryOnClothes { clothes_type, .. }, "clothes_type") => {
                text(clothes_type.as_str().to_string())
            }
            (Self::Cartoon { style }, "style") => text(style.as_str().to_string()),
            (Self::Upscale { factor }, "factor") => text(factor.to_string()),
            (Self::ImageCrop { width, .. }, "width") => text(width.to_string()),
            (Self::ImageCrop { height, .. }, "height") => text(height.to_string()),
            (Self::SkinRetouch { retouch_degree, .. }, "retouch_degree") => {
                text(trim_float(*retouch_degree))
            }
            (
                Self::SkinRetouch {
                    whitening_degree, ..
                },
                "whitening_degree",
            ) => text(trim_float(*whitening_degree)),
            (Self::LipColor { r, g, b, alpha }, "lip_color") => text(
                json!([{ "rgba": { "r": r, "g": g, "b": b, "a": alpha } }]).to_string(),
            ),
            (Self::FaceSlimming { slim_degree }, "slim_degree") => text(trim_float(*slim_degree)),
            (Self::ImageExtend { top, .. }, "top") => text(trim_float(*top)),
            (Self::ImageExtend { bottom, .. }, "bottom") => text(trim_float(*bottom)),
            (Self::ImageExtend { left, .. }, "left") => text(trim_float(*left)),
            (Self::ImageExtend { right, .. }, "right") => text(trim_float(*right)),
            (Self::ObjectRemoval { mask_image }, "mask_image") => {
                Some(ParamValue::Image(mask_image))
            }
            (Self::FaceFilter { resource_type, .. }, "resource_type") => {
                text(resource_type.trim().to_string())
            }
            (Self::FaceFilter { strength, .. }, "strength") => text(trim_float(*strength)),
            _ => None,
        }
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if value.is_finite() && (min..=max).contains(&value) {
        return Ok(());
    }
    Err(ValidationError::invalid(
        field,
        format!("{value} is outside {min}..={max}"),
    ))
}

fn check_edge(field: &'static str, value: u32) -> Result<(), ValidationError> {
    if value == 0 || value > MAX_CROP_EDGE {
        return Err(ValidationError::invalid(
            field,
            format!("{value} must be between 1 and {MAX_CROP_EDGE}"),
        ));
    }
    Ok(())
}

fn check_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingParam(field));
    }
    Ok(())
}

fn check_optional_text(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(value) if value.trim().is_empty() => {
            Err(ValidationError::invalid(field, "must not be blank when present"))
        }
        _ => Ok(()),
    }
}

fn non_blank(value: Option<&str>) -> Option<ParamValue<'static>> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| ParamValue::Text(value.to_string()))
}

fn trim_float(value: f64) -> String {
    let text = format!("{value:.6}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::media::decode_base64;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        decode_base64(&raw).map_err(|err| de::Error::custom(format!("invalid base64 image: {err}")))
    }
}
