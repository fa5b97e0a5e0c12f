use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// One effect the provider can apply to an uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformationKind {
    Age,
    GenderSwap,
    FaceBeauty,
    SmartBeauty,
    FaceFusion,
    Expression,
    CinematicEffect,
    StyleTransfer,
    Hairstyle,
    AnimeGeneration,
    TryOnClothes,
    Cartoon,
    Upscale,
    ImageCrop,
    Colorize,
    FaceRestore,
    BackgroundRemoval,
    SkinRetouch,
    LipColor,
    FaceSlimming,
    Sharpen,
    Denoise,
    OldPhotoRestore,
    ContrastEnhance,
    ImageExtend,
    ObjectRemoval,
    FaceFilter,
}

impl TransformationKind {
    pub const ALL: [TransformationKind; 27] = [
        Self::Age,
        Self::GenderSwap,
        Self::FaceBeauty,
        Self::SmartBeauty,
        Self::FaceFusion,
        Self::Expression,
        Self::CinematicEffect,
        Self::StyleTransfer,
        Self::Hairstyle,
        Self::AnimeGeneration,
        Self::TryOnClothes,
        Self::Cartoon,
        Self::Upscale,
        Self::ImageCrop,
        Self::Colorize,
        Self::FaceRestore,
        Self::BackgroundRemoval,
        Self::SkinRetouch,
        Self::LipColor,
        Self::FaceSlimming,
        Self::Sharpen,
        Self::Denoise,
        Self::OldPhotoRestore,
        Self::ContrastEnhance,
        Self::ImageExtend,
        Self::ObjectRemoval,
        Self::FaceFilter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::GenderSwap => "gender-swap",
            Self::FaceBeauty => "face-beauty",
            Self::SmartBeauty => "smart-beauty",
            Self::FaceFusion => "face-fusion",
            Self::Expression => "expression",
            Self::CinematicEffect => "cinematic-effect",
            Self::StyleTransfer => "style-transfer",
            Self::Hairstyle => "hairstyle",
            Self::AnimeGeneration => "anime-generation",
            Self::TryOnClothes => "try-on-clothes",
            Self::Cartoon => "cartoon",
            Self::Upscale => "upscale",
            Self::ImageCrop => "image-crop",
            Self::Colorize => "colorize",
            Self::FaceRestore => "face-restore",
            Self::BackgroundRemoval => "background-removal",
            Self::SkinRetouch => "skin-retouch",
            Self::LipColor => "lip-color",
            Self::FaceSlimming => "face-slimming",
            Self::Sharpen => "sharpen",
            Self::Denoise => "denoise",
            Self::OldPhotoRestore => "old-photo-restore",
            Self::ContrastEnhance => "contrast-enhance",
            Self::ImageExtend => "image-extend",
            Self::ObjectRemoval => "object-removal",
            Self::FaceFilter => "face-filter",
        }
    }
}

impl fmt::Display for TransformationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformationKind {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownKind(raw.trim().to_string()))
    }
}
