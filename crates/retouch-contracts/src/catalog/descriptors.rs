use super::{EffectDescriptor, EffectMode, FieldSpec, ResultLocation, DEFAULT_IMAGE_FIELD};
use crate::kinds::TransformationKind;
use crate::media::MediaType;

const IMAGE_TARGET: &str = "image_target";
const STYLE_MAJOR: &str = "major";

const DATA_IMAGE: ResultLocation = ResultLocation::Inline(&["data", "image"]);
const TOP_IMAGE: ResultLocation = ResultLocation::Inline(&["image"]);
const DATA_IMAGE_URL: ResultLocation = ResultLocation::Remote(&["data", "image_url"]);
const DATA_URL: ResultLocation = ResultLocation::Remote(&["data", "url"]);
const DATA_IMAGES: ResultLocation = ResultLocation::FirstItem(&["data", "images"]);

const NO_FIELDS: &[FieldSpec] = &[];

const AGE_FIELDS: &[FieldSpec] = &[
    FieldSpec::constant("action_type", "V2_AGE"),
    FieldSpec::required("target_age", "target"),
];

const GENDER_SWAP_FIELDS: &[FieldSpec] = &[
    FieldSpec::constant("action_type", "V2_GENDER"),
    FieldSpec::required("target", "target"),
];

const FACE_BEAUTY_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("sharp", "sharp"),
    FieldSpec::required("smooth", "smooth"),
    FieldSpec::required("white", "white"),
];

const SMART_BEAUTY_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("beauty_level", "beauty_level"),
    FieldSpec::optional("multi_face", "multi_face"),
];

const FACE_FUSION_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("template_image", "image_template"),
    FieldSpec::required("source_similarity", "source_similarity"),
];

const EXPRESSION_FIELDS: &[FieldSpec] = &[FieldSpec::required("expression", "service_choice")];

const CINEMATIC_EFFECT_FIELDS: &[FieldSpec] = &[FieldSpec::optional("template", "type")];

const STYLE_TRANSFER_FIELDS: &[FieldSpec] = &[FieldSpec::required("style_image", "style")];

const HAIRSTYLE_FIELDS: &[FieldSpec] = &[
    FieldSpec::constant("task_type", "async"),
    FieldSpec::required("hair_style", "hair_style"),
    FieldSpec::optional("color", "color"),
];

const ANIME_GENERATION_FIELDS: &[FieldSpec] = &[FieldSpec::required("style_index", "index")];

const TRY_ON_CLOTHES_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("clothes_image", "clothes_image"),
    FieldSpec::required("clothes_type", "clothes_type"),
];

const CARTOON_FIELDS: &[FieldSpec] = &[FieldSpec::required("style", "type")];

const UPSCALE_FIELDS: &[FieldSpec] = &[FieldSpec::required("factor", "upscale_factor")];

const IMAGE_CROP_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("width", "width"),
    FieldSpec::required("height", "height"),
];

const SKIN_RETOUCH_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("retouch_degree", "retouch_degree"),
    FieldSpec::required("whitening_degree", "whitening_degree"),
];

const LIP_COLOR_FIELDS: &[FieldSpec] = &[FieldSpec::required("lip_color", "lip_color_infos")];

const FACE_SLIMMING_FIELDS: &[FieldSpec] = &[FieldSpec::required("slim_degree", "slim_degree")];

const IMAGE_EXTEND_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("top", "top"),
    FieldSpec::required("bottom", "bottom"),
    FieldSpec::required("left", "left"),
    FieldSpec::required("right", "right"),
];

const OBJECT_REMOVAL_FIELDS: &[FieldSpec] = &[FieldSpec::required("mask_image", "mask")];

const FACE_FILTER_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("resource_type", "resource_type"),
    FieldSpec::required("strength", "strength"),
];

pub fn default_descriptors() -> Vec<EffectDescriptor> {
    let mut table = Vec::with_capacity(TransformationKind::ALL.len());

    let mut insert = |kind: TransformationKind,
                      endpoint: &'static str,
                      mode: EffectMode,
                      image_field: &'static str,
                      fields: &'static [FieldSpec],
                      result: ResultLocation,
                      media: MediaType| {
        table.push(EffectDescriptor {
            kind,
            endpoint,
            mode,
            image_field,
            fields,
            result,
            media,
        });
    };

    insert(
        TransformationKind::Age,
        "portrait/effects/face-attribute-editing",
        EffectMode::Sync,
        DEFAULT_IMAGE_FIELD,
        AGE_FIELDS,
        DATA_IMAGE,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::GenderSwap,
        "portrait/effects/face-attribute-editing",
        EffectMode::Sync,
        DEFAULT_IMAGE_FIELD,
        GENDER_SWAP_FIELDS,
        DATA_IMAGE,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::FaceBeauty,
        "portrait/effects/face-beauty",
        EffectMode::Sync,
        DEFAULT_IMAGE_FIELD,
        FACE_BEAUTY_FIELDS,
        DATA_IMAGE,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::SmartBeauty,
        "portrait/effects/smart-beauty",
        EffectMode::Sync,
        IMAGE_TARGET,
        SMART_BEAUTY_FIELDS,
        DATA_IMAGE_URL,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::FaceFusion,
        "portrait/effects/face-fusion",
        EffectMode::Sync,
        IMAGE_TARGET,
        FACE_FUSION_FIELDS,
        DATA_IMAGE,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::Expression,
        "portrait/effects/emotion-editor",
        EffectMode::Sync,
        IMAGE_TARGET,
        EXPRESSION_FIELDS,
        DATA_IMAGE,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::CinematicEffect,
        "portrait/effects/live-portrait",
        EffectMode::Sync,
        IMAGE_TARGET,
        CINEMATIC_EFFECT_FIELDS,
        ResultLocation::Remote(&["data", "video_url"]),
        MediaType::Mp4,
    );
    insert(
        TransformationKind::StyleTransfer,
        "image/effects/image-style-migration",
        EffectMode::Sync,
        STYLE_MAJOR,
        STYLE_TRANSFER_FIELDS,
        DATA_IMAGE,
        MediaType::Png,
    );
    insert(
        TransformationKind::Hairstyle,
        "portrait/effects/hairstyle-editor-pro",
        EffectMode::Async,
        DEFAULT_IMAGE_FIELD,
        HAIRSTYLE_FIELDS,
        DATA_IMAGES,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::AnimeGeneration,
        "image/effects/ai-anime-generator",
        EffectMode::Async,
        DEFAULT_IMAGE_FIELD,
        ANIME_GENERATION_FIELDS,
        DATA_IMAGES,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::TryOnClothes,
        "portrait/editing/try-on-clothes",
        EffectMode::Async,
        DEFAULT_IMAGE_FIELD,
        TRY_ON_CLOTHES_FIELDS,
        DATA_IMAGES,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::Cartoon,
        "image/effects/generate-human-anime-style",
        EffectMode::Sync,
        DEFAULT_IMAGE_FIELD,
        CARTOON_FIELDS,
        DATA_IMAGE_URL,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::Upscale,
        "image/enhance/image-lossless-enlargement",
        EffectMode::Sync,
        DEFAULT_IMAGE_FIELD,
        UPSCALE_FIELDS,
        DATA_URL,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::ImageCrop,
        "image/editing/image-intelligent-crop",
        EffectMode::Sync,
        DEFAULT_IMAGE_FIELD,
        IMAGE_CROP_FIELDS,
        DATA_URL,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::Colorize,
        "image/enhance/image-colorization",
        EffectMode::Sync,
        DEFAULT_IMAGE_FIELD,
        NO_FIELDS,
        TOP_IMAGE,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::FaceRestore,
        "portrait/enhance/face-restoration",
        EffectMode::Sync,
        DEFAULT_IMAGE_FIELD,
        NO_FIELDS,
        DATA_IMAGE_URL,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::BackgroundRemoval,
        "cutout/portrait/portrait-background-removal",
        EffectMode::Sync,
        DEFAULT_IMAGE_FIELD,
        NO_FIELDS,
        DATA_IMAGE_URL,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::SkinRetouch,
        "portrait/effects/smart-skin",
        EffectMode::Sync,
        DEFAULT_IMAGE_FIELD,
        SKIN_RETOUCH_FIELDS,
        DATA_IMAGE,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::LipColor,
        "portrait/effects/lips-color-changer",
        EffectMode::Sync,
        DEFAULT_IMAGE_FIELD,
        LIP_COLOR_FIELDS,
        DATA_IMAGE,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::FaceSlimming,
        "portrait/effects/face-slimming",
        EffectMode::Sync,
        DEFAULT_IMAGE_FIELD,
        FACE_SLIMMING_FIELDS,
        DATA_IMAGE,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::Sharpen,
        "image/enhance/image-sharpness",
        EffectMode::Sync,
        DEFAULT_IMAGE_FIELD,
        NO_FIELDS,
        DATA_IMAGE_URL,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::Denoise,
        "image/enhance/image-denoising",
        EffectMode::Sync,
        DEFAULT_IMAGE_FIELD,
        NO_FIELDS,
        TOP_IMAGE,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::OldPhotoRestore,
        "image/enhance/old-photo-restoration",
        EffectMode::Sync,
        DEFAULT_IMAGE_FIELD,
        NO_FIELDS,
        DATA_IMAGES,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::ContrastEnhance,
        "image/enhance/image-contrast-enhancement",
        EffectMode::Sync,
        DEFAULT_IMAGE_FIELD,
        NO_FIELDS,
        TOP_IMAGE,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::ImageExtend,
        "image/editing/image-extender",
        EffectMode::Sync,
        DEFAULT_IMAGE_FIELD,
        IMAGE_EXTEND_FIELDS,
        DATA_IMAGES,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::ObjectRemoval,
        "image/editing/remove-objects",
        EffectMode::Sync,
        DEFAULT_IMAGE_FIELD,
        OBJECT_REMOVAL_FIELDS,
        DATA_IMAGE_URL,
        MediaType::Jpeg,
    );
    insert(
        TransformationKind::FaceFilter,
        "portrait/effects/face-filter",
        EffectMode::Sync,
        DEFAULT_IMAGE_FIELD,
        FACE_FILTER_FIELDS,
        DATA_IMAGE,
        MediaType::Jpeg,
    );

    table
}
