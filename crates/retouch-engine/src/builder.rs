use retouch_contracts::media::sniff_upload;
use retouch_contracts::{
    EffectCatalog, EffectDescriptor, FieldSpec, ParamValue, TransformationKind,
    TransformationParams, ValidationError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartBody {
    Text(String),
    File {
        bytes: Vec<u8>,
        file_name: String,
        mime: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: &'static str,
    pub body: PartBody,
}

/// A provider-ready multipart submission.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub descriptor: EffectDescriptor,
    pub parts: Vec<FormPart>,
}

impl ProviderRequest {
    pub fn kind(&self) -> TransformationKind {
        self.descriptor.kind
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.parts.iter().map(|part| part.name).collect()
    }

    pub fn part(&self, name: &str) -> Option<&FormPart> {
        self.parts.iter().find(|part| part.name == name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.part(name).map(|part| &part.body) {
            Some(PartBody::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Turns a typed request into the form a descriptor asks for.
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    catalog: &'a EffectCatalog,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(catalog: &'a EffectCatalog) -> Self {
        Self { catalog }
    }

    pub fn build(
        &self,
        kind: TransformationKind,
        params: &TransformationParams,
        image: &[u8],
    ) -> Result<ProviderRequest, ValidationError> {
        let descriptor = self
            .catalog
            .get(kind)
            .ok_or_else(|| ValidationError::UnknownKind(kind.to_string()))?;
        if params.kind() != kind {
            return Err(ValidationError::ParamsMismatch {
                expected: kind,
                found: params.kind(),
            });
        }
        params.validate()?;

        let mut parts = Vec::with_capacity(descriptor.fields.len() + 1);
        parts.push(file_part(descriptor.image_field, "image", image)?);

        for spec in descriptor.fields {
            match *spec {
                FieldSpec::Const { field, value } => parts.push(FormPart {
                    name: field,
                    body: PartBody::Text(value.to_string()),
                }),
                FieldSpec::Param {
                    param,
                    field,
                    required,
                } => match params.value(param) {
                    Some(ParamValue::Text(value)) => parts.push(FormPart {
                        name: field,
                        body: PartBody::Text(value),
                    }),
                    Some(ParamValue::Image(bytes)) => parts.push(file_part(field, param, bytes)?),
                    None if required => return Err(ValidationError::MissingParam(param)),
                    None => {}
                },
            }
        }

        Ok(ProviderRequest {
            descriptor: descriptor.clone(),
            parts,
        })
    }
}

fn file_part(
    name: &'static str,
    source: &'static str,
    bytes: &[u8],
) -> Result<FormPart, ValidationError> {
    let format = sniff_upload(source, bytes)?;
    Ok(FormPart {
        name,
        body: PartBody::File {
            bytes: bytes.to_vec(),
            file_name: format!("{name}.{}", format.extension),
            mime: format.mime,
        },
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use retouch_contracts::params::{CartoonStyle, ClothesType, Expression, Gender};

    use super::*;

    pub(crate) const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
    pub(crate) const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    /// One valid params value per kind.
    pub(crate) fn sample_params(kind: TransformationKind) -> TransformationParams {
        use TransformationParams as P;
        match kind {
            TransformationKind::Age => P::Age { target_age: 60 },
            TransformationKind::GenderSwap => P::GenderSwap {
                target: Gender::Female,
            },
            TransformationKind::FaceBeauty => P::FaceBeauty {
                sharp: 0.5,
                smooth: 0.4,
                white: 0.3,
            },
            TransformationKind::SmartBeauty => P::SmartBeauty {
                beauty_level: 0.8,
                multi_face: Some(true),
            },
            TransformationKind::FaceFusion => P::FaceFusion {
                template_image: PNG.to_vec(),
                source_similarity: 0.7,
            },
            TransformationKind::Expression => P::Expression {
                expression: Expression::Smile,
            },
            TransformationKind::CinematicEffect => P::CinematicEffect { template: None },
            TransformationKind::StyleTransfer => P::StyleTransfer {
                style_image: PNG.to_vec(),
            },
            TransformationKind::Hairstyle => P::Hairstyle {
                hair_style: "BuzzCut".to_string(),
                color: Some("blonde".to_string()),
            },
            TransformationKind::AnimeGeneration => P::AnimeGeneration { style_index: 2 },
            TransformationKind::TryOnClothes => P::TryOnClothes {
                clothes_image: JPEG.to_vec(),
                clothes_type: ClothesType::UpperBody,
            },
            TransformationKind::Cartoon => P::Cartoon {
                style: CartoonStyle::ThreeDCartoon,
            },
            TransformationKind::Upscale => P::Upscale { factor: 2 },
            TransformationKind::ImageCrop => P::ImageCrop {
                width: 1080,
                height: 1080,
            },
            TransformationKind::Colorize => P::Colorize {},
            TransformationKind::FaceRestore => P::FaceRestore {},
            TransformationKind::BackgroundRemoval => P::BackgroundRemoval {},
            TransformationKind::SkinRetouch => P::SkinRetouch {
                retouch_degree: 0.6,
                whitening_degree: 0.2,
            },
            TransformationKind::LipColor => P::LipColor {
                r: 180,
                g: 30,
                b: 60,
                alpha: 50,
            },
            TransformationKind::FaceSlimming => P::FaceSlimming { slim_degree: 1.2 },
            TransformationKind::Sharpen => P::Sharpen {},
            TransformationKind::Denoise => P::Denoise {},
            TransformationKind::OldPhotoRestore => P::OldPhotoRestore {},
            TransformationKind::ContrastEnhance => P::ContrastEnhance {},
            TransformationKind::ImageExtend => P::ImageExtend {
                top: 0.25,
                bottom: 0.25,
                left: 0.0,
                right: 0.0,
            },
            TransformationKind::ObjectRemoval => P::ObjectRemoval {
                mask_image: PNG.to_vec(),
            },
            TransformationKind::FaceFilter => P::FaceFilter {
                resource_type: "vintage".to_string(),
                strength: 0.5,
            },
        }
    }

    fn other_kind(kind: TransformationKind) -> TransformationKind {
        if kind == TransformationKind::Age {
            TransformationKind::Upscale
        } else {
            TransformationKind::Age
        }
    }

    #[test]
    fn every_kind_accepts_matching_params_and_rejects_others() -> anyhow::Result<()> {
        let builder = RequestBuilder::new(EffectCatalog::shared());
        for kind in TransformationKind::ALL {
            let request = builder.build(kind, &sample_params(kind), JPEG)?;
            assert_eq!(request.kind(), kind);

            let wrong = other_kind(kind);
            let err = builder
                .build(kind, &sample_params(wrong), JPEG)
                .expect_err("mismatched params must be rejected");
            assert_eq!(
                err,
                ValidationError::ParamsMismatch {
                    expected: kind,
                    found: wrong,
                }
            );
        }
        Ok(())
    }

    #[test]
    fn every_field_plan_is_fully_populated_by_sample_params() -> anyhow::Result<()> {
        let builder = RequestBuilder::new(EffectCatalog::shared());
        for descriptor in EffectCatalog::shared().list() {
            let request = builder.build(descriptor.kind, &sample_params(descriptor.kind), JPEG)?;
            let names = request.field_names();
            assert_eq!(names.first().copied(), Some(descriptor.image_field));
            for spec in descriptor.fields {
                if let FieldSpec::Param {
                    required: false, ..
                } = spec
                {
                    continue;
                }
                assert!(
                    names.contains(&spec.field()),
                    "{} is missing field {}",
                    descriptor.kind,
                    spec.field()
                );
            }
        }
        Ok(())
    }

    #[test]
    fn image_target_kinds_do_not_send_image_field() -> anyhow::Result<()> {
        let builder = RequestBuilder::new(EffectCatalog::shared());
        for kind in [
            TransformationKind::FaceFusion,
            TransformationKind::SmartBeauty,
            TransformationKind::Expression,
            TransformationKind::CinematicEffect,
        ] {
            let request = builder.build(kind, &sample_params(kind), JPEG)?;
            assert!(request.part("image_target").is_some(), "{kind}");
            assert!(request.part("image").is_none(), "{kind}");
        }
        Ok(())
    }

    #[test]
    fn style_transfer_sends_major_and_style_images() -> anyhow::Result<()> {
        let builder = RequestBuilder::new(EffectCatalog::shared());
        let request = builder.build(
            TransformationKind::StyleTransfer,
            &sample_params(TransformationKind::StyleTransfer),
            JPEG,
        )?;
        assert_eq!(request.field_names(), vec!["major", "style"]);
        match &request.part("major").map(|part| &part.body) {
            Some(PartBody::File { bytes, mime, .. }) => {
                assert_eq!(bytes.as_slice(), JPEG);
                assert_eq!(*mime, "image/jpeg");
            }
            other => panic!("unexpected major part: {other:?}"),
        }
        match &request.part("style").map(|part| &part.body) {
            Some(PartBody::File {
                mime, file_name, ..
            }) => {
                assert_eq!(*mime, "image/png");
                assert_eq!(file_name, "style.png");
            }
            other => panic!("unexpected style part: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn face_beauty_appends_three_numeric_fields_in_order() -> anyhow::Result<()> {
        let request = RequestBuilder::new(EffectCatalog::shared()).build(
            TransformationKind::FaceBeauty,
            &sample_params(TransformationKind::FaceBeauty),
            JPEG,
        )?;
        assert_eq!(
            request.field_names(),
            vec!["image", "sharp", "smooth", "white"]
        );
        assert_eq!(request.text("sharp"), Some("0.5"));
        assert_eq!(request.text("smooth"), Some("0.4"));
        assert_eq!(request.text("white"), Some("0.3"));
        Ok(())
    }

    #[test]
    fn hairstyle_sends_async_marker_and_optional_color() -> anyhow::Result<()> {
        let builder = RequestBuilder::new(EffectCatalog::shared());
        let request = builder.build(
            TransformationKind::Hairstyle,
            &sample_params(TransformationKind::Hairstyle),
            JPEG,
        )?;
        assert_eq!(
            request.field_names(),
            vec!["image", "task_type", "hair_style", "color"]
        );
        assert_eq!(request.text("task_type"), Some("async"));
        assert_eq!(request.text("color"), Some("blonde"));

        let without_color = TransformationParams::Hairstyle {
            hair_style: "BuzzCut".to_string(),
            color: None,
        };
        let request = builder.build(TransformationKind::Hairstyle, &without_color, JPEG)?;
        assert_eq!(
            request.field_names(),
            vec!["image", "task_type", "hair_style"]
        );
        Ok(())
    }

    #[test]
    fn age_sends_action_marker_and_target() -> anyhow::Result<()> {
        let request = RequestBuilder::new(EffectCatalog::shared()).build(
            TransformationKind::Age,
            &TransformationParams::Age { target_age: 70 },
            PNG,
        )?;
        assert_eq!(request.text("action_type"), Some("V2_AGE"));
        assert_eq!(request.text("target"), Some("70"));
        Ok(())
    }

    #[test]
    fn rejects_invalid_primary_image() {
        let builder = RequestBuilder::new(EffectCatalog::shared());
        let err = builder
            .build(
                TransformationKind::Colorize,
                &TransformationParams::Colorize {},
                b"not an image",
            )
            .expect_err("text is not an image");
        assert!(matches!(
            err,
            ValidationError::UnsupportedImage { field: "image", .. }
        ));
    }

    #[test]
    fn rejects_kind_absent_from_catalog() {
        let catalog = EffectCatalog::new(
            retouch_contracts::catalog::default_descriptors()
                .into_iter()
                .filter(|descriptor| descriptor.kind != TransformationKind::Cartoon),
        );
        let err = RequestBuilder::new(&catalog)
            .build(
                TransformationKind::Cartoon,
                &sample_params(TransformationKind::Cartoon),
                JPEG,
            )
            .expect_err("cartoon was removed");
        assert_eq!(err, ValidationError::UnknownKind("cartoon".to_string()));
    }

    #[test]
    fn rejects_out_of_range_params_before_building() {
        let err = RequestBuilder::new(EffectCatalog::shared())
            .build(
                TransformationKind::ImageCrop,
                &TransformationParams::ImageCrop {
                    width: 1080,
                    height: 0,
                },
                JPEG,
            )
            .expect_err("zero height");
        assert!(matches!(
            err,
            ValidationError::InvalidParam { field: "height", .. }
        ));
    }
}
