use crate::CritiqueError;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::fmt;

/// At most this many images are retained per request.
pub const MAX_IMAGES: usize = 3;

const DEFAULT_MEDIA_TYPE: &str = "image/png";

/// What the submitted interface is optimised for. Shapes priorities in the
/// critique, never the standards applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    #[default]
    Conversion,
    Premium,
    Utility,
    Consistency,
}

impl Goal {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conversion => "conversion",
            Self::Premium => "premium",
            Self::Utility => "utility",
            Self::Consistency => "consistency",
        }
    }

    #[must_use]
    pub fn focus(self) -> &'static str {
        match self {
            Self::Conversion => {
                "Weight issues that block the primary call to action and the path to sign-up or purchase."
            }
            Self::Premium => {
                "Weight polish: typographic rhythm, restraint in color, spacing consistency, and anything that reads as cheap."
            }
            Self::Utility => {
                "Weight task speed: density, scannability, keyboard reachability, and error recovery."
            }
            Self::Consistency => {
                "Weight drift from a design system: arbitrary values, duplicated variants, and off-scale tokens."
            }
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A binary image as submitted by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl ImageInput {
    pub fn new(media_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Decode a standard base64 payload.
    pub fn from_base64(media_type: impl Into<String>, data: &str) -> Result<Self, CritiqueError> {
        let bytes = STANDARD
            .decode(data.trim())
            .map_err(|error| CritiqueError::InvalidInput(format!("Invalid base64 image: {error}")))?;
        Ok(Self::new(media_type, bytes))
    }

    /// Decode a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<Self, CritiqueError> {
        let rest = url.trim().strip_prefix("data:").ok_or_else(|| {
            CritiqueError::InvalidInput("Image data URL must start with 'data:'".to_string())
        })?;
        let (header, payload) = rest.split_once(',').ok_or_else(|| {
            CritiqueError::InvalidInput("Image data URL has no payload".to_string())
        })?;
        let media_type = header.strip_suffix(";base64").ok_or_else(|| {
            CritiqueError::InvalidInput("Image data URL must be base64 encoded".to_string())
        })?;
        Self::from_base64(media_type, payload)
    }
}

/// A critique submission before normalization.
#[derive(Debug, Clone, Default)]
pub struct CritiqueRequest {
    pub text: String,
    pub images: Vec<ImageInput>,
    pub goal: Option<Goal>,
    pub audience: Option<String>,
    pub platform: Option<String>,
}

impl CritiqueRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_goal(mut self, goal: Goal) -> Self {
        self.goal = Some(goal);
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.images.push(image);
        self
    }
}

/// An image in canonical form: lowercased media type and standard base64.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedImage {
    pub media_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInput {
    pub text: String,
    pub images: Vec<NormalizedImage>,
    pub goal: Goal,
    pub audience: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizeWarning {
    /// The image at `index` (zero-based, submission order) exceeded the cap.
    ImageDropped { index: usize, media_type: String },
}

impl fmt::Display for NormalizeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageDropped { index, media_type } => write!(
                f,
                "image {} ({media_type}) dropped: at most {MAX_IMAGES} images are analysed",
                index + 1
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub input: NormalizedInput,
    pub warnings: Vec<NormalizeWarning>,
}

/// Canonicalise a submission. Fails only when nothing can be analysed or an
/// image is unusable.
pub fn normalize(request: CritiqueRequest) -> Result<Normalized, CritiqueError> {
    let CritiqueRequest {
        text,
        images,
        goal,
        audience,
        platform,
    } = request;

    let (images, warnings) = normalize_images(images)?;
    let text = text.trim().to_string();

    if text.is_empty() && images.is_empty() {
        return Err(CritiqueError::InvalidInput(
            "Provide text, a URL, code, or at least one image".to_string(),
        ));
    }

    Ok(Normalized {
        input: NormalizedInput {
            text,
            images,
            goal: goal.unwrap_or_default(),
            audience: non_empty(audience),
            platform: non_empty(platform),
        },
        warnings,
    })
}

/// Validate and re-encode up to [`MAX_IMAGES`] images, reporting the rest.
pub fn normalize_images(
    images: Vec<ImageInput>,
) -> Result<(Vec<NormalizedImage>, Vec<NormalizeWarning>), CritiqueError> {
    let mut kept = Vec::with_capacity(images.len().min(MAX_IMAGES));
    let mut warnings = vec![];

    for (index, image) in images.into_iter().enumerate() {
        if index >= MAX_IMAGES {
            let media_type = image.media_type.trim().to_ascii_lowercase();
            tracing::warn!(index, media_type = %media_type, "dropping image past the limit");
            warnings.push(NormalizeWarning::ImageDropped { index, media_type });
            continue;
        }
        let media_type = normalize_media_type(&image.media_type)?;
        if image.bytes.is_empty() {
            return Err(CritiqueError::InvalidInput(format!(
                "Image {} is empty",
                index + 1
            )));
        }
        kept.push(NormalizedImage {
            media_type,
            data: STANDARD.encode(&image.bytes),
        });
    }

    Ok((kept, warnings))
}

fn normalize_media_type(media_type: &str) -> Result<String, CritiqueError> {
    let media_type = media_type.trim().to_ascii_lowercase();
    if media_type.is_empty() {
        return Ok(DEFAULT_MEDIA_TYPE.to_string());
    }
    if !media_type.starts_with("image/") {
        return Err(CritiqueError::InvalidInput(format!(
            "Unsupported attachment type '{media_type}'"
        )));
    }
    Ok(media_type)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
