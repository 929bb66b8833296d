//! Background-subtraction detector for grayscale frames.

use std::collections::HashMap;

use image::{GrayImage, Luma, imageops};
use imageproc::contrast::{ThresholdType, threshold};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use imageproc::region_labelling::{Connectivity, connected_components};
use ndarray::{Array2, ArrayView2, Zip};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{ConfigError, DetectorError};
use crate::geometry::{Mask, shape_descriptors, to_gray_image};
use crate::tracker::{parse_count, parse_f64};

use super::MaskSource;

/// Morphological operation applied to the binary foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Morphology {
    Erode,
    Dilate,
    Open,
    Close,
}

impl Morphology {
    /// Operation codes of the `morph` parameter; `8` means none.
    fn from_code(code: u32) -> Option<Option<Self>> {
        match code {
            0 => Some(Some(Self::Erode)),
            1 => Some(Some(Self::Dilate)),
            2 => Some(Some(Self::Open)),
            3 => Some(Some(Self::Close)),
            8 => Some(None),
            _ => None,
        }
    }

    fn apply(self, image: &GrayImage, radius: u8) -> GrayImage {
        match self {
            Self::Erode => morphology::erode(image, Norm::LInf, radius),
            Self::Dilate => morphology::dilate(image, Norm::LInf, radius),
            Self::Open => morphology::open(image, Norm::LInf, radius),
            Self::Close => morphology::close(image, Norm::LInf, radius),
        }
    }
}

/// Rectangle `[x_top, x_bottom) x [y_top, y_bottom)` in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionOfInterest {
    pub x_top: u32,
    pub y_top: u32,
    pub x_bottom: u32,
    pub y_bottom: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundSubtractionConfig {
    /// Objects are darker than the background.
    pub light_background: bool,
    /// Differences strictly above this value are foreground.
    #[serde(rename = "thresh")]
    pub threshold: u8,
    #[serde(rename = "morph", default)]
    pub morphology: Option<Morphology>,
    /// L∞ radius of the structuring element; `0` disables morphology.
    #[serde(default)]
    pub morph_size: u8,
    #[serde(default)]
    pub roi: Option<RegionOfInterest>,
    /// Blobs must enclose strictly more than this area (outer contour).
    pub min_area: f64,
    /// Blobs must enclose strictly less than this area.
    pub max_area: f64,
}

impl BackgroundSubtractionConfig {
    pub const LIGHT_BACK: &'static str = "lightBack";
    pub const THRESH: &'static str = "thresh";
    pub const MORPH: &'static str = "morph";
    pub const MORPH_SIZE: &'static str = "morphSize";
    pub const X_TOP: &'static str = "xTop";
    pub const Y_TOP: &'static str = "yTop";
    pub const X_BOTTOM: &'static str = "xBottom";
    pub const Y_BOTTOM: &'static str = "yBottom";
    pub const MIN_AREA: &'static str = "minArea";
    pub const MAX_AREA: &'static str = "maxArea";

    /// Build a configuration from the flat FastTrack parameter map.
    ///
    /// `lightBack = 0` selects a light background. Morphology and the region of
    /// interest are optional; the region is disabled when `xBottom` or
    /// `yBottom` is `0`.
    pub fn from_map(params: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let light_background = parse_count(params, Self::LIGHT_BACK)? == 0;
        let threshold = parse_u8(params, Self::THRESH)?;

        let morphology = if params.contains_key(Self::MORPH) {
            let code = parse_count(params, Self::MORPH)?;
            Morphology::from_code(code)
                .ok_or_else(|| ConfigError::invalid(Self::MORPH, code, "expected 0, 1, 2, 3 or 8"))?
        } else {
            None
        };
        let morph_size = if params.contains_key(Self::MORPH_SIZE) {
            parse_u8(params, Self::MORPH_SIZE)?
        } else {
            0
        };

        let roi = if params.contains_key(Self::X_BOTTOM) && params.contains_key(Self::Y_BOTTOM) {
            let roi = RegionOfInterest {
                x_top: parse_count(params, Self::X_TOP)?,
                y_top: parse_count(params, Self::Y_TOP)?,
                x_bottom: parse_count(params, Self::X_BOTTOM)?,
                y_bottom: parse_count(params, Self::Y_BOTTOM)?,
            };
            (roi.x_bottom != 0 && roi.y_bottom != 0).then_some(roi)
        } else {
            None
        };

        let config = Self {
            light_background,
            threshold,
            morphology,
            morph_size,
            roi,
            min_area: parse_f64(params, Self::MIN_AREA)?,
            max_area: parse_f64(params, Self::MAX_AREA)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_area.is_nan() || self.max_area.is_nan() {
            return Err(ConfigError::invalid(
                Self::MIN_AREA,
                self.min_area,
                "area bounds must be numbers",
            ));
        }
        if let Some(roi) = self.roi {
            if roi.x_top >= roi.x_bottom || roi.y_top >= roi.y_bottom {
                return Err(ConfigError::invalid(
                    Self::X_TOP,
                    format!("{roi:?}"),
                    "top corner must lie before the bottom corner",
                ));
            }
        }
        Ok(())
    }
}

fn parse_u8(params: &HashMap<String, String>, key: &str) -> Result<u8, ConfigError> {
    let value = parse_count(params, key)?;
    u8::try_from(value).map_err(|_| ConfigError::invalid(key, value, "must be at most 255"))
}

/// Segments objects as connected blobs that differ from a static background.
#[derive(Debug, Clone)]
pub struct BackgroundSubtractionDetector {
    config: BackgroundSubtractionConfig,
    background: Option<Array2<u8>>,
}

impl BackgroundSubtractionDetector {
    pub fn new(config: BackgroundSubtractionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            background: None,
        })
    }

    pub fn set_background(&mut self, background: ArrayView2<'_, u8>) {
        self.background = Some(background.to_owned());
    }

    pub fn background(&self) -> Option<ArrayView2<'_, u8>> {
        self.background.as_ref().map(|b| b.view())
    }

    pub fn config(&self) -> &BackgroundSubtractionConfig {
        &self.config
    }

    /// Thresholded, cleaned foreground restricted to the region of interest,
    /// with the offset of that region in the frame.
    fn foreground(
        &self,
        frame: ArrayView2<'_, u8>,
    ) -> Result<(GrayImage, (u32, u32)), DetectorError> {
        let background = self
            .background
            .as_ref()
            .ok_or(DetectorError::MissingBackground)?;
        if background.dim() != frame.dim() {
            return Err(DetectorError::ShapeMismatch {
                frame: frame.dim(),
                background: background.dim(),
            });
        }

        let light = self.config.light_background;
        let difference = Zip::from(frame)
            .and(background)
            .map_collect(|&f, &b| if light { b.saturating_sub(f) } else { f.saturating_sub(b) });
        let difference = GrayImage::from_fn(frame.ncols() as u32, frame.nrows() as u32, |x, y| {
            Luma([difference[[y as usize, x as usize]]])
        });

        let mut binary = threshold(&difference, self.config.threshold, ThresholdType::Binary);
        if let Some(op) = self.config.morphology {
            if self.config.morph_size > 0 {
                binary = op.apply(&binary, self.config.morph_size);
            }
        }

        match self.config.roi {
            Some(roi) => {
                let x0 = roi.x_top.min(binary.width());
                let y0 = roi.y_top.min(binary.height());
                let x1 = roi.x_bottom.min(binary.width());
                let y1 = roi.y_bottom.min(binary.height());
                let cropped = imageops::crop_imm(&binary, x0, y0, x1 - x0, y1 - y0).to_image();
                Ok((cropped, (x0, y0)))
            }
            None => Ok((binary, (0, 0))),
        }
    }
}

/// Bounding box of one labelled component.
#[derive(Debug, Clone, Copy)]
struct Component {
    min: (u32, u32),
    max: (u32, u32),
}

impl Component {
    fn at(x: u32, y: u32) -> Self {
        Self {
            min: (x, y),
            max: (x, y),
        }
    }

    fn include(&mut self, x: u32, y: u32) {
        self.min = (self.min.0.min(x), self.min.1.min(y));
        self.max = (self.max.0.max(x), self.max.1.max(y));
    }

    fn dim(&self) -> (usize, usize) {
        (
            (self.max.1 - self.min.1 + 1) as usize,
            (self.max.0 - self.min.0 + 1) as usize,
        )
    }
}

/// Fill the holes of a binary raster: background pixels that are not
/// 4-connected to the outside become foreground.
fn fill_holes(raster: &Array2<u8>) -> Array2<u8> {
    let mut inverted = to_gray_image(raster.view(), 1);
    imageops::invert(&mut inverted);
    let regions = connected_components(&inverted, Connectivity::Four, Luma([0u8]));
    let outside = regions.get_pixel(0, 0)[0];
    Array2::from_shape_fn(raster.dim(), |(row, col)| {
        let label = regions.get_pixel(col as u32 + 1, row as u32 + 1)[0];
        if label != outside { 255 } else { 0 }
    })
}

impl MaskSource for BackgroundSubtractionDetector {
    type Error = DetectorError;

    /// Each outer blob becomes one mask, holes filled. Blobs lying inside the
    /// hole of another blob are part of that blob's mask, not masks of their
    /// own. The area bounds apply to the area enclosed by the outer contour.
    fn detect(&mut self, frame: ArrayView2<'_, u8>) -> Result<Vec<Mask>, Self::Error> {
        let (binary, (offset_x, offset_y)) = self.foreground(frame)?;
        let labels = connected_components(&binary, Connectivity::Eight, Luma([0u8]));

        let mut components: Vec<Option<Component>> = Vec::new();
        for (x, y, label) in labels.enumerate_pixels() {
            let label = label[0] as usize;
            if label == 0 {
                continue;
            }
            if components.len() < label {
                components.resize(label, None);
            }
            components[label - 1]
                .get_or_insert_with(|| Component::at(x, y))
                .include(x, y);
        }

        let mut nested = vec![false; components.len()];
        let mut filled = Vec::with_capacity(components.len());
        for (index, component) in components.iter().enumerate() {
            let Some(component) = component else {
                filled.push(None);
                continue;
            };
            let label = index as u32 + 1;
            let (x0, y0) = component.min;
            let own = Array2::from_shape_fn(component.dim(), |(row, col)| {
                let value = labels.get_pixel(x0 + col as u32, y0 + row as u32)[0];
                if value == label { 255 } else { 0 }
            });
            let pixels = fill_holes(&own);
            for ((row, col), &p) in pixels.indexed_iter() {
                let inner = labels.get_pixel(x0 + col as u32, y0 + row as u32)[0];
                if p != 0 && inner != 0 && inner != label {
                    nested[inner as usize - 1] = true;
                }
            }
            filled.push(Some(pixels));
        }

        let (min_area, max_area) = (self.config.min_area, self.config.max_area);
        let mut masks = Vec::new();
        for (index, (component, pixels)) in components.iter().zip(filled).enumerate() {
            let (Some(component), Some(pixels)) = (component, pixels) else {
                continue;
            };
            if nested[index] {
                continue;
            }
            let Ok(shape) = shape_descriptors(pixels.view()) else {
                continue;
            };
            if !(shape.area > min_area && shape.area < max_area) {
                trace!(area = shape.area, "component outside area bounds");
                continue;
            }

            let (x0, y0) = component.min;
            let origin = ((x0 + offset_x) as i64, (y0 + offset_y) as i64);
            masks.push(Mask::new(pixels, origin));
        }

        debug!(components = components.len(), kept = masks.len(), "frame segmented");
        Ok(masks)
    }
}
