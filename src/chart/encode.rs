//! Size-bounded rasterization of a chart SVG.
//!
//! An explicit degradation ladder: encode at the base size, shrink while
//! over budget, switch to WebP at the dimension floor, and as an absolute
//! last resort truncate — which produces a corrupt image and is therefore
//! flagged on the output and logged at error level, never treated as a
//! silent success.

use image::codecs::webp::WebPEncoder;
use image::ExtendedColorType;
use tracing::{debug, error};

use super::{ChartImage, ImageMime};
use crate::config::ChartConfig;
use crate::error::{ScoutError, ScoutResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncodeStage {
    Initial,
    Downscale,
    WebpFallback,
    Truncate,
}

fn rasterize(tree: &usvg::Tree, scale: f32) -> ScoutResult<tiny_skia::Pixmap> {
    let size = tree.size();
    let w = ((size.width() * scale).round() as u32).max(1);
    let h = ((size.height() * scale).round() as u32).max(1);

    let mut pixmap = tiny_skia::Pixmap::new(w, h)
        .ok_or_else(|| ScoutError::render("failed to create pixmap"))?;

    pixmap.fill(tiny_skia::Color::WHITE);
    resvg::render(tree, tiny_skia::Transform::from_scale(scale, scale), &mut pixmap.as_mut());
    Ok(pixmap)
}

fn encode_png(pixmap: &tiny_skia::Pixmap) -> ScoutResult<Vec<u8>> {
    pixmap
        .encode_png()
        .map_err(|e| ScoutError::render(format!("PNG encoding failed: {e}")))
}

fn encode_webp(pixmap: &tiny_skia::Pixmap) -> ScoutResult<Vec<u8>> {
    let mut out = Vec::new();
    WebPEncoder::new_lossless(&mut out)
        .encode(pixmap.data(), pixmap.width(), pixmap.height(), ExtendedColorType::Rgba8)
        .map_err(|e| ScoutError::render(format!("WebP encoding failed: {e}")))?;
    Ok(out)
}

/// Rasterize `svg` and encode it under `cfg.max_image_bytes`.
pub fn encode_bounded(svg: &str, cfg: &ChartConfig) -> ScoutResult<ChartImage> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)
        .map_err(|e| ScoutError::render(format!("SVG parse failed: {e}")))?;

    let budget = cfg.max_image_bytes;
    let longest_base = tree.size().width().max(tree.size().height());

    let mut scale = 1.0f32;
    let mut pixmap = rasterize(&tree, scale)?;
    let mut png = encode_png(&pixmap)?;
    debug!(stage = ?EncodeStage::Initial, bytes = png.len(), budget, "encoded chart");

    if png.len() <= budget {
        return Ok(ChartImage { bytes: png, mime: ImageMime::Png, truncated: false });
    }

    // Shrink by a fixed factor per step until under budget or at the floor.
    loop {
        let next = scale * cfg.shrink_factor as f32;
        if (longest_base * next) < cfg.min_dimension as f32 {
            break;
        }
        scale = next;
        pixmap = rasterize(&tree, scale)?;
        png = encode_png(&pixmap)?;
        debug!(
            stage = ?EncodeStage::Downscale,
            width = pixmap.width(),
            height = pixmap.height(),
            bytes = png.len(),
            "re-encoded chart"
        );
        if png.len() <= budget {
            return Ok(ChartImage { bytes: png, mime: ImageMime::Png, truncated: false });
        }
    }

    // Still over budget at the floor: try the more compact format.
    let webp = encode_webp(&pixmap)?;
    debug!(stage = ?EncodeStage::WebpFallback, bytes = webp.len(), "re-encoded chart as webp");
    if webp.len() <= budget {
        return Ok(ChartImage { bytes: webp, mime: ImageMime::Webp, truncated: false });
    }

    // Corrupt-truncation last resort. The flag is the contract: callers and
    // telemetry can see this was not a real image.
    error!(
        stage = ?EncodeStage::Truncate,
        png_bytes = png.len(),
        webp_bytes = webp.len(),
        budget,
        "chart cannot fit size budget; truncating to a corrupt image"
    );
    let (mut bytes, mime) = if webp.len() < png.len() {
        (webp, ImageMime::Webp)
    } else {
        (png, ImageMime::Png)
    };
    bytes.truncate(budget);
    Ok(ChartImage { bytes, mime, truncated: true })
}
