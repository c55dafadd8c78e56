//! SVG rasterisation and PNG encoding.

use png::{BitDepth, ColorType, Compression, Encoder, FilterType};

use crate::SnapshotError;

/// RGBA -> PNG bytes. Filter and compression are pinned so the same input
/// always yields the same file.
pub fn encode_rgba_to_png_bytes(
    width: u32,
    height: u32,
    rgba: &[u8],
) -> Result<Vec<u8>, png::EncodingError> {
    let mut buf = Vec::new();
    {
        let mut enc = Encoder::new(&mut buf, width, height);
        enc.set_color(ColorType::Rgba);
        enc.set_depth(BitDepth::Eight);
        enc.set_filter(FilterType::NoFilter);
        enc.set_compression(Compression::Default);
        let mut writer = enc.write_header()?;
        writer.write_image_data(rgba)?;
    }
    Ok(buf)
}

/// Render an SVG document into a pixmap. Text uses the fonts installed on the system.
pub fn rasterize(svg: &str, width: u32, height: u32) -> Result<tiny_skia::Pixmap, SnapshotError> {
    let mut opt = usvg::Options::default();
    let mut fontdb = usvg::fontdb::Database::new();
    fontdb.load_system_fonts();
    opt.fontdb = std::sync::Arc::new(fontdb);
    let tree = usvg::Tree::from_str(svg, &opt)?;
    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).ok_or(SnapshotError::Pixmap(width, height))?;
    let mut pm = pixmap.as_mut();
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pm);
    Ok(pixmap)
}

pub fn svg_to_png(svg: &str, width: u32, height: u32) -> Result<Vec<u8>, SnapshotError> {
    let pixmap = rasterize(svg, width, height)?;
    Ok(encode_rgba_to_png_bytes(
        pixmap.width(),
        pixmap.height(),
        pixmap.data(),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"><rect width="4" height="4" fill="#ff0000"/></svg>"##;

    #[test]
    fn encoding_is_deterministic() {
        let rgba = vec![255u8; 4 * 4 * 4];
        let a = encode_rgba_to_png_bytes(4, 4, &rgba).unwrap();
        let b = encode_rgba_to_png_bytes(4, 4, &rgba).unwrap();
        assert_eq!(a, b);
        assert_eq!(&a[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn rasterizes_fills() {
        let pixmap = rasterize(SQUARE, 4, 4).unwrap();
        let px = pixmap.pixel(1, 1).unwrap();
        assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (255, 0, 0, 255));
    }

    #[test]
    fn zero_sized_canvas_is_an_error() {
        assert!(matches!(rasterize(SQUARE, 0, 4), Err(SnapshotError::Pixmap(0, 4))));
    }

    #[test]
    fn broken_svg_is_an_error() {
        assert!(matches!(rasterize("<svg", 4, 4), Err(SnapshotError::Svg(_))));
    }
}
