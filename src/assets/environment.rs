//! Radiance HDR decoding

use std::path::Path;

use image::ImageFormat;

use crate::{
    error::AssetError,
    gfx::resources::{EnvironmentMap, TextureMapping},
};

/// Decodes an `.hdr` file into an equirectangular reflection map
pub fn decode_environment(bytes: &[u8], path: &Path) -> Result<EnvironmentMap, AssetError> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Hdr).map_err(|source| {
        AssetError::Image {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let rgba = image.to_rgba32f();
    let (width, height) = rgba.dimensions();
    log::debug!("decoded '{}' ({width}x{height})", path.display());

    Ok(EnvironmentMap::new(width, height, rgba.into_raw())
        .with_mapping(TextureMapping::EquirectangularReflection))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{DynamicImage, Rgb32FImage};
    use std::io::Cursor;

    /// Encodes a small gradient as Radiance HDR
    pub(crate) fn hdr_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = Rgb32FImage::from_fn(width, height, |x, y| {
            image::Rgb([x as f32, y as f32, 0.5])
        });
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgb32F(image)
            .write_to(&mut bytes, ImageFormat::Hdr)
            .expect("hdr encode");
        bytes.into_inner()
    }

    #[test]
    fn decodes_and_tags_equirectangular() {
        let bytes = hdr_bytes(8, 4);
        let map = decode_environment(&bytes, Path::new("gradient.hdr")).expect("decode");

        assert_eq!((map.width, map.height), (8, 4));
        assert_eq!(map.pixels.len(), 8 * 4 * 4);
        assert_eq!(map.mapping, TextureMapping::EquirectangularReflection);

        // RGBE keeps about 8 bits of mantissa
        let [r, g, b] = map.texel(3, 2);
        assert!((r - 3.0).abs() < 0.05);
        assert!((g - 2.0).abs() < 0.05);
        assert!((b - 0.5).abs() < 0.01);
    }

    #[test]
    fn garbage_is_an_image_error() {
        let error = decode_environment(b"not an hdr", Path::new("bad.hdr")).unwrap_err();
        assert!(matches!(error, AssetError::Image { .. }));
        assert!(error.to_string().contains("bad.hdr"));
    }
}
