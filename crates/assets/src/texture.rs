use std::path::Path;

use crate::store::{AssetError, CubemapData, TextureData};

/// Decode an image file to RGBA8.
pub fn load_texture(path: impl AsRef<Path>) -> Result<TextureData, AssetError> {
    let image = image::open(path.as_ref())
        .map_err(|e| AssetError::Image(format!("{}: {e}", path.as_ref().display())))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(TextureData {
        width,
        height,
        pixels: image.into_raw(),
    })
}

/// Decode six cubemap faces (px, nx, py, ny, pz, nz order).
///
/// All faces must be square and share one size; anything else is a malformed
/// sky and is rejected rather than guessed at.
pub fn load_cubemap(paths: &[impl AsRef<Path>; 6]) -> Result<CubemapData, AssetError> {
    let mut faces: Vec<TextureData> = Vec::with_capacity(6);
    for path in paths {
        faces.push(load_texture(path)?);
    }

    let size = faces[0].width;
    for (index, face) in faces.iter().enumerate() {
        if face.width != face.height || face.width != size {
            return Err(AssetError::CubemapShape(format!(
                "face {index} is {}x{}, expected {size}x{size}",
                face.width, face.height
            )));
        }
    }

    let mut out = CubemapData {
        size,
        faces: Default::default(),
    };
    for (slot, face) in out.faces.iter_mut().zip(faces) {
        *slot = face.pixels;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn write_png(dir: &Path, name: &str, width: u32, height: u32, shade: u8) -> std::path::PathBuf {
        let path = dir.join(name);
        let img = ImageBuffer::from_pixel(width, height, Rgba([shade, shade, shade, 255]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn texture_decodes_to_rgba8() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "t.png", 4, 2, 128);
        let tex = load_texture(&path).unwrap();
        assert_eq!((tex.width, tex.height), (4, 2));
        assert_eq!(tex.pixels.len(), 4 * 2 * 4);
        assert_eq!(&tex.pixels[..4], &[128, 128, 128, 255]);
    }

    #[test]
    fn missing_texture_is_an_error() {
        assert!(load_texture("definitely/not/here.png").is_err());
    }

    #[test]
    fn cubemap_requires_matching_square_faces() {
        let dir = tempfile::tempdir().unwrap();
        let names = ["px", "nx", "py", "ny", "pz", "nz"];
        let good: Vec<_> = names
            .iter()
            .map(|n| write_png(dir.path(), &format!("{n}.png"), 8, 8, 10))
            .collect();
        let cube = load_cubemap(&[
            &good[0], &good[1], &good[2], &good[3], &good[4], &good[5],
        ])
        .unwrap();
        assert_eq!(cube.size, 8);
        assert!(cube.faces.iter().all(|f| f.len() == 8 * 8 * 4));

        // One mismatched face poisons the cubemap.
        let bad = write_png(dir.path(), "bad.png", 8, 4, 10);
        let result = load_cubemap(&[&good[0], &good[1], &good[2], &good[3], &good[4], &bad]);
        assert!(matches!(result, Err(AssetError::CubemapShape(_))));
    }
}
