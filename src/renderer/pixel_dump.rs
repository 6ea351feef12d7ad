use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use ash::vk;
use log::info;

/// Format of the staging image when blit converts for us
pub const BLIT_DST_FORMAT: vk::Format = vk::Format::R8G8B8A8_UNORM;

/// Source image bytes per pixel. Both blit and copy produce 4 channel, 8 bit texels.
const SRC_BYTES_PER_PIXEL: usize = 4;

/// Formats that store blue before red. Only matter when we copy, blit converts channel order itself.
const BGR_FORMATS: [vk::Format; 3] = [
  vk::Format::B8G8R8A8_SRGB,
  vk::Format::B8G8R8A8_UNORM,
  vk::Format::B8G8R8A8_SNORM,
];

/// Can we blit from swapchain image into `BLIT_DST_FORMAT` linear image?
/// - `src_props` - properties of the swapchain format,
/// - `dst_props` - properties of `BLIT_DST_FORMAT`.
pub fn blit_support(src_props: &vk::FormatProperties, dst_props: &vk::FormatProperties) -> bool {
  let src_ok = src_props
    .optimal_tiling_features
    .contains(vk::FormatFeatureFlags::BLIT_SRC);
  if !src_ok {
    info!("Device does not support blitting from optimal tiled images, using copy instead of blit!");
  }

  let dst_ok = dst_props
    .linear_tiling_features
    .contains(vk::FormatFeatureFlags::BLIT_DST);
  if !dst_ok {
    info!("Device does not support blitting to linear tiled images, using copy instead of blit!");
  }

  src_ok && dst_ok
}

pub fn needs_channel_swizzle(supports_blit: bool, src_format: vk::Format) -> bool {
  !supports_blit && BGR_FORMATS.contains(&src_format)
}

fn pixel_dump_header(width: u32, height: u32) -> String {
  format!("P6\n{}\n{}\n255\n", width, height)
}

/// Write binary PPM (`P6`). `pixels` holds `height` rows, each starting `row_pitch`
/// bytes after the previous one, 4 bytes per pixel. Only RGB is written, padding and alpha are dropped.
pub fn write_pixel_dump<W: Write>(
  out: &mut W,
  width: u32,
  height: u32,
  pixels: &[u8],
  row_pitch: usize,
  swizzle: bool,
) -> io::Result<()> {
  let (width, height) = (width as usize, height as usize);
  let row_bytes = width * SRC_BYTES_PER_PIXEL;
  if row_pitch < row_bytes {
    return Err(io::Error::new(
      io::ErrorKind::InvalidInput,
      format!("Row pitch {} is smaller than row of {} bytes", row_pitch, row_bytes),
    ));
  }
  let required = match height {
    0 => 0,
    h => (h - 1) * row_pitch + row_bytes,
  };
  if pixels.len() < required {
    return Err(io::Error::new(
      io::ErrorKind::InvalidInput,
      format!(
        "Pixel data has {} bytes, {}x{} image with row pitch {} needs {}",
        pixels.len(),
        width,
        height,
        row_pitch,
        required
      ),
    ));
  }

  out.write_all(pixel_dump_header(width as u32, height as u32).as_bytes())?;

  let mut scanline = Vec::<u8>::with_capacity(width * 3);
  for y in 0..height {
    let row_start = y * row_pitch;
    let row = &pixels[row_start..row_start + row_bytes];

    scanline.clear();
    for texel in row.chunks_exact(SRC_BYTES_PER_PIXEL) {
      if swizzle {
        scanline.extend_from_slice(&[texel[2], texel[1], texel[0]]);
      } else {
        scanline.extend_from_slice(&texel[..3]);
      }
    }
    out.write_all(&scanline)?;
  }

  Ok(())
}

pub fn write_pixel_dump_file(
  path: &Path,
  width: u32,
  height: u32,
  pixels: &[u8],
  row_pitch: usize,
  swizzle: bool,
) -> io::Result<()> {
  let file = File::create(path)?;
  let mut writer = BufWriter::new(file);
  write_pixel_dump(&mut writer, width, height, pixels, row_pitch, swizzle)?;
  // into_inner() flushes, sync_all() reports write-back errors before the file is closed
  writer.into_inner()?.sync_all()
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Split into (width, height, max value, data)
  fn parse_pixel_dump(bytes: &[u8]) -> (usize, usize, usize, &[u8]) {
    let mut fields = Vec::new();
    let mut offset = 0;
    while fields.len() < 4 {
      let end = offset + bytes[offset..].iter().position(|&b| b == b'\n').unwrap();
      fields.push(std::str::from_utf8(&bytes[offset..end]).unwrap().to_string());
      offset = end + 1;
    }
    assert_eq!(fields[0], "P6");
    (
      fields[1].parse().unwrap(),
      fields[2].parse().unwrap(),
      fields[3].parse().unwrap(),
      &bytes[offset..],
    )
  }

  fn format_props(
    optimal: vk::FormatFeatureFlags,
    linear: vk::FormatFeatureFlags,
  ) -> vk::FormatProperties {
    vk::FormatProperties {
      linear_tiling_features: linear,
      optimal_tiling_features: optimal,
      buffer_features: vk::FormatFeatureFlags::empty(),
    }
  }

  #[test]
  fn header_matches_ppm() {
    let mut out = Vec::new();
    write_pixel_dump(&mut out, 0, 0, &[], 0, false).unwrap();
    assert_eq!(out, b"P6\n0\n0\n255\n");
  }

  #[test]
  fn two_pixels_blit_path() {
    let pixels = [255, 0, 0, 255, 0, 255, 0, 255];
    let mut out = Vec::new();
    write_pixel_dump(&mut out, 2, 1, &pixels, 8, false).unwrap();

    let (w, h, max, data) = parse_pixel_dump(&out);
    assert_eq!((w, h, max), (2, 1, 255));
    assert_eq!(data, &[0xFF, 0x00, 0x00, 0x00, 0xFF, 0x00]);
  }

  #[test]
  fn swizzle_reverses_bgr() {
    let pixels = [0x10, 0x20, 0x30, 0xFF];
    let mut out = Vec::new();
    write_pixel_dump(&mut out, 1, 1, &pixels, 4, true).unwrap();

    let (_, _, _, data) = parse_pixel_dump(&out);
    assert_eq!(data, &[0x30, 0x20, 0x10]);
  }

  #[test]
  fn row_padding_never_leaks_into_output() {
    let (width, height, row_pitch) = (3usize, 4usize, 64usize);
    let mut pixels = vec![0xEEu8; row_pitch * height]; // padding marker
    let mut expected = Vec::new();
    for y in 0..height {
      for x in 0..width {
        let value = [(y * 10 + x) as u8, (x * 7) as u8, (y * 3) as u8, 0xFF];
        let start = y * row_pitch + x * 4;
        pixels[start..start + 4].copy_from_slice(&value);
        expected.extend_from_slice(&value[..3]);
      }
    }

    let mut out = Vec::new();
    write_pixel_dump(&mut out, width as u32, height as u32, &pixels, row_pitch, false).unwrap();

    let (w, h, _, data) = parse_pixel_dump(&out);
    assert_eq!((w, h), (width, height));
    assert_eq!(data.len(), width * height * 3);
    assert_eq!(data, expected.as_slice());
  }

  #[test]
  fn last_row_does_not_need_padding() {
    // 2 rows, pitch 16, but only 16 + 8 bytes mapped
    let pixels = vec![1u8; 24];
    let mut out = Vec::new();
    assert!(write_pixel_dump(&mut out, 2, 2, &pixels, 16, false).is_ok());
  }

  #[test]
  fn too_short_pixel_data_is_rejected() {
    let pixels = vec![0u8; 20];
    let mut out = Vec::new();
    let err = write_pixel_dump(&mut out, 2, 2, &pixels, 16, false).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    assert!(out.is_empty());

    let err = write_pixel_dump(&mut out, 4, 1, &[0u8; 16], 8, false).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
  }

  #[test]
  fn swizzle_only_on_copy_path_with_bgr_source() {
    assert!(needs_channel_swizzle(false, vk::Format::B8G8R8A8_UNORM));
    assert!(needs_channel_swizzle(false, vk::Format::B8G8R8A8_SRGB));
    assert!(needs_channel_swizzle(false, vk::Format::B8G8R8A8_SNORM));
    assert!(!needs_channel_swizzle(true, vk::Format::B8G8R8A8_UNORM));
    assert!(!needs_channel_swizzle(false, vk::Format::R8G8B8A8_UNORM));
  }

  #[test]
  fn blit_needs_both_features() {
    let src_ok = format_props(vk::FormatFeatureFlags::BLIT_SRC, vk::FormatFeatureFlags::empty());
    let dst_ok = format_props(vk::FormatFeatureFlags::empty(), vk::FormatFeatureFlags::BLIT_DST);
    let nothing = format_props(
      vk::FormatFeatureFlags::empty(),
      vk::FormatFeatureFlags::empty(),
    );

    assert!(blit_support(&src_ok, &dst_ok));
    assert!(!blit_support(&nothing, &dst_ok));
    assert!(!blit_support(&src_ok, &nothing));
    // BLIT_SRC under linear tiling does not count
    let wrong_tiling =
      format_props(vk::FormatFeatureFlags::empty(), vk::FormatFeatureFlags::BLIT_SRC);
    assert!(!blit_support(&wrong_tiling, &dst_ok));
  }

  #[test]
  fn writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("screenshot.ppm");
    let pixels = [255, 0, 0, 255, 0, 255, 0, 255];

    write_pixel_dump_file(&path, 2, 1, &pixels, 8, false).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes, b"P6\n2\n1\n255\n\xFF\x00\x00\x00\xFF\x00");
  }

  #[test]
  fn large_file_is_complete_on_return() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("screenshot.ppm");
    let (width, height) = (256u32, 64u32);
    let pixels = vec![0x7Fu8; (width * height * 4) as usize];

    write_pixel_dump_file(&path, width, height, &pixels, width as usize * 4, false).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let (w, h, _, data) = parse_pixel_dump(&bytes);
    assert_eq!((w, h), (256, 64));
    assert_eq!(data.len(), 256 * 64 * 3);
    assert!(data.iter().all(|&b| b == 0x7F));
  }

  #[test]
  fn unwritable_path_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing-dir").join("screenshot.ppm");
    let err = write_pixel_dump_file(&path, 1, 1, &[0, 0, 0, 0], 4, false).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::NotFound);
  }
}
