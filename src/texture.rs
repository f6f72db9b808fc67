//! Pixel-level decoding: palettes, the five packed pixel encodings, and
//! mirrored-tiling expansion.

use crate::error::SpaError;
use crate::output_writer::OutputWriter;

/// Pixel encoding declared in a texture record's info word.
///
/// The set is closed; any other value in the low 4 bits ends up as
/// `Unknown` and decodes to a fully transparent raster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
	/// 8bpp, 3 bits of alpha over a 32-colour palette.
	Alpha3Index5,
	/// 2bpp, four palette indices per byte.
	Palette4,
	/// 4bpp, two palette indices per byte.
	Palette16,
	/// 8bpp, 5 bits of alpha over an 8-colour palette.
	Alpha5Index3,
	/// 16bpp direct colour, no palette.
	Direct,
	Unknown(u8),
}

/// Geometry and addressing flags unpacked from a record's info word.
#[derive(Clone, Copy, Debug)]
pub struct TextureInfo {
	pub format: PixelFormat,
	pub width: u32,
	pub height: u32,
	pub repeat_s: bool,
	pub repeat_t: bool,
	pub mirror_s: bool,
	pub mirror_t: bool,
}

impl TextureInfo {
	pub fn from_word(info: u16) -> TextureInfo {
		let format = match info & 0xF {
			1 => PixelFormat::Alpha3Index5,
			2 => PixelFormat::Palette4,
			3 => PixelFormat::Palette16,
			6 => PixelFormat::Alpha5Index3,
			7 => PixelFormat::Direct,
			n => PixelFormat::Unknown(n as u8),
		};
		TextureInfo {
			format,
			width: 8 << (info >> 4 & 0xF),
			height: 8 << (info >> 8 & 0xF),
			repeat_s: info & 1 << 12 != 0,
			repeat_t: info & 1 << 13 != 0,
			mirror_s: info & 1 << 14 != 0,
			mirror_t: info & 1 << 15 != 0,
		}
	}
}

/// Ordered RGBA colour table, rebuilt for every record.
pub struct Palette(Vec<[u8; 4]>);

impl Palette {
	/// Decodes 15-bit packed colours, two bytes per entry, scaling each
	/// 5-bit channel to the full 8-bit range. Alpha starts opaque; a
	/// trailing odd byte is ignored.
	pub fn parse(data: &[u8]) -> Palette {
		Palette(
			data.chunks_exact(2)
				.map(|pair| {
					let (lo, hi) = (pair[0], pair[1]);
					let b = hi >> 2 & 0x1F;
					let g = (hi & 0b11) << 3 | lo >> 5;
					let r = lo & 0x1F;
					[scale5(r), scale5(g), scale5(b), 255]
				})
				.collect(),
		)
	}

	fn get(&self, slot: usize) -> Result<[u8; 4], SpaError> {
		self.0.get(slot).copied().ok_or(SpaError::PaletteIndex {
			slot,
			entries: self.0.len(),
		})
	}
}

fn scale5(value: u8) -> u8 {
	(value as u32 * 255 / 31) as u8
}

fn scale_alpha(numerator: u8) -> u8 {
	// numerators past 31 pin to opaque
	(numerator as u32 * 255 / 31).min(255) as u8
}

/// An owned RGBA raster, row-major, top-left origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
	pub width: u32,
	pub height: u32,
	pub pixels: Vec<u8>,
}

impl Texture {
	/// A fully transparent black raster.
	pub fn new(width: u32, height: u32) -> Texture {
		Texture {
			width,
			height,
			pixels: vec![0; width as usize * height as usize * 4],
		}
	}

	fn put(&mut self, pixel: usize, rgba: [u8; 4]) {
		self.pixels[pixel * 4..pixel * 4 + 4].copy_from_slice(&rgba);
	}

	/// Appends a horizontally-flipped copy to the right of each row,
	/// doubling the width.
	#[must_use]
	pub fn mirrored_s(&self) -> Texture {
		let row = self.width as usize * 4;
		let mut pixels = Vec::with_capacity(self.pixels.len() * 2);
		for src in self.pixels.chunks_exact(row) {
			pixels.extend_from_slice(src);
			for rgba in src.chunks_exact(4).rev() {
				pixels.extend_from_slice(rgba);
			}
		}
		Texture {
			width: self.width * 2,
			height: self.height,
			pixels,
		}
	}

	/// Appends a vertically-flipped copy below, doubling the height.
	#[must_use]
	pub fn mirrored_t(&self) -> Texture {
		let row = self.width as usize * 4;
		let mut pixels = Vec::with_capacity(self.pixels.len() * 2);
		pixels.extend_from_slice(&self.pixels);
		for src in self.pixels.chunks_exact(row).rev() {
			pixels.extend_from_slice(src);
		}
		Texture {
			width: self.width,
			height: self.height * 2,
			pixels,
		}
	}

	pub fn save_as(&self, name: &str, output: &mut OutputWriter) -> Result<(), SpaError> {
		output.write_png(name, self.width, self.height, &self.pixels)
	}
}

/// Unpacks one texture's packed pixel data into an RGBA raster.
///
/// Pixels fill in row-major order; how many source bytes feed each step
/// depends on the format. An `Unknown` format leaves the raster fully
/// transparent.
pub fn decode(
	info: &TextureInfo, color_zero_transparent: bool, data: &[u8], palette: &Palette,
) -> Result<Texture, SpaError> {
	let mut texture = Texture::new(info.width, info.height);
	let num_pixels = info.width as usize * info.height as usize;

	match info.format {
		PixelFormat::Alpha3Index5 => {
			for (pixel, &byte) in take(data, num_pixels)?.iter().enumerate() {
				let slot = byte % 32;
				let mut rgba = palette.get(slot as usize)?;
				rgba[3] = scale_alpha(byte - slot);
				texture.put(pixel, rgba);
			}
		}
		PixelFormat::Palette4 => {
			for (step, &byte) in take(data, num_pixels / 4)?.iter().enumerate() {
				for sub in 0..4 {
					let slot = (byte >> (2 * sub) & 0b11) as usize;
					let mut rgba = palette.get(slot)?;
					if slot == 0 && color_zero_transparent {
						rgba[3] = 0;
					}
					texture.put(step * 4 + sub, rgba);
				}
			}
		}
		PixelFormat::Palette16 => {
			for (step, &byte) in take(data, num_pixels / 2)?.iter().enumerate() {
				for sub in 0..2 {
					let slot = (byte >> (4 * sub) & 0b1111) as usize;
					let mut rgba = palette.get(slot)?;
					if slot == 0 && color_zero_transparent {
						rgba[3] = 0;
					}
					texture.put(step * 2 + sub, rgba);
				}
			}
		}
		PixelFormat::Alpha5Index3 => {
			for (pixel, &byte) in take(data, num_pixels)?.iter().enumerate() {
				let slot = byte % 8;
				let mut rgba = palette.get(slot as usize)?;
				rgba[3] = scale_alpha(byte - slot);
				texture.put(pixel, rgba);
			}
		}
		PixelFormat::Direct => {
			for (pixel, pair) in take(data, num_pixels * 2)?.chunks_exact(2).enumerate() {
				let (lo, hi) = (pair[0], pair[1]);
				// direct colour keeps its raw 5-bit channel values; only
				// palette entries get rescaled to 8 bits
				let r = hi >> 2 & 0x1F;
				let g = (hi & 0b11) | lo >> 5;
				let b = lo & 0x1F;
				texture.put(pixel, [r, g, b, 255]);
			}
		}
		PixelFormat::Unknown(_) => {}
	}

	Ok(texture)
}

fn take(data: &[u8], needed: usize) -> Result<&[u8], SpaError> {
	data.get(..needed).ok_or(SpaError::ShortTextureData {
		needed,
		got: data.len(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn info_word_fields() {
		// format 7, 16x32, mirror_s | mirror_t
		let info = TextureInfo::from_word(0x7 | 1 << 4 | 2 << 8 | 1 << 14 | 1 << 15);
		assert_eq!(info.format, PixelFormat::Direct);
		assert_eq!(info.width, 16);
		assert_eq!(info.height, 32);
		assert!(!info.repeat_s && !info.repeat_t);
		assert!(info.mirror_s && info.mirror_t);
	}

	#[test]
	fn palette_scales_five_bit_channels() {
		let palette = Palette::parse(&[0x1F, 0x00, 0xE0, 0x03, 0x00, 0x7C]);
		assert_eq!(palette.get(0).unwrap(), [255, 0, 0, 255]);
		assert_eq!(palette.get(1).unwrap(), [0, 255, 0, 255]);
		assert_eq!(palette.get(2).unwrap(), [0, 0, 255, 255]);
		assert!(palette.get(3).is_err());
	}

	fn info_for(format_bits: u16) -> TextureInfo {
		// 8x8, no flags
		TextureInfo::from_word(format_bits)
	}

	#[test]
	fn direct_colour_keeps_raw_channels() {
		let data: Vec<u8> = [0x00, 0x7C].repeat(64);
		let texture = decode(&info_for(7), false, &data, &Palette::parse(&[])).unwrap();
		assert_eq!(&texture.pixels[..4], [31, 0, 0, 255]);
	}

	#[test]
	fn alpha3_format_splits_index_and_alpha() {
		let palette = Palette::parse(&[0x1F, 0x00, 0xE0, 0x03]);
		let data = [0x21; 64]; // slot 1, alpha numerator 32
		let texture = decode(&info_for(1), false, &data, &palette).unwrap();
		assert_eq!(&texture.pixels[..4], [0, 255, 0, 255]);
	}

	#[test]
	fn alpha5_format_truncates_alpha_scale() {
		let palette = Palette::parse(&[0x1F, 0x00, 0xE0, 0x03]);
		let data = [0x09; 64]; // slot 1, alpha numerator 8
		let texture = decode(&info_for(6), false, &data, &palette).unwrap();
		// 8 * 255 / 31 truncates to 65
		assert_eq!(&texture.pixels[..4], [0, 255, 0, 65]);
	}

	#[test]
	fn colour_zero_transparency() {
		let palette = Palette::parse(&[0x1F, 0x00, 0xE0, 0x03, 0x00, 0x7C, 0xFF, 0xFF]);
		let data = [0b11_10_01_00; 16]; // indices 0,1,2,3 per byte

		let transparent = decode(&info_for(2), true, &data, &palette).unwrap();
		assert_eq!(transparent.pixels[3], 0);
		assert_eq!(transparent.pixels[7], 255);

		let opaque = decode(&info_for(2), false, &data, &palette).unwrap();
		assert_eq!(opaque.pixels[3], 255);
	}

	#[test]
	fn palette16_uses_low_nibble_first() {
		let palette = Palette::parse(&[0x1F, 0x00, 0xE0, 0x03]);
		let data = [0x10; 32]; // low nibble 0, high nibble 1
		let texture = decode(&info_for(3), false, &data, &palette).unwrap();
		assert_eq!(&texture.pixels[..4], [255, 0, 0, 255]);
		assert_eq!(&texture.pixels[4..8], [0, 255, 0, 255]);
	}

	#[test]
	fn unknown_format_stays_transparent() {
		let texture = decode(&info_for(4), false, &[0xFF; 64], &Palette::parse(&[])).unwrap();
		assert!(texture.pixels.iter().all(|&b| b == 0));
	}

	#[test]
	fn short_data_is_an_error() {
		let result = decode(&info_for(7), false, &[0x00], &Palette::parse(&[]));
		assert!(matches!(
			result,
			Err(SpaError::ShortTextureData { needed: 128, got: 1 })
		));
	}

	#[test]
	fn out_of_range_palette_slot_is_an_error() {
		let result = decode(&info_for(1), false, &[0x05; 64], &Palette::parse(&[0x00, 0x00]));
		assert!(matches!(
			result,
			Err(SpaError::PaletteIndex { slot: 5, entries: 1 })
		));
	}

	fn numbered_2x2() -> Texture {
		let mut texture = Texture::new(2, 2);
		for (i, rgba) in [[1, 1, 1, 255], [2, 2, 2, 255], [3, 3, 3, 255], [4, 4, 4, 255]]
			.into_iter()
			.enumerate()
		{
			texture.put(i, rgba);
		}
		texture
	}

	#[test]
	fn mirror_s_doubles_width() {
		let mirrored = numbered_2x2().mirrored_s();
		assert_eq!((mirrored.width, mirrored.height), (4, 2));
		let values: Vec<u8> = mirrored.pixels.chunks_exact(4).map(|px| px[0]).collect();
		assert_eq!(values, [1, 2, 2, 1, 3, 4, 4, 3]);
	}

	#[test]
	fn mirror_t_doubles_height() {
		let mirrored = numbered_2x2().mirrored_t();
		assert_eq!((mirrored.width, mirrored.height), (2, 4));
		let values: Vec<u8> = mirrored.pixels.chunks_exact(4).map(|px| px[0]).collect();
		assert_eq!(values, [1, 2, 3, 4, 3, 4, 1, 2]);
	}

	#[test]
	fn both_mirrors_tile_quadrants() {
		let mirrored = numbered_2x2().mirrored_s().mirrored_t();
		assert_eq!((mirrored.width, mirrored.height), (4, 4));
		let values: Vec<u8> = mirrored.pixels.chunks_exact(4).map(|px| px[0]).collect();
		assert_eq!(values, [1, 2, 2, 1, 3, 4, 4, 3, 3, 4, 4, 3, 1, 2, 2, 1]);
	}
}
