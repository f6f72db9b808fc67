//! The spa archive container: header, texture records, and the
//! marker-driven scan over the texture block.
//!
//! An archive holds a particle block followed by a texture block. Only
//! the texture block is decoded; the particle data is skipped entirely
//! by seeking straight to the texture block offset.

use crate::Reader;
use crate::error::SpaError;
use crate::output_writer::OutputWriter;
use crate::texture::{self, Palette, PixelFormat, Texture, TextureInfo};

pub const SIGNATURE: [u8; 4] = *b" APS";
pub const TEXTURE_MARKER: [u8; 4] = *b" TPS";
/// The only version tag this decoder understands.
pub const SUPPORTED_VERSION: [u8; 4] = *b"12_1";

/// Global counts and block layout from the front of the file.
///
/// The declared counts are advisory: the scan over the texture block is
/// what decides how many textures actually come out, and the two are not
/// cross-checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
	pub version: [u8; 4],
	pub particles: u16,
	pub textures: u16,
	pub particle_block_length: u32,
	pub texture_block_length: u32,
	pub texture_block_offset: u32,
}

impl Header {
	pub fn parse(reader: &mut Reader, accept_any_version: bool) -> Result<Header, SpaError> {
		let signature = reader.try_array::<4>().ok_or(SpaError::BadSignature)?;
		if signature != SIGNATURE {
			return Err(SpaError::BadSignature);
		}
		let version = reader.try_array::<4>().ok_or(SpaError::TruncatedHeader)?;
		if version != SUPPORTED_VERSION && !accept_any_version {
			return Err(SpaError::UnsupportedVersion(version));
		}
		Self::try_parse_fields(reader, version).ok_or(SpaError::TruncatedHeader)
	}

	fn try_parse_fields(reader: &mut Reader, version: [u8; 4]) -> Option<Header> {
		let particles = reader.try_u16()?;
		let textures = reader.try_u16()?;
		reader.try_skip(4)?; // padding
		let particle_block_length = reader.try_u32()?;
		let texture_block_length = reader.try_u32()?;
		let texture_block_offset = reader.try_u32()?;
		reader.try_skip(4)?; // padding

		Some(Header {
			version,
			particles,
			textures,
			particle_block_length,
			texture_block_length,
			texture_block_offset,
		})
	}
}

/// One texture record: decomposed info word, payload metadata, and the
/// raw texture/palette bytes. Lives only while its texture is decoded.
pub struct TextureRecord<'a> {
	pub info: TextureInfo,
	pub color_zero_transparent: bool,
	/// Where the palette sits according to the record. Palette bytes
	/// actually follow the texture bytes in-stream, so this is metadata
	/// only and never used for seeking.
	pub palette_offset: u32,
	pub total_size: u32,
	pub texture_data: &'a [u8],
	pub palette_data: &'a [u8],
}

impl<'a> TextureRecord<'a> {
	/// Parses the fields after an already-consumed `" TPS"` marker.
	fn parse(reader: &mut Reader<'a>, index: usize) -> Result<TextureRecord<'a>, SpaError> {
		Self::try_parse(reader).ok_or(SpaError::TruncatedRecord(index))
	}

	fn try_parse(reader: &mut Reader<'a>) -> Option<TextureRecord<'a>> {
		let info = TextureInfo::from_word(reader.try_u16()?);
		let color_zero_transparent = reader.try_u16()? != 0;
		let texture_data_length = reader.try_u32()? as usize;
		let palette_offset = reader.try_u32()?;
		let palette_data_length = reader.try_u32()? as usize;
		let _four_by_four_offset = reader.try_u32()?;
		let four_by_four_data_length = reader.try_u32()? as usize;
		let total_size = reader.try_u32()?;

		let texture_data = reader.try_slice(texture_data_length)?;
		let palette_data = reader.try_slice(palette_data_length)?;
		// the 4x4 sub-block is consumed only to keep the stream positioned
		reader.try_skip(four_by_four_data_length)?;

		Some(TextureRecord {
			info,
			color_zero_transparent,
			palette_offset,
			total_size,
			texture_data,
			palette_data,
		})
	}
}

/// Options for one archive's decode.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParseOptions {
	/// Expand textures whose mirror flags are set into their tiled form.
	pub expand_mirrored: bool,
	/// Accept any version tag instead of just [`SUPPORTED_VERSION`].
	pub accept_any_version: bool,
}

/// A fully decoded archive: the header plus one raster per texture
/// record found by the scan, in file order.
pub struct Spa {
	pub header: Header,
	pub textures: Vec<Texture>,
}

impl Spa {
	pub fn parse(data: &[u8], options: ParseOptions) -> Result<Spa, SpaError> {
		let mut reader = Reader::new(data);
		let header = Header::parse(&mut reader, options.accept_any_version)?;

		// skip the particle data, only the textures are wanted
		reader.set_position(header.texture_block_offset as usize);

		let mut textures = Vec::new();
		while reader.try_array() == Some(TEXTURE_MARKER) {
			let record = TextureRecord::parse(&mut reader, textures.len() + 1)?;
			if let PixelFormat::Unknown(n) = record.info.format {
				eprintln!(
					"texture {}: unknown pixel format {n}, left transparent",
					textures.len() + 1
				);
			}

			let palette = Palette::parse(record.palette_data);
			let mut texture = texture::decode(
				&record.info,
				record.color_zero_transparent,
				record.texture_data,
				&palette,
			)?;
			if options.expand_mirrored {
				if record.info.mirror_s {
					texture = texture.mirrored_s();
				}
				if record.info.mirror_t {
					texture = texture.mirrored_t();
				}
			}
			textures.push(texture);
		}

		Ok(Spa { header, textures })
	}

	/// Writes each texture as `texture-<n>.png`, numbered from 1, and
	/// returns how many were written.
	pub fn save(&self, output: &mut OutputWriter) -> Result<usize, SpaError> {
		for (i, texture) in self.textures.iter().enumerate() {
			texture.save_as(&format!("texture-{}", i + 1), output)?;
		}
		Ok(self.textures.len())
	}
}
