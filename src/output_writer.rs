use std::{
	fs,
	io::BufWriter,
	path::{Path, PathBuf},
};

use crate::error::SpaError;

/// Writes decoded assets into a single destination directory.
#[derive(Clone)]
pub struct OutputWriter {
	path: PathBuf,
}

impl OutputWriter {
	/// Creates the destination directory (and parents) up front.
	pub fn new(dir: impl AsRef<Path>) -> Result<Self, SpaError> {
		let mut path = dir.as_ref().to_path_buf();
		fs::create_dir_all(&path)?;
		path.push("_");
		Ok(OutputWriter { path })
	}

	fn set_output_path(&mut self, asset_name: &str, ext: &str) -> &Path {
		self.path.set_file_name(asset_name);
		self.path.set_extension(ext.trim_start_matches('.'));
		&self.path
	}

	pub fn write_png(
		&mut self, asset_name: &str, width: u32, height: u32, rgba: impl AsRef<[u8]>,
	) -> Result<(), SpaError> {
		save_png(self.set_output_path(asset_name, "png"), rgba.as_ref(), width, height)
	}
}

fn save_png(path: &Path, data: &[u8], width: u32, height: u32) -> Result<(), SpaError> {
	let file = BufWriter::new(fs::File::create(path)?);
	let mut encoder = png::Encoder::new(file, width, height);
	encoder.set_color(png::ColorType::Rgba);
	encoder.set_depth(png::BitDepth::Eight);
	let mut writer = encoder.write_header()?;
	writer.write_image_data(data)?;
	writer.finish()?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn output_paths() {
		let mut writer = OutputWriter {
			path: Path::new("output/spl/_").to_path_buf(),
		};
		assert_eq!(
			writer.set_output_path("texture-1", "png"),
			Path::new("output/spl/texture-1.png")
		);
		assert_eq!(
			writer.set_output_path("texture-2", ".png"),
			Path::new("output/spl/texture-2.png"),
			"leading dot should not double up"
		);
	}
}
