/// Failure decoding or exporting one archive. Nothing persists across
/// files, so a value of this type always describes a single decode
/// attempt.
#[derive(Debug, thiserror::Error)]
pub enum SpaError {
	#[error("not a spa archive (bad signature)")]
	BadSignature,
	#[error("unsupported version tag \"{}\"", tag(.0))]
	UnsupportedVersion([u8; 4]),
	#[error("header truncated")]
	TruncatedHeader,
	#[error("texture {0}: record truncated")]
	TruncatedRecord(usize),
	#[error("texture data too short ({got} bytes, format needs {needed})")]
	ShortTextureData { needed: usize, got: usize },
	#[error("palette index {slot} out of range ({entries} entries)")]
	PaletteIndex { slot: usize, entries: usize },
	#[error(transparent)]
	Io(#[from] std::io::Error),
	#[error("png encoding failed: {0}")]
	Png(#[from] png::EncodingError),
}

fn tag(bytes: &[u8; 4]) -> String {
	bytes.escape_ascii().to_string()
}
