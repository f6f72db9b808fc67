use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use spa_extract::SpaError;
use spa_extract::output_writer::OutputWriter;
use spa_extract::spa::{ParseOptions, Spa};

/// Extracts the embedded textures from spa particle archives as PNGs.
#[derive(Parser)]
#[command(name = "spa-extract", version)]
struct Cli {
	/// A .spa file, or a directory to search for .spa files
	input: PathBuf,

	/// Folder the per-archive output directories are created under
	/// (default: next to each input file)
	#[arg(short, long)]
	output: Option<PathBuf>,

	/// Double mirrored textures into their tiled form
	#[arg(short, long)]
	mirror: bool,

	/// Accept archives with an unrecognized version tag
	#[arg(long)]
	ignore_version: bool,
}

fn main() -> ExitCode {
	let cli = Cli::parse();

	let options = ParseOptions {
		expand_mirrored: cli.mirror,
		accept_any_version: cli.ignore_version,
	};

	if cli.input.is_dir() {
		let mut files = Vec::new();
		collect_spa_files(&cli.input, &mut files);
		if files.is_empty() {
			eprintln!("no .spa files found in {}", cli.input.display());
			return ExitCode::FAILURE;
		}
		files.sort();

		let mut failures = 0;
		for file in &files {
			if let Err(e) = extract_file(file, cli.output.as_deref(), options) {
				eprintln!("{}: {e}", file.display());
				failures += 1;
			}
		}
		if failures != 0 {
			ExitCode::FAILURE
		} else {
			ExitCode::SUCCESS
		}
	} else if cli.input.is_file() {
		match extract_file(&cli.input, cli.output.as_deref(), options) {
			Ok(_) => ExitCode::SUCCESS,
			Err(e) => {
				eprintln!("{}: {e}", cli.input.display());
				ExitCode::FAILURE
			}
		}
	} else {
		eprintln!("{} does not exist", cli.input.display());
		ExitCode::FAILURE
	}
}

fn collect_spa_files(dir: &Path, files: &mut Vec<PathBuf>) {
	let Ok(entries) = fs::read_dir(dir) else { return };
	for entry in entries.flatten() {
		let path = entry.path();
		if path.is_dir() {
			collect_spa_files(&path, files);
		} else if path
			.extension()
			.is_some_and(|ext| ext.eq_ignore_ascii_case("spa"))
		{
			files.push(path);
		}
	}
}

fn extract_file(
	path: &Path, output_root: Option<&Path>, options: ParseOptions,
) -> Result<usize, SpaError> {
	let data = fs::read(path)?;
	let spa = Spa::parse(&data, options)?;
	println!(
		"{}: {} particle(s), {} texture(s) declared",
		path.display(),
		spa.header.particles,
		spa.header.textures
	);

	let dir = output_dir(path, output_root);
	let mut output = OutputWriter::new(&dir)?;
	let count = spa.save(&mut output)?;
	println!(
		"{}: extracted {count} texture(s) to {}",
		path.display(),
		dir.display()
	);
	Ok(count)
}

/// Each archive gets its own directory named after the file stem, either
/// next to the input or under the chosen output root.
fn output_dir(path: &Path, output_root: Option<&Path>) -> PathBuf {
	let stem = path.file_stem().unwrap_or(path.as_os_str());
	match output_root {
		Some(root) => root.join(stem),
		None => path.with_extension(""),
	}
}
