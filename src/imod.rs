
// etomo alignment artifacts (from IMOD)
// https://bio3d.colorado.edu/imod/doc/man/xftoxg.html describes the xf transform format:
// one line per image, six reals: A11 A12 A21 A22 DX DY

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};


/// the output files of one etomo alignment run for one tilt series
#[derive(Debug, Clone, PartialEq)]
pub struct EtomoOutput {
	pub directory: PathBuf,
	pub basename: String
}

impl EtomoOutput {

	pub fn new(directory: impl AsRef<Path>, basename: impl AsRef<str>) -> Self {
		Self {
			directory: directory.as_ref().to_path_buf(),
			basename: basename.as_ref().to_string()
		}
	}

	pub fn xf_file(&self) -> PathBuf {
		self.directory.join(format!("{}.xf", self.basename))
	}

	pub fn tlt_file(&self) -> PathBuf {
		self.directory.join(format!("{}.tlt", self.basename))
	}

	pub fn align_log_file(&self) -> PathBuf {
		self.directory.join("align.log")
	}
}


/// the per-image 2D transforms solved by the alignment
#[derive(Debug, Clone, PartialEq)]
pub struct Xf {
	pub samples: Vec<XfSample>
}

#[derive(Debug, Clone, PartialEq)]
pub struct XfSample {
	pub mat00: f64,
	pub mat01: f64,
	pub mat10: f64,
	pub mat11: f64,
	pub x: f64,
	pub y: f64
}

impl Xf {

	pub fn read(path: impl AsRef<Path>) -> Result<Xf> {

		let path = path.as_ref();
		let text = fs::read_to_string(path)
			.context(format!("Failed to read xf file: {}", path.to_string_lossy()))?;

		let mut samples = Vec::<XfSample>::new();
		for (linei, line) in text.lines().enumerate() {
			let line = line.trim();
			if line.is_empty() {
				continue;
			}
			let values = line.split_whitespace()
				.map(|token| {
					token.parse::<f64>()
						.context(format!("Failed to read transform value {}, line {} of {}", token, linei + 1, path.to_string_lossy()))
				})
				.collect::<Result<Vec<_>>>()?;
			let &[mat00, mat01, mat10, mat11, x, y] = values.as_slice()
				else { bail!("Expected 6 transform values, but found {}, line {} of {}", values.len(), linei + 1, path.to_string_lossy()); };
			samples.push(XfSample {
				mat00,
				mat01,
				mat10,
				mat11,
				x,
				y
			});
		}

		Ok(Xf {
			samples
		})
	}

	pub fn num_images(&self) -> usize {
		self.samples.len()
	}

	/// the rotation each 2x2 matrix applies about the viewing axis, in degrees
	pub fn in_plane_rotations(&self) -> Vec<f64> {
		self.samples.iter()
			.map(|sample| sample.mat10.atan2(sample.mat00).to_degrees())
			.collect()
	}

	/// 2D shifts of the specimen, in pixels
	/// these are applied after rotating the specimen to align its projection with the image,
	/// so the image shift d maps back through the transposed matrix: -(At d)
	pub fn specimen_shifts(&self) -> Vec<[f64;2]> {
		self.samples.iter()
			.map(|sample| [
				-(sample.mat00*sample.x + sample.mat10*sample.y),
				-(sample.mat01*sample.x + sample.mat11*sample.y)
			])
			.collect()
	}
}


/// read the nominal tilt angles (degrees, one per line) from a tlt file
pub fn read_tlt(path: impl AsRef<Path>) -> Result<Vec<f64>> {

	let path = path.as_ref();
	let text = fs::read_to_string(path)
		.context(format!("Failed to read tlt file: {}", path.to_string_lossy()))?;

	// tlt files usually hold one angle per line, but the format allows several
	let mut angles = Vec::<f64>::new();
	for (linei, line) in text.lines().enumerate() {
		for token in line.split_whitespace() {
			let angle = token.parse::<f64>()
				.context(format!("Failed to read tilt angle {}, line {} of {}", token, linei + 1, path.to_string_lossy()))?;
			angles.push(angle);
		}
	}

	Ok(angles)
}


/// find the tilt angle offset the alignment solved for, in the align log
/// the last line mentioning the offset wins, and its last numeric token is the value
pub fn tilt_angle_offset(path: impl AsRef<Path>) -> Result<f64> {

	let path = path.as_ref();
	let text = fs::read_to_string(path)
		.context(format!("Failed to read align log: {}", path.to_string_lossy()))?;

	let offset = text.lines()
		.filter(|line| line.to_ascii_lowercase().contains("tilt angle offset"))
		.filter_map(|line| {
			line.split_whitespace()
				.rev()
				.find_map(|token| token.trim_end_matches(|c: char| !c.is_ascii_digit()).parse::<f64>().ok())
		})
		.last();

	offset.context(format!("No tilt angle offset found in align log: {}", path.to_string_lossy()))
}


/// the 2D shift of the specimen for each image, in pixels, in file order
pub fn specimen_shifts(etomo: &EtomoOutput) -> Result<Vec<[f64;2]>> {
	let xf = Xf::read(etomo.xf_file())?;
	Ok(xf.specimen_shifts())
}

/// XYZ extrinsic Euler angles rotating the specimen for each image, in degrees:
/// nothing about X, the offset-corrected tilt angle about Y, the in-plane rotation about Z
pub fn xyz_extrinsic_euler_angles(etomo: &EtomoOutput) -> Result<Vec<[f64;3]>> {

	let xf = Xf::read(etomo.xf_file())?;
	let tilt_angles = read_tlt(etomo.tlt_file())?;
	let offset = tilt_angle_offset(etomo.align_log_file())?;

	if tilt_angles.len() != xf.num_images() {
		bail!("Tilt series has {} tilt angles, but {} transforms", tilt_angles.len(), xf.num_images());
	}

	let euler_angles = tilt_angles.iter()
		.zip(xf.in_plane_rotations())
		.map(|(&tilt_angle, rotation)| [0.0, tilt_angle - offset, rotation])
		.collect();

	Ok(euler_angles)
}
