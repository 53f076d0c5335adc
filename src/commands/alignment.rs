
use std::path::PathBuf;

use anyhow::Result;
use gumdrop::Options;
use tracing::info;

use crate::imod::{self, EtomoOutput};
use crate::star::{Star, Table};


#[derive(Options)]
pub struct Args {

	/// directory containing the etomo output for the tilt series
	#[options(required)]
	etomo_directory: PathBuf,

	/// basename of the tilt series within the etomo directory
	#[options(required)]
	tilt_series_id: String,

	/// STAR file into which the alignment will be written
	#[options(required)]
	output_file: PathBuf
}


pub fn run(args: Args) -> Result<()> {

	let etomo = EtomoOutput::new(&args.etomo_directory, &args.tilt_series_id);

	// derive the per-image alignment
	let euler_angles = imod::xyz_extrinsic_euler_angles(&etomo)?;
	let shifts = imod::specimen_shifts(&etomo)?;

	// stack it all into one table, one row per image
	// shifts stay in pixels: the alignment has no pixel size to convert with
	let mut table = Table::with_columns([
		"rlnTomoXTilt",
		"rlnTomoYTilt",
		"rlnTomoZRot",
		"rlnTomoXShiftPix",
		"rlnTomoYShiftPix"
	]);
	for (angles, shift) in euler_angles.iter().zip(&shifts) {
		table.push_row(vec![
			format!("{}", angles[0]),
			format!("{}", angles[1]),
			format!("{}", angles[2]),
			format!("{}", shift[0]),
			format!("{}", shift[1])
		])?;
	}

	let num_images = table.num_rows();
	let mut star = Star::new();
	star.push(&args.tilt_series_id, table);
	star.save(&args.output_file)?;
	info!("wrote alignment for {} images of {} to {}", num_images, args.tilt_series_id, args.output_file.to_string_lossy());

	Ok(())
}
