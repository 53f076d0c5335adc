
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use gumdrop::Options;
use tracing::info;

use crate::star::{Star, Table};


const ANNOTATION_SUFFIX: &'static str = "_particles.star";

const COORDINATE_COLUMNS: [&'static str; 3] = ["rlnCoordinateX", "rlnCoordinateY", "rlnCoordinateZ"];


#[derive(Options)]
pub struct Args {

	/// tilt-series STAR file describing each tomogram
	#[options(required)]
	tilt_series_star_file: PathBuf,

	/// directory containing particle annotations for each tomogram
	#[options(required)]
	annotations_directory: PathBuf,

	/// directory into which 'particles.star' will be written
	#[options(required)]
	output_directory: PathBuf
}


pub fn run(args: Args) -> Result<()> {

	// load the tilt-series table and index the binning factor by tilt series id
	let global = Star::read(&args.tilt_series_star_file)?;
	let binning_factors = binning_factors(global.first_table()?)
		.context(format!("Failed to index tilt series in {}", args.tilt_series_star_file.to_string_lossy()))?;

	// find the annotation files
	// directory order is platform-dependent, so sort to keep the output row order deterministic
	let mut annotation_files = Vec::<PathBuf>::new();
	let dir = fs::read_dir(&args.annotations_directory)
		.context(format!("Failed to read annotations directory: {}", args.annotations_directory.to_string_lossy()))?;
	for entry in dir {
		let entry = entry
			.context(format!("Failed to read annotations directory: {}", args.annotations_directory.to_string_lossy()))?;
		let path = entry.path();
		if entry.file_name().to_string_lossy().ends_with(ANNOTATION_SUFFIX) && path.is_file() {
			annotation_files.push(path);
		}
	}
	annotation_files.sort();

	if annotation_files.is_empty() {
		bail!("No annotation files matching *{} in {}", ANNOTATION_SUFFIX, args.annotations_directory.to_string_lossy());
	}
	info!("found {} annotation files", annotation_files.len());

	// rescale each annotation table and stack them all into one
	let mut combined: Option<Table> = None;
	for file in &annotation_files {

		// the filename owns the tilt series id
		let filename = file.file_name()
			.context(format!("Annotation file has no name: {}", file.to_string_lossy()))?
			.to_string_lossy();
		let tilt_series_id = filename.strip_suffix(ANNOTATION_SUFFIX)
			.context(format!("Annotation file has no tilt series id: {}", file.to_string_lossy()))?;
		let binning = *binning_factors.get(tilt_series_id)
			.context(format!("Tilt series {} is not in {}", tilt_series_id, args.tilt_series_star_file.to_string_lossy()))?;

		let star = Star::read(file)?;
		let mut table = star.first_table()?
			.clone();
		scale_coordinates(&mut table, binning)
			.context(format!("Failed to rescale coordinates in {}", file.to_string_lossy()))?;

		match &mut combined {
			None => combined = Some(table),
			Some(combined) => combined.append(table)
				.context(format!("Annotation file {} does not match the others", file.to_string_lossy()))?
		}
	}
	let combined = combined
		.context("No annotation tables were read")?;

	fs::create_dir_all(&args.output_directory)
		.context(format!("Failed to create output directory: {}", args.output_directory.to_string_lossy()))?;

	// write the combined particle table
	let num_particles = combined.num_rows();
	let particles_file = args.output_directory.join("particles.star");
	let mut star = Star::new();
	star.push("particles", combined);
	star.save(&particles_file)?;
	info!("wrote {} particles to {}", num_particles, particles_file.to_string_lossy());

	// write the cross-reference table pointing downstream tools at both files
	let mut optimisation_set = Table::with_columns(["rlnTomoParticlesFile", "rlnTomoTomogramsFile"]);
	optimisation_set.push_row(vec![
		particles_file.to_string_lossy().to_string(),
		args.tilt_series_star_file.to_string_lossy().to_string()
	])?;
	let optimisation_set_file = args.output_directory.join("optimisation_set.star");
	let mut star = Star::new();
	star.push("optimisation_set", optimisation_set);
	star.save(&optimisation_set_file)?;
	info!("wrote {}", optimisation_set_file.to_string_lossy());

	Ok(())
}


/// build the tilt series id -> binning factor lookup, built once and read-only after that
fn binning_factors(table: &Table) -> Result<HashMap<String,f64>> {

	let name_col = table.column_index("rlnTomoName")?;
	let binning_col = table.column_index("rlnTomoTomogramBinning")?;

	let mut factors = HashMap::<String,f64>::new();
	for rowi in 0 .. table.num_rows() {
		let id = table.get(rowi, name_col)?;
		let binning = table.get_f64(rowi, binning_col)
			.context(format!("Failed to read binning factor for tilt series {}", id))?;
		if factors.insert(id.to_string(), binning).is_some() {
			bail!("Duplicate tilt series id: {}", id);
		}
	}

	Ok(factors)
}


/// multiply the three coordinate columns by the binning factor, elementwise
/// every other column passes through untouched
fn scale_coordinates(table: &mut Table, factor: f64) -> Result<()> {
	for column in COORDINATE_COLUMNS {
		let coli = table.column_index(column)?;
		for rowi in 0 .. table.num_rows() {
			let value = table.get_f64(rowi, coli)
				.context(format!("Failed to read {}, row {}", column, rowi))?;
			table.set(rowi, coli, format!("{}", value*factor))?;
		}
	}
	Ok(())
}
