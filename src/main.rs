
use std::process::ExitCode;

use anyhow::{bail, Result};
use gumdrop::{Options, ParsingStyle};

use tomo_tools::commands;
use tomo_tools::logging::{self, ResultExt};


#[derive(Options)]
struct Args {

	#[options(help_flag)]
	help: bool,

	/// settings for log output
	#[options(default = "tomo_tools=info")]
	log: String,

	#[options(command)]
	cmd: Option<Command>
}

#[derive(Options)]
enum Command {

	/// Combine particle annotations across tomograms into one particle table
	Particles(commands::particles::Args),

	/// Export the alignment etomo computed for one tilt series
	Alignment(commands::alignment::Args)
}


fn main() -> ExitCode {

	// parse arguments
	let args = Args::parse_args_or_exit(ParsingStyle::AllOptions);

	// init logging
	let Ok(_) = logging::init(&args.log)
		.log_err()
		else { return ExitCode::FAILURE; };

	let Ok(_) = run(args)
		.log_err()
		else { return ExitCode::FAILURE; };

	// we finished! =)
	ExitCode::SUCCESS
}


#[tracing::instrument(skip_all, level = 5, name = "TomoTools")]
fn run(args: Args) -> Result<()> {
	match args.cmd {
		Some(Command::Particles(args)) => commands::particles::run(args),
		Some(Command::Alignment(args)) => commands::alignment::run(args),
		None => bail!("No command, try one of:\n{}", Args::command_list().unwrap())
	}
}
