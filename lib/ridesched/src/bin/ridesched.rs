use rayon::ThreadPoolBuilder;
use std::path::PathBuf;
use anyhow::Result;
use tracing::*;

use ridesched::*;
use ridesched::data::*;
use ridesched::pipeline;
use ridesched::routes::write_routes;

mod common;
use common::*;

use structopt::StructOpt;

/// Assigns rides to vehicles by solving the ride scheduling integer program.
#[derive(Debug, StructOpt)]
struct ClArgs {
    /// Instance file
    #[structopt(parse(from_os_str))]
    file: PathBuf,
    #[structopt(long, short="c", default_value="1", validator=clap_range_validator(Some(1), None))]
    cpus: usize,
    #[structopt(long, default_value="z3", possible_values=&SolverKind::variants(), case_insensitive=true)]
    solver: SolverKind,
    #[structopt(flatten)]
    artifacts: ArtifactOptions,
    #[structopt(flatten)]
    output: OutputOptions,
}


fn main() -> Result<()> {
    let args: ClArgs = StructOpt::from_args();
    let _g = init_logging(args.output.log.as_ref())?;
    debug!(?args);
    ThreadPoolBuilder::new().num_threads(args.cpus).build_global()?;

    println!("loading file: {}", args.file.display());
    let data = load_instance(&args.file)?;
    info!(id=%data.id, rides=data.n_rides(), vehicles=data.n_vehicles, "loaded");

    let mut backend = args.solver.backend()?;
    let outcome = pipeline::run(&data, backend.as_mut(), &args.artifacts.artifacts())?;

    write_file(&args.output.file, |w| Ok(write_routes(w, &outcome.routes)?))?;
    if let Some(path) = &args.output.summary {
        write_file(path, |w| Ok(outcome.to_json(&data).write_pretty(w, 2)?))?;
    }
    Ok(())
}
