//! Motion parameter post-processing for fMRI: framewise displacement and
//! censoring of high-motion frames.

use clap::{Parser, ValueEnum};
use fmri_glm::motion::{DEFAULT_RADIUS, DEFAULT_THRESHOLD};
use fmri_glm::{CensorFormat, MotionJob, MotionSource};
use log::error;
use std::path::PathBuf;
use std::process;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum InputType {
    Spm,
    Fsl,
    Afni,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputType {
    Vector,
    Matrix,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// package used for motion correction
    #[arg(long = "inputtype", value_enum)]
    input_type: InputType,

    /// input file name
    #[arg(long = "inputfile")]
    input_file: PathBuf,

    /// output type
    #[arg(long = "outputtype", value_enum)]
    output_type: OutputType,

    /// output file name recording censor vectors
    #[arg(long = "outputfile")]
    output_file: PathBuf,

    /// output file name recording FD values
    #[arg(long = "outputfd")]
    output_fd: PathBuf,

    /// displacement (mm) at or above which a frame is censored
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,

    /// head radius (mm) used to convert rotations to displacements
    #[arg(long, default_value_t = DEFAULT_RADIUS)]
    radius: f64,
}

impl From<Args> for MotionJob {
    fn from(args: Args) -> Self {
        MotionJob {
            source: match args.input_type {
                InputType::Spm => MotionSource::Spm,
                InputType::Fsl => MotionSource::Fsl,
                InputType::Afni => MotionSource::Afni,
            },
            input: args.input_file,
            censor_format: match args.output_type {
                OutputType::Vector => CensorFormat::Vector,
                OutputType::Matrix => CensorFormat::Matrix,
            },
            censor_output: args.output_file,
            fd_output: args.output_fd,
            threshold: args.threshold,
            radius: args.radius,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let job = MotionJob::from(Args::parse());
    if let Err(e) = job.run() {
        error!("{}", e);
        process::exit(1);
    }
}
