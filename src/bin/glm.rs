//! General linear model regression of a design against NIfTI or CIFTI data.
//!
//! A text table design (samples × regressors) gives one estimate map per
//! regressor. An image design (one map per regressor) gives one time course
//! per map, written as a text table.

use clap::Parser;
use fmri_glm::{Design, DesignScaling, GlmJob, ImageFormat};
use log::error;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// input file name (nifti or cifti image)
    #[arg(long)]
    input: PathBuf,

    /// design file name: a text table for temporal regression,
    /// an image for spatial regression
    #[arg(long)]
    design: PathBuf,

    /// mask image file name
    #[arg(long)]
    mask: Option<PathBuf>,

    /// output file name; the extension is set from the output type
    #[arg(long)]
    out: PathBuf,

    /// switch on normalization of the design matrix columns to unit std. deviation
    #[arg(long = "des_norm")]
    des_norm: bool,

    /// input, mask and image design are cifti files
    #[arg(long)]
    cifti: bool,
}

impl From<Args> for GlmJob {
    fn from(args: Args) -> Self {
        GlmJob {
            input: args.input,
            design: Design::from_path(&args.design),
            mask: args.mask,
            out: args.out,
            design_scaling: if args.des_norm {
                DesignScaling::ZScore
            } else {
                DesignScaling::Center
            },
            format: ImageFormat::from_cifti_flag(args.cifti),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let job = GlmJob::from(Args::parse());
    if let Err(e) = job.run() {
        error!("{}", e);
        process::exit(1);
    }
}
