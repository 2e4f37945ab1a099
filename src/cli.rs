use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Prepare inputs for and read outputs of the hillslope-link model
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Derive initial states from an outlet baseflow and write an .ini file
    Ini {
        /// Topology file (.rvr)
        #[arg(long)]
        rvr: PathBuf,

        /// Link parameter file (.prm)
        #[arg(long)]
        prm: PathBuf,

        /// Baseflow observed at the outlet [m³/s]
        #[arg(long)]
        qmin: f64,

        /// Model UID (190, 254 or 255)
        #[arg(short, long, default_value_t = 190)]
        model: u32,

        /// State file to write
        #[arg(short, long)]
        out: PathBuf,

        /// Total drainage area [km²]; defaults to the largest upstream area
        #[arg(long)]
        total_area: Option<f64>,

        /// Days for groundwater to reach the channel
        #[arg(long, default_value_t = 340.0)]
        recharge_days: f64,

        #[arg(long, default_value_t = 0.0)]
        initial_time: f64,

        /// `link_id,storage` CSV of dam links (model 255)
        #[arg(long)]
        reservoirs: Option<PathBuf>,
    },

    /// Write a global (.gbl) file from a JSON options file
    Gbl {
        #[arg(long)]
        options: PathBuf,

        /// Output name without extension; random when omitted
        #[arg(long)]
        name: Option<String>,

        /// Fail on template placeholders with no value
        #[arg(long)]
        strict: bool,
    },

    /// Print the time series of one link from an output store as CSV
    Series {
        /// Output store (.csv, .h5 or .nc)
        #[arg(long)]
        output: PathBuf,

        #[arg(long)]
        link: u32,

        #[arg(long, default_value = "State0")]
        state: String,
    },
}

pub fn get_args() -> Args {
    Args::parse()
}
