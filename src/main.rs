use anyhow::{Context, Result};
use std::io;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Command, get_args};
use hlm_rs::config::GlobalOptions;
use hlm_rs::global::{GlobalFile, RandomName};
use hlm_rs::io::csv::load_reservoirs;
use hlm_rs::io::ini::write_ini;
use hlm_rs::io::results::load_output;
use hlm_rs::network::Network;
use hlm_rs::parameters::LinkParameters;
use hlm_rs::state::{InitialConditions, InitialStateSettings};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    match get_args().command {
        Command::Ini {
            rvr,
            prm,
            qmin,
            model,
            out,
            total_area,
            recharge_days,
            initial_time,
            reservoirs,
        } => {
            let network = Network::parse(&rvr)
                .with_context(|| format!("Failed to read topology: {:?}", rvr))?;
            let params = LinkParameters::parse(&prm)
                .with_context(|| format!("Failed to read parameters: {:?}", prm))?;

            let areas = network.upstream_areas(&params)?;
            let total_area = match total_area {
                Some(area) => area,
                None => network.outlet_area(&params)?,
            };
            info!(
                "Network: {} links, {} headwaters, outlet area {} km²",
                network.len(),
                network.headwaters().len(),
                total_area
            );

            let settings = InitialStateSettings {
                recharge_days,
                ..Default::default()
            };
            let conditions = InitialConditions::derive(qmin, total_area, &areas, &settings)?;

            let reservoirs = reservoirs
                .map(|path| {
                    load_reservoirs(&path)
                        .with_context(|| format!("Failed to read reservoirs: {:?}", path))
                })
                .transpose()?;

            write_ini(
                &out,
                model,
                network.links(),
                &conditions,
                reservoirs.as_ref(),
                initial_time,
            )
            .with_context(|| format!("Failed to write state file: {:?}", out))?;
        }

        Command::Gbl {
            options,
            name,
            strict,
        } => {
            let text = std::fs::read_to_string(&options)
                .with_context(|| format!("Failed to read options: {:?}", options))?;
            let opts = GlobalOptions::from_json(&text)
                .with_context(|| format!("Invalid options in {:?}", options))?;

            let mut global = GlobalFile::new(opts)?;
            if strict {
                global = global.strict();
            }
            let path = global.write_global(name.as_deref(), &mut RandomName)?;
            println!("{}", path.display());
        }

        Command::Series {
            output,
            link,
            state,
        } => {
            let table = load_output(&output)
                .with_context(|| format!("Failed to load output store: {:?}", output))?;
            let (time, series) = table.filter_by_link(link, &state)?;

            let mut wtr = csv::Writer::from_writer(io::stdout().lock());
            wtr.write_record(["Time", state.as_str()])?;
            for (t, v) in time.iter().zip(&series) {
                wtr.write_record([t.to_string(), v.to_string()])?;
            }
            wtr.flush().context("Failed to flush CSV writer")?;
        }
    }

    Ok(())
}
