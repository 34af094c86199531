
use std::path::Path;

use clap::Parser;
use tabled::{Table, Tabled};

use pvnet::{Config, ModelParams, PolicyValueNet};

use utils::error::*;
use utils::log;

///
/// A structure representing command line arguments.
///
#[derive(Parser)]
struct CLIArgs 
{
    #[clap(short, long, default_value = "params")]
    mode: String,

    #[clap(short, long, default_value = "config/config.toml")]
    config: String,

    #[clap(short, long)]
    params: Option<String>
}

///
/// One row of the parameter summary.
///
#[derive(Tabled)]
struct ParamRow 
{
    name: String,
    shape: String,
    size: usize,
    norm: String
}

fn summarize (params: & ModelParams) -> Vec<ParamRow>
{
    params.iter()
        .map(|(name, t)| ParamRow 
        {
            name: name.clone(),
            shape: format!("{:?}", t.size()),
            size: t.numel(),
            norm: format!("{:.4}", t.norm().double_value(& []))
        })
        .collect()
}

fn main () -> Result<()>
{
    let args = CLIArgs::parse();

    let config = Config::load(Path::new(& args.config))?;
    let _logger = log::initialize(& config.log_path, "pvnet")?;

    let network = PolicyValueNet::new(& config.neural, args.params.as_deref().map(Path::new))?;

    match args.mode.as_str() 
    {
        "init" => 
        {
            network.save_model(Path::new(& config.neural.model_file))?;
            println!("Wrote checkpoint '{}'.", & config.neural.model_file);
        },
        "params" => 
        {
            let params = network.get_model_params();
            let total : usize = params.values().map(|t| t.numel()).sum();

            println!("{}", Table::new(summarize(& params)));
            println!("{} tensors, {} parameters.", params.len(), total);
        },
        _ => 
        {
            return Err(error!("Mode '{}' is unsupported.", & args.mode));
        }
    };

    Ok(())
}
