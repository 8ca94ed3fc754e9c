use std::{env, fs, path::PathBuf};

use querycraft::{DatasetRegistry, Query, QueryComposer, QuerycraftConfig};
use tracing_subscriber::EnvFilter;

fn usage() {
    eprintln!("Usage: print_sql <datasets_dir> <dataset_name> <queries_json> [vendor]");
    eprintln!("Example: cargo run --example print_sql -- demos/datasets retail demos/queries/region_sales.json mysql");
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1).collect::<Vec<_>>();
    if args.len() < 3 {
        usage();
        std::process::exit(1);
    }

    let datasets_dir = PathBuf::from(args.remove(0));
    let dataset_name = args.remove(0);
    let queries_path = PathBuf::from(args.remove(0));

    let config = QuerycraftConfig::load_default();
    let vendor = match args.first() {
        Some(vendor) => vendor.clone(),
        None => config
            .default_vendor()?
            .map(|v| v.to_string())
            .ok_or_else(|| anyhow::anyhow!("no vendor given and no default configured"))?,
    };

    let registry = DatasetRegistry::load_from_dir(datasets_dir)?;
    let dataset = registry
        .get_dataset(&dataset_name)
        .ok_or_else(|| anyhow::anyhow!("unknown dataset {dataset_name}"))?;
    let queries: Vec<Query> = serde_json::from_str(&fs::read_to_string(queries_path)?)?;

    let composer = QueryComposer::with_config(config.compose.clone());
    let sql = composer.compose(&queries, dataset, &vendor)?;
    println!("{sql}");
    Ok(())
}
