use clap::{Arg, Command};
use pg_csv_load::{run, ConnectionConfig, LoadOptions, Outcome, DEFAULT_PORT};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("pgload")
        .about("Load every CSV in a directory into PostgreSQL, one table per file.")
        .after_help(
            "Tables named after each file are DROPPED and recreated on every run.\n\
             Connection settings come from the `user`, `password`, `host` and `dbname`\n\
             environment variables, optionally set in the env file.",
        )
        .arg(Arg::new("data-dir").long("data-dir").value_parser(clap::value_parser!(PathBuf)).default_value("./data").help("Directory scanned for *.csv files (not recursive)"))
        .arg(Arg::new("env-file").long("env-file").value_parser(clap::value_parser!(PathBuf)).default_value(".env").help("Env file merged into the environment (existing variables win); a missing file is ignored"))
        .arg(Arg::new("port").long("port").value_parser(clap::value_parser!(u16)).default_value("5432"))
        .arg(Arg::new("schema").long("schema").help("Target schema; defaults to the search path"))
        .arg(Arg::new("delimiter").long("delimiter").default_value(",").help("Field delimiter, a single character or \\t"))
        .arg(Arg::new("encoding").long("encoding").default_value("utf-8").help("Source file encoding label, e.g. latin1"))
        .get_matches();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let env_file = matches
        .get_one::<PathBuf>("env-file")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(".env"));
    match dotenvy::from_path(&env_file) {
        Ok(()) => tracing::debug!(path = %env_file.display(), "loaded env file"),
        Err(e) if e.not_found() => {
            tracing::debug!(path = %env_file.display(), "no env file")
        }
        Err(e) => return Err(anyhow::Error::new(e).context(format!("reading {}", env_file.display()))),
    }

    let port = matches.get_one::<u16>("port").copied().unwrap_or(DEFAULT_PORT);
    let config = ConnectionConfig::from_env()?.with_port(port);

    let options = LoadOptions::default()
        .with_delimiter(matches.get_one::<String>("delimiter").map(String::as_str).unwrap_or(","))?
        .with_encoding_label(matches.get_one::<String>("encoding").map(String::as_str).unwrap_or("utf-8"))?
        .with_schema(matches.get_one::<String>("schema").cloned());

    let data_dir = matches
        .get_one::<PathBuf>("data-dir")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("./data"));

    let start = Instant::now();
    let report = run(&data_dir, &config, options).await?;

    for file in &report.files {
        println!("{}", file.table_name);
        match &file.outcome {
            Outcome::Success { .. } => println!("  {file}"),
            Outcome::Failure(_) => println!("  error: {file}"),
        }
    }
    println!(
        "source={} {}\nelapsed={:.1}s",
        data_dir.display(),
        report,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
