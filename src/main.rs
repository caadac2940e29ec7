mod app;

use clap::Parser;

use app::{Args, run};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let reports = run(&args)?;

    let accepted = reports
        .iter()
        .filter(|r| r.report.as_ref().is_some_and(|p| p.has_peak))
        .count();
    log::info!("{accepted} of {} site(s) show a peak", reports.len());
    Ok(())
}
