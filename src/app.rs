use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;

use site_peaks::data::loader::load_file;
use site_peaks::{DetectionConfig, PeakReport, SignificanceWindow, identify_peaks};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Identify resonance peaks in residual site-response curves.
#[derive(Debug, Clone, Parser)]
#[command(name = "site-peaks", version, about, allow_negative_numbers = true)]
pub struct Args {
    /// Curve file (.csv, .json or .parquet)
    pub input: PathBuf,

    /// JSON detection config; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Cost-complexity pruning parameter of the regression tree
    #[arg(long)]
    pub cp_alpha: Option<f64>,

    /// Max log-width of a step that still belongs to a plateau
    #[arg(long)]
    pub step_thres: Option<f64>,

    /// Min peak amplitude above the higher tail
    #[arg(long)]
    pub amp_thres: Option<f64>,

    /// Max log-width of the peak between its tails
    #[arg(long)]
    pub wid_thres: Option<f64>,

    /// Min significance ratio
    #[arg(long)]
    pub k_thres: Option<f64>,

    /// Compute significance over the tail segments instead of the whole curve
    #[arg(long)]
    pub windowed_significance: bool,

    /// Only analyse this site
    #[arg(long)]
    pub site: Option<String>,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub pretty: bool,
}

impl Args {
    /// Config file (or defaults) with command-line overrides applied.
    pub fn detection_config(&self) -> Result<DetectionConfig> {
        let mut config = match &self.config {
            Some(path) => DetectionConfig::from_json_file(path)?,
            None => DetectionConfig::default(),
        };
        if let Some(v) = self.cp_alpha {
            config.complexity = v;
        }
        let t = &mut config.thresholds;
        if let Some(v) = self.step_thres {
            t.step_thres = v;
        }
        if let Some(v) = self.amp_thres {
            t.amp_thres = v;
        }
        if let Some(v) = self.wid_thres {
            t.wid_thres = v;
        }
        if let Some(v) = self.k_thres {
            t.k_thres = v;
        }
        if self.windowed_significance {
            config.significance = SignificanceWindow::Plateau;
        }
        config.validate().context("invalid detection config")?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Outcome for one site: a report, or the reason detection failed.
#[derive(Debug, Serialize)]
pub struct SiteReport {
    pub site: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PeakReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Load the input, run detection on every selected curve and emit the report.
pub fn run(args: &Args) -> Result<Vec<SiteReport>> {
    let config = args.detection_config()?;
    let set = load_file(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;

    let curves: Vec<_> = set
        .curves
        .iter()
        .filter(|c| args.site.as_deref().map_or(true, |s| s == c.site))
        .collect();
    if curves.is_empty() {
        bail!("no curves to analyse in {}", args.input.display());
    }

    let mut reports = Vec::with_capacity(curves.len());
    for sc in curves {
        match identify_peaks(&sc.curve, &config) {
            Ok(report) => {
                log::info!("{}: {}", sc.site, report.summary());
                reports.push(SiteReport {
                    site: sc.site.clone(),
                    report: Some(report),
                    error: None,
                });
            }
            Err(e) => {
                log::error!("{}: {e}", sc.site);
                reports.push(SiteReport {
                    site: sc.site.clone(),
                    report: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    write_reports(&reports, args)?;
    Ok(reports)
}

fn write_reports(reports: &[SiteReport], args: &Args) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(reports)
    } else {
        serde_json::to_string(reports)
    }
    .context("serialising report")?;

    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("writing {}", path.display()))?,
        None => {
            let mut out = std::io::stdout().lock();
            writeln!(out, "{json}").context("writing to stdout")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "site-peaks",
            "curves.csv",
            "--cp-alpha",
            "0.01",
            "--amp-thres",
            "0.5",
            "--windowed-significance",
        ]);
        let c = args.detection_config().unwrap();
        assert_eq!(c.complexity, 0.01);
        assert_eq!(c.thresholds.amp_thres, 0.5);
        assert_eq!(c.thresholds.k_thres, 0.9);
        assert_eq!(c.significance, SignificanceWindow::Plateau);
    }

    #[test]
    fn negative_threshold_is_accepted() {
        let args = Args::parse_from(["site-peaks", "curves.csv", "--k-thres", "-0.5"]);
        assert_eq!(args.k_thres, Some(-0.5));
        assert_eq!(args.detection_config().unwrap().thresholds.k_thres, -0.5);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let args = Args::try_parse_from(["site-peaks", "curves.csv", "--cp-alpha", "-1"]).unwrap();
        assert_eq!(args.cp_alpha, Some(-1.0));
        assert!(args.detection_config().is_err());
    }

    #[test]
    fn run_reports_each_site() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("curves.csv");
        let output = dir.path().join("report.json");

        let mut csv = String::from("site,period,response,standard_error\n");
        for i in 0..60 {
            let t = 0.01 * 10f64.powf(3.0 * i as f64 / 59.0);
            let bump = if (0.3..=0.6).contains(&t) { 2.0 } else { 0.0 };
            csv.push_str(&format!("BUMP,{t},{bump},0.1\n"));
        }
        csv.push_str("SHORT,0.1,0.0,0.1\nSHORT,0.2,0.0,0.1\n");
        std::fs::write(&input, csv).unwrap();

        let args = Args::parse_from([
            "site-peaks",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ]);
        let reports = run(&args).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].report.as_ref().unwrap().has_peak);
        assert!(reports[1].error.is_some());

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written.as_array().unwrap().len(), 2);
        assert_eq!(written[0]["site"], "BUMP");
    }
}
