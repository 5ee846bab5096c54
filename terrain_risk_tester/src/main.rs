use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use terrain_risk::AnalysisReport;
use terrain_risk::parallel_pipeline::{BatchAnalyzer, BatchConfig};
use terrain_risk_visualizer::AnalysisSummary;
use terrain_risk_visualizer::chart::{self, ChartStyle};

#[derive(Parser)]
#[command(name = "terrain_risk_tester")]
#[command(about = "Classify aerial photographs into drought, flood and land-degradation risks")]
#[command(version)]
struct Cli {
    /// Images to analyse.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Directory to write `<stem>_histogram.png` brightness charts into.
    #[arg(long)]
    histogram_dir: Option<PathBuf>,

    /// Print one JSON summary per line instead of the text report.
    #[arg(long)]
    json: bool,

    /// Worker tasks used to analyse images concurrently (defaults to the CPU count).
    #[arg(long)]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // --- 1. Argument Parsing & Setup ---
    let cli = Cli::parse();
    if let Some(dir) = &cli.histogram_dir {
        std::fs::create_dir_all(dir)?;
    }
    let config = match cli.workers {
        Some(workers) => BatchConfig { workers },
        None => BatchConfig::default(),
    };
    let analyzer = BatchAnalyzer::new(config);

    // --- 2. Image Loading ---
    let mut failures = 0usize;
    let mut paths = Vec::with_capacity(cli.images.len());
    let mut images = Vec::with_capacity(cli.images.len());
    for path in &cli.images {
        match image::open(path) {
            Ok(image) => {
                paths.push(path.clone());
                images.push(image);
            }
            Err(error) => {
                eprintln!("{}: {error}", path.display());
                failures += 1;
            }
        }
    }

    // --- 3. Analysis & Reporting ---
    let results = analyzer.analyze_all(images).await;
    for (path, result) in paths.iter().zip(results) {
        let report = match result {
            Ok(report) => report,
            Err(error) => {
                eprintln!("{}: {error}", path.display());
                failures += 1;
                continue;
            }
        };

        if cli.json {
            let mut summary = serde_json::to_value(AnalysisSummary::from(&report))?;
            summary["path"] = serde_json::Value::String(path.display().to_string());
            println!("{summary}");
        } else {
            print!("{}", format_report(path, &report));
        }

        if let Some(dir) = &cli.histogram_dir {
            let out = histogram_path(dir, path);
            let (chart, _) = chart::render_histogram(&report.histogram, &ChartStyle::default());
            if let Err(error) = chart::save_png(&out, &chart) {
                eprintln!("{}: {error}", out.display());
                failures += 1;
            }
        }
    }

    Ok(if failures == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn format_report(path: &Path, report: &AnalysisReport) -> String {
    let percentages = report.percentages();
    let mut text = format!("{} ({}x{})\n", path.display(), report.width, report.height);
    text.push_str(&format!("  vegetation-absence: {:>6.2}%\n", percentages.vegetation_absence));
    text.push_str(&format!("  water-presence:     {:>6.2}%\n", percentages.water_presence));
    text.push_str(&format!("  bare-soil:          {:>6.2}%\n", percentages.bare_soil));
    if let Some(mean) = report.histogram.mean() {
        text.push_str(&format!("  mean brightness:    {mean:>6.1}\n"));
    }
    for (category, verdict) in report.verdicts().iter() {
        text.push_str(&format!("  {category}: {verdict}\n"));
    }
    text
}

fn histogram_path(dir: &Path, image_path: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    dir.join(format!("{stem}_histogram.png"))
}
