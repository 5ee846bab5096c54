// Example runner for the `terrain_risk` library.
// The main library entry point is `src/lib.rs`.

use std::process::ExitCode;
use terrain_risk::pipeline::{ColorPredicate, analyze_image};

fn main() -> ExitCode {
    let Some(path) = std::env::args().nth(1) else {
        println!("Terrain Risk Engine - Example Runner");
        println!("Usage: terrain_risk <image_path>");
        return ExitCode::SUCCESS;
    };

    let image = match image::open(&path) {
        Ok(image) => image,
        Err(error) => {
            eprintln!("{path}: {error}");
            return ExitCode::FAILURE;
        }
    };

    match analyze_image(&image) {
        Ok(report) => {
            println!("{path} ({}x{})", report.width, report.height);
            for predicate in ColorPredicate::ALL {
                let share = report.percentages().for_predicate(predicate);
                println!("  {:<20}{share:.2}%", format!("{}:", predicate.name()));
            }
            if let Some(mean) = report.histogram.mean() {
                println!("  mean brightness:    {mean:.1}");
            }
            for (label, verdict) in report.verdicts().labelled() {
                println!("  {label}: {verdict}");
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{path}: {error}");
            ExitCode::FAILURE
        }
    }
}
