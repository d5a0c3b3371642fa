//! ck_nitrate command-line interface

use std::fs;
use std::path::Path;

use clap::Parser;
use log::{info, LevelFilter};

use ck_nitrate::cli::{Cli, Commands};
use ck_nitrate::prelude::*;

/// Points per trend line drawn on the hormone plots
const TREND_POINTS: usize = 100;

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Commands::Report {
            data_dir,
            out_dir,
            grid_step,
            level,
        } => run_report(&data_dir, &out_dir, grid_step, level),
        Commands::Hormones { data_dir, level } => run_hormones(&data_dir, level),
        Commands::Expression { data_dir } => run_expression(&data_dir),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn run_report(data_dir: &Path, out_dir: &Path, grid_step: f64, level: f64) -> Result<()> {
    let plots_dir = out_dir.join("plots");
    fs::create_dir_all(&plots_dir)?;

    // Hormone panel: load, fit, plot, in panel order
    let panel = load_hormone_panel(data_dir)?;
    let fits = fit_hormone_panel(&panel, level)?;

    for table in &panel {
        let mut bands = Vec::new();
        for &treatment in &Treatment::ALL {
            if let Some(band) = treatment_trend(table, treatment, level, TREND_POINTS)? {
                bands.push(band);
            }
        }
        let path = plots_dir.join(format!("{}.png", table.hormone().file_stem()));
        plot_hormone(table, &bands, &path)?;
        info!("wrote {}", path.display());
    }

    let coefficients = coefficient_table(&fits);
    println!("Hormone interaction models (conc ~ NO3 * LCO)");
    println!("{coefficients}");

    // Expression: compare the four models, plot the winner's predictions
    let expression = load_expression_table(data_dir.join(EXPRESSION_FILE))?;
    let comparison = compare_expression_models(&expression)?;

    let aic = aic_table(&comparison);
    println!();
    println!("Expression model comparison (AIC, lower is better)");
    println!("{aic}");

    let (lo, hi) = expression_no3_range(&expression);
    let grid = prediction_grid(lo, hi, grid_step)?;
    let curve = comparison.best_fit().predict_curve(&grid);
    let expr_plot = plots_dir.join("NIN.png");
    plot_expression(&expression, &curve, &expr_plot)?;
    info!("wrote {}", expr_plot.display());

    write_report(out_dir.join("report.txt"), &coefficients, &aic)?;
    write_fits_json(out_dir.join("fits.json"), &fits, &comparison)?;
    info!("report written to {}", out_dir.display());

    Ok(())
}

fn run_hormones(data_dir: &Path, level: f64) -> Result<()> {
    let panel = load_hormone_panel(data_dir)?;
    let fits = fit_hormone_panel(&panel, level)?;
    println!("Hormone interaction models (conc ~ NO3 * LCO)");
    println!("{}", coefficient_table(&fits));
    Ok(())
}

fn run_expression(data_dir: &Path) -> Result<()> {
    let expression = load_expression_table(data_dir.join(EXPRESSION_FILE))?;
    let comparison = compare_expression_models(&expression)?;
    println!("Expression model comparison (AIC, lower is better)");
    println!("{}", aic_table(&comparison));
    Ok(())
}
