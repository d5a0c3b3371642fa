//! Command-line interface for ck_nitrate

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ck_nitrate")]
#[command(version)]
#[command(about = "Cytokinin and NIN expression response to nitrate under LCO elicitation")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full analysis and write the report
    #[command(
        long_about = "Run the full analysis\n\n\
            Loads the six hormone CSVs and the expression CSV, fits one\n\
            interaction linear model per hormone and the four competing\n\
            expression models, then writes plots, tables, and a JSON\n\
            snapshot into the output directory.",
        after_long_help = "\
Examples:
  ck_nitrate report -d data -o report
  ck_nitrate report -d data -o report --grid-step 0.05 --level 0.99"
    )]
    Report {
        /// Directory holding the measurement CSV files
        #[arg(short, long, default_value = "data",
            long_help = "Directory holding the measurement CSV files.\n\
                Expects CZ.csv, CZr.csv, IP.csv, IPr.csv, TZ.csv, TZr.csv\n\
                (semicolon-delimited, decimal point) and NIN.csv\n\
                (semicolon-delimited, decimal comma).")]
        data_dir: PathBuf,

        /// Output directory for plots, tables, and fits.json
        #[arg(short, long, default_value = "report")]
        out_dir: PathBuf,

        /// Nitrate step of the prediction grid [default: 0.1]
        #[arg(long, default_value = "0.1",
            long_help = "Nitrate step of the prediction grid.\n\
                The grid covers the closed observed range for both\n\
                treatments; 0.1 over [0, 16] yields 161 points per\n\
                treatment.")]
        grid_step: f64,

        /// Confidence level for intervals and bands [default: 0.95]
        #[arg(long, default_value = "0.95")]
        level: f64,
    },

    /// Fit the hormone linear models and print the coefficient table
    #[command(
        long_about = "Fit the hormone linear models only\n\n\
            Fits conc ~ NO3 * LCO for each of the six hormones and prints\n\
            the combined coefficient table without writing any files."
    )]
    Hormones {
        /// Directory holding the hormone CSV files
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,

        /// Confidence level for the intervals [default: 0.95]
        #[arg(long, default_value = "0.95")]
        level: f64,
    },

    /// Compare the expression models and print the AIC table
    #[command(
        long_about = "Compare the expression models only\n\n\
            Fits the four nested expression models (intercept, smooth\n\
            nitrate, treatment, by-treatment smooth) and prints their AIC\n\
            ranking without writing any files."
    )]
    Expression {
        /// Directory holding the expression CSV file
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,
    },
}
