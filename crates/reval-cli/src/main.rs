use clap::{Parser, Subcommand};
use log::LevelFilter;
use reval_core::config::EvalConfig;
use reval_core::evaluator::Evaluator;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "reval", about = "Reference-to-extracted image matching evaluator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an evaluation over a reference set, an extracted set, and a manifest.
    Evaluate {
        #[arg(long)]
        reference_dir: PathBuf,

        #[arg(long)]
        extracted_dir: PathBuf,

        #[arg(long)]
        manifest: PathBuf,

        #[arg(long, default_value = "report.json")]
        report_out: PathBuf,

        #[arg(long)]
        miss_packet_dir: Option<PathBuf>,

        #[arg(long, default_value_t = 5)]
        top_k: usize,

        #[arg(long, default_value_t = false)]
        no_parallel: bool,

        #[arg(long, default_value_t = 0.90)]
        recall_threshold: f64,

        #[arg(long, default_value_t = 2)]
        max_false_positives: usize,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(e) = reval_core::logging::init(level, None) {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("reval: {} failed [{}]", failure_banner(&e), error_code(&e));
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Evaluate {
            reference_dir,
            extracted_dir,
            manifest,
            report_out,
            miss_packet_dir,
            top_k,
            no_parallel,
            recall_threshold,
            max_false_positives,
        } => {
            let config = EvalConfig {
                top_k_misses: top_k,
                parallel: !no_parallel,
                miss_packet_dir,
                pass_recall_threshold: recall_threshold,
                pass_max_false_positives: max_false_positives,
                ..EvalConfig::default()
            };

            let evaluator = Evaluator::new(config);
            let report = evaluator.run(&reference_dir, &extracted_dir, &manifest)?;

            if let Some(notice) = &report.ceiling_notice {
                println!(
                    "ceiling notice: max possible recall is {:.4} ({} candidates / {} references)",
                    notice.max_possible_recall, notice.extracted_count, notice.reference_count
                );
            }
            println!(
                "recall={:.4} ({}/{}) false_positives={} verdict={}",
                report.recall,
                report.recall_numerator,
                report.recall_denominator,
                report.false_positive_count,
                report.verdict
            );

            reval_core::report::write_json(&report, &report_out)?;
            println!("report written to {}", report_out.display());

            Ok(())
        }
    }
}

fn failure_banner(e: &anyhow::Error) -> &'static str {
    match e.downcast_ref::<reval_core::Error>() {
        Some(reval_core::Error::InputMissing(_)) => "input missing",
        Some(reval_core::Error::DecodeFailure { .. }) => "decode failure",
        Some(reval_core::Error::ManifestMalformed(_)) => "manifest malformed",
        Some(reval_core::Error::InvariantViolation(_)) => "invariant violation",
        Some(reval_core::Error::Io(_)) => "I/O error",
        Some(reval_core::Error::Json(_)) => "JSON error",
        None => "evaluation",
    }
}

fn error_code(e: &anyhow::Error) -> &'static str {
    match e.downcast_ref::<reval_core::Error>() {
        Some(err) => err.code(),
        None => "UNKNOWN",
    }
}
