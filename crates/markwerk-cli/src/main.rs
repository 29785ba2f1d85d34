// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Markwerk — command-line front-end for the OMR answer-sheet checker.
//
// Entry point. Initialises logging, parses arguments, runs the pipeline,
// and prints or saves the results. This is the "calling application": the
// pipeline itself lives in markwerk-vision and stays UI-agnostic.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use sha2::{Digest, Sha256};

use markwerk_core::error::Result;
use markwerk_core::human_errors::humanize_error;
use markwerk_core::types::{GridConfig, TiePolicy, Verdict, NO_ANSWER_GLYPH};
use markwerk_vision::{deskew, extract_answers, preprocess, OmrChecker, SheetImage};

#[derive(Parser)]
#[command(name = "markwerk")]
#[command(about = "Score photographed bubble answer sheets against a reference key")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a student's sheet against an answer key and render the result.
    Score(ScoreArgs),

    /// Read the marked answers off a single sheet photo.
    Extract(ExtractArgs),
}

#[derive(Debug, Clone, Args)]
struct GridArgs {
    /// Number of question rows on the sheet.
    #[arg(long, default_value = "10")]
    rows: u32,

    /// Number of choice columns per question.
    #[arg(long, default_value = "4")]
    cols: u32,

    /// Choice labels, one character per column (e.g. ABCD).
    #[arg(long, default_value = "ABCD")]
    labels: String,

    /// What to do when two columns tie for the most ink.
    #[arg(long, value_enum, default_value_t = TieArg::FirstMaxWins)]
    ties: TieArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TieArg {
    /// The leftmost of the tied columns wins.
    FirstMaxWins,
    /// A tied row counts as unanswered.
    NoAnswer,
}

impl GridArgs {
    fn to_config(&self) -> Result<GridConfig> {
        let mut config = GridConfig::new(self.rows, self.cols, &self.labels)?;
        config.tie_policy = match self.ties {
            TieArg::FirstMaxWins => TiePolicy::FirstMaxWins,
            TieArg::NoAnswer => TiePolicy::NoAnswer,
        };
        Ok(config)
    }
}

#[derive(Debug, Clone, Args)]
struct ScoreArgs {
    /// Path to the photographed answer key.
    #[arg(long)]
    key: PathBuf,

    /// Path to the photographed student sheet.
    #[arg(long)]
    student: PathBuf,

    #[command(flatten)]
    grid: GridArgs,

    /// Straighten crooked photos before extraction.
    #[arg(long)]
    deskew: bool,

    /// Write the annotated result image here (format from the extension).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print a machine-readable score record as JSON instead of the table.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Args)]
struct ExtractArgs {
    /// Path to the sheet photo.
    #[arg(long)]
    image: PathBuf,

    #[command(flatten)]
    grid: GridArgs,

    /// Straighten a crooked photo before extraction.
    #[arg(long)]
    deskew: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Score(args) => cmd_score(&args),
        Commands::Extract(args) => cmd_extract(&args),
    };

    if let Err(err) = result {
        let human = humanize_error(&err);
        eprintln!("error: {err}");
        eprintln!("{} {}", human.message, human.suggestion);
        std::process::exit(1);
    }
}

fn cmd_score(args: &ScoreArgs) -> Result<()> {
    let config = args.grid.to_config()?;

    let key_image = load_sheet(&args.key, args.deskew)?;
    let student_image = load_sheet(&args.student, args.deskew)?;

    let checker = OmrChecker::new(config)?;
    let outcome = checker.run(&key_image, &student_image)?;

    if args.json {
        let digest = Some(file_digest(&args.student)?);
        let record = outcome.record(checker.config(), digest);
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("{}", outcome.score);
        print_verdict_table(checker.config(), &outcome);
    }

    if let Some(out) = &args.out {
        SheetImage::from_dynamic(outcome.annotated.clone()).save(out)?;
        tracing::info!(path = %out.display(), "Annotated image written");
    }

    Ok(())
}

fn cmd_extract(args: &ExtractArgs) -> Result<()> {
    let config = args.grid.to_config()?;
    let image = load_sheet(&args.image, args.deskew)?;

    let mask = preprocess(&image)?;
    let answers = extract_answers(&mask, &config)?;

    println!("{}", answers.to_letters(&config));
    Ok(())
}

/// Load a sheet photo, optionally straightening it first.
fn load_sheet(path: &Path, straighten: bool) -> Result<image::DynamicImage> {
    let image = SheetImage::open(path)?.into_dynamic();
    if straighten {
        Ok(deskew(&image))
    } else {
        Ok(image)
    }
}

/// Per-question breakdown, one line per row.
fn print_verdict_table(config: &GridConfig, outcome: &markwerk_vision::OmrOutcome) {
    let letter = |answer: &markwerk_core::types::Answer| {
        answer
            .choice_index()
            .and_then(|i| config.label_for(i))
            .map(str::to_string)
            .unwrap_or_else(|| NO_ANSWER_GLYPH.to_string())
    };

    for (row, verdict) in outcome.score.per_row.iter().enumerate() {
        let word = match verdict {
            Verdict::Correct => "correct",
            Verdict::Incorrect => "incorrect",
            Verdict::Unanswered => "unanswered",
        };
        println!(
            "Q{:<3} key {}  student {}  {}",
            row + 1,
            letter(&outcome.key_answers[row]),
            letter(&outcome.student_answers[row]),
            word
        );
    }
}

/// SHA-256 hex digest of a file's bytes, for the score record.
fn file_digest(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok(hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_args_build_a_validated_config() {
        let args = GridArgs {
            rows: 20,
            cols: 5,
            labels: "ABCDE".into(),
            ties: TieArg::NoAnswer,
        };
        let config = args.to_config().unwrap();
        assert_eq!(config.rows, 20);
        assert_eq!(config.tie_policy, TiePolicy::NoAnswer);
        assert_eq!(config.label_for(4), Some("E"));
    }

    #[test]
    fn mismatched_labels_are_rejected() {
        let args = GridArgs {
            rows: 10,
            cols: 4,
            labels: "ABC".into(),
            ties: TieArg::FirstMaxWins,
        };
        assert!(args.to_config().is_err());
    }
}
