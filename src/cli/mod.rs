// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, hands the work to Layer 2 and
// prints the results. Formatting of questions lives here, not
// in the pipeline.
//
// Text output:
//   == notes.txt ==
//   Q1: What is the capital of France?
//     a) France
//     b) Paris
//   A: Paris

pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use std::fmt::Write as _;

use crate::application::config::PipelineConfig;
use crate::application::generate_use_case::{DocumentQuestions, GenerateUseCase};
use crate::domain::AnswerStyle;
use commands::{Commands, GenerateArgs};

#[derive(Parser, Debug)]
#[command(
    name = "question-generator",
    version,
    about = "Generate question/answer pairs (optionally multiple choice) from text documents."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Generate(args) => run_generate(args),
        }
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    // Bad style names fail here, before any model is loaded
    args.answer_style.parse::<AnswerStyle>()?;

    let base = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    let config = args.apply_overrides(base);

    let use_case = GenerateUseCase::load(config, &args.model_locations(), !args.no_evaluator)?;
    let results  = use_case.execute(&args.request())?;

    let rendered = if args.json {
        serde_json::to_string_pretty(&results)?
    } else {
        render_text(&results)
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Cannot write results to '{}'", path.display()))?;
            tracing::info!("Wrote results to '{}'", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

/// Q:/A: lines per document; multiple-choice options are listed
/// alphabetically so the answer's position gives nothing away.
pub fn render_text(results: &[DocumentQuestions]) -> String {
    let mut out = String::new();
    for doc in results {
        let _ = writeln!(out, "== {} ==", doc.source);
        if doc.records.is_empty() {
            let _ = writeln!(out, "(no questions generated)");
        }
        for (i, record) in doc.records.iter().enumerate() {
            let _ = writeln!(out, "Q{}: {}", i + 1, record.question);
            if let Some(distractors) = &record.distractors {
                let mut options: Vec<&str> = distractors.iter().map(String::as_str).collect();
                options.push(&record.answer);
                options.sort_by_key(|o| o.to_lowercase());
                for (letter, option) in ('a'..='z').zip(options) {
                    let _ = writeln!(out, "  {letter}) {option}");
                }
            }
            let _ = writeln!(out, "A: {}", record.answer);
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QaRecord;

    #[test]
    fn test_render_text() {
        let results = vec![DocumentQuestions {
            source:  "notes.txt".into(),
            records: vec![
                QaRecord {
                    question:    "What is the capital of France?".into(),
                    answer:      "Paris".into(),
                    distractors: Some(vec!["Lyon".into(), "France".into()]),
                },
                QaRecord {
                    question:    "What is Paris known for?".into(),
                    answer:      "It is known for the Eiffel Tower.".into(),
                    distractors: None,
                },
            ],
        }];

        let expected = "== notes.txt ==\n\
                        Q1: What is the capital of France?\n  \
                        a) France\n  \
                        b) Lyon\n  \
                        c) Paris\n\
                        A: Paris\n\
                        Q2: What is Paris known for?\n\
                        A: It is known for the Eiffel Tower.";
        assert_eq!(render_text(&results), expected);
    }

    #[test]
    fn test_render_empty_document() {
        let results = vec![DocumentQuestions { source: "empty.txt".into(), records: Vec::new() }];
        assert_eq!(render_text(&results), "== empty.txt ==\n(no questions generated)");
    }

    #[test]
    fn test_cli_parses_generate() {
        let cli = Cli::try_parse_from([
            "question-generator", "generate",
            "--input", "notes.txt",
            "-n", "3",
            "--answer-style", "multiple_choice",
            "--no-evaluator",
            "--workers", "2",
            "--model-home", "/tmp/models",
        ])
        .unwrap();

        let Commands::Generate(args) = cli.command;
        let request = args.request();
        assert_eq!(request.num_questions, 3);
        assert_eq!(request.answer_style, "multiple_choice");
        assert!(!request.use_evaluator);

        let config = args.apply_overrides(PipelineConfig::default());
        assert_eq!(config.workers, 2);
        assert_eq!(config.beam_width, 4);
        assert_eq!(args.model_locations().model_home, std::path::PathBuf::from("/tmp/models"));
    }

    #[test]
    fn test_cli_rejects_zero_questions() {
        // Rejected while parsing, so no checkpoint is ever loaded
        let parsed = Cli::try_parse_from([
            "question-generator", "generate", "--input", "notes.txt", "-n", "0",
        ]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "question-generator", "generate", "--input", "notes.txt", "-n", "1",
        ]);
        assert!(parsed.is_ok());
    }
}
