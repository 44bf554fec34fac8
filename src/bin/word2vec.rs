//  Copyright 2026 Robert Zavalczki
//  Copyright 2013 Google Inc. All Rights Reserved.
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use word2vec::{FileSentenceSource, ModelType, NoopListener, Searcher, TrainingConfig, WordVectors};

#[derive(Parser)]
#[command(name = "word2vec", about = "Train and query word2vec-style embeddings")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelTypeArg {
    Cbow,
    SkipGram,
}

impl From<ModelTypeArg> for ModelType {
    fn from(value: ModelTypeArg) -> Self {
        match value {
            ModelTypeArg::Cbow => ModelType::Cbow,
            ModelTypeArg::SkipGram => ModelType::SkipGram,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Train a model from a whitespace-tokenized, one-sentence-per-line corpus.
    Train {
        #[arg(short = 't', long = "train")]
        corpus: PathBuf,
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
        #[arg(long, default_value_t = 5)]
        min_count: u64,
        #[arg(long, default_value_t = 1)]
        threads: usize,
        #[arg(long, default_value_t = 5)]
        window: usize,
        #[arg(long, value_enum, default_value_t = ModelTypeArg::Cbow)]
        model: ModelTypeArg,
        #[arg(long, default_value_t = true)]
        hs: bool,
        #[arg(long, default_value_t = 100)]
        size: usize,
        #[arg(long, default_value_t = 0)]
        negative: usize,
        #[arg(long, default_value_t = 1e-3)]
        sample: f64,
        #[arg(long, default_value_t = 1)]
        iter: u64,
        #[arg(long)]
        alpha: Option<f32>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Print the k nearest neighbors of a word in a trained model.
    Nearest {
        #[arg(long)]
        model: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
        word: String,
        #[arg(short = 'k', long, default_value_t = 10)]
        k: usize,
    },
    /// Print the k nearest matches to `word1 - word2 + word3`.
    Analogy {
        #[arg(long)]
        model: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
        word1: String,
        word2: String,
        word3: String,
        #[arg(short = 'k', long, default_value_t = 10)]
        k: usize,
    },
}

fn load_model(path: &PathBuf, format: Format) -> word2vec::Result<WordVectors> {
    match format {
        Format::Text => WordVectors::load_text(path),
        Format::Json => WordVectors::load_json(path),
    }
}

fn run() -> word2vec::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Train {
            corpus,
            output,
            min_count,
            threads,
            window,
            model,
            hs,
            size,
            negative,
            sample,
            iter,
            alpha,
            format,
        } => {
            let config = TrainingConfig {
                min_frequency: min_count,
                threads,
                window_size: window,
                model_type: model.into(),
                use_hierarchical_softmax: hs,
                layer_size: size,
                negative_samples: negative,
                down_sample_rate: sample,
                iterations: iter,
                initial_learning_rate: alpha,
            };
            let source = FileSentenceSource::new(&corpus);
            let trained = word2vec::train(&source, &config, &NoopListener)?;
            match format {
                Format::Text => trained.save_text(&output)?,
                Format::Json => trained.save_json(&output)?,
            }
        }
        Command::Nearest {
            model,
            format,
            word,
            k,
        } => {
            let vectors = load_model(&model, format)?;
            let searcher = Searcher::new(&vectors);
            for (neighbor, score) in searcher.top_matches(&word, k)? {
                println!("{neighbor}\t{score:.6}");
            }
        }
        Command::Analogy {
            model,
            format,
            word1,
            word2,
            word3,
            k,
        } => {
            let vectors = load_model(&model, format)?;
            let searcher = Searcher::new(&vectors);
            for (neighbor, score) in searcher.analogy(&word1, &word2, &word3, k)? {
                println!("{neighbor}\t{score:.6}");
            }
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run() {
        tracing::error!(error = %err, "word2vec command failed");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
