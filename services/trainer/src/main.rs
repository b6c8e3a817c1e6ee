//! Entrypoint for the Student prompt trainer.
//!
//! Runs the optimization loop over the built-in task catalog, scores the
//! final best prompt on the held-out validation split, and writes it out as
//! plain text for the API service (`STUDENT_PROMPT_PATH`) to pick up.

mod config;
mod dataset;
mod optimizer;

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use clap::Parser;
use config::TrainerConfig;
use dataset::{create_dataset, split_dataset};
use optimizer::{
    LlmRewriteStrategy, OptimizerSettings, PromptOptimizer, initial_student_prompt,
};
use quizflow_core::{
    judge::AnswerJudge, llm_client::OpenAICompatibleClient, prompts::PromptLibrary,
};
use std::{fs, path::PathBuf, sync::Arc};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "trainer", about = "Optimizes the Student system prompt against the task catalog")]
struct Args {
    /// Number of propose/score rounds after the baseline.
    #[arg(long, default_value_t = 3)]
    rounds: u32,

    /// Tasks sampled from the training split per round.
    #[arg(long, default_value_t = 4)]
    batch_size: usize,

    /// Where the optimized prompt text is written.
    #[arg(long, default_value = "optimized_prompt.txt")]
    output: PathBuf,

    /// Optional prompt template directory; defaults to the built-ins.
    #[arg(long)]
    prompts_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = TrainerConfig::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();

    let prompts = match &args.prompts_dir {
        Some(dir) => PromptLibrary::from_dir(dir)
            .with_context(|| format!("Failed to load prompts from {:?}", dir))?,
        None => PromptLibrary::builtin(),
    };
    let initial_prompt = initial_student_prompt(&prompts);

    let openai_config = OpenAIConfig::new()
        .with_api_key(&config.openai_api_key)
        .with_api_base("https://api.openai.com/v1/");
    let client = Arc::new(OpenAICompatibleClient::new(
        openai_config,
        config.chat_model.clone(),
    ));

    let optimizer = PromptOptimizer::new(
        client.clone(),
        AnswerJudge::new(client.clone()),
        Arc::new(LlmRewriteStrategy::new(client)),
        prompts,
        OptimizerSettings {
            rounds: args.rounds,
            batch_size: args.batch_size,
        },
    );

    let (train, validation) = split_dataset(create_dataset());
    info!(
        train = train.len(),
        validation = validation.len(),
        model = %config.chat_model,
        rounds = args.rounds,
        batch_size = args.batch_size,
        "Starting prompt optimization"
    );

    let report = optimizer.run(&train, initial_prompt.clone()).await?;
    let validation_reward = optimizer.validate(&report.best_prompt, &validation).await;

    info!(
        rounds = report.rounds,
        rollouts = report.rollouts,
        prompt_versions = report.history.len(),
        best_reward = report.best_reward,
        validation_reward,
        "Training complete"
    );
    if report.best_prompt == initial_prompt {
        info!("Prompt unchanged; no candidate beat the baseline");
    } else {
        info!(
            initial_len = initial_prompt.chars().count(),
            optimized_len = report.best_prompt.chars().count(),
            "Prompt was optimized"
        );
    }

    fs::write(&args.output, &report.best_prompt)
        .with_context(|| format!("Failed to write optimized prompt to {:?}", args.output))?;
    info!(path = ?args.output, "Saved optimized prompt");

    Ok(())
}
