use crate::examples::{display_name, EXAMPLES};
use crate::input::{resolve_query, InputSource};
use crate::render::StreamRenderer;
use anyhow::{bail, Context};
use application::config::PipelineConfig;
use application::pipeline::DiagnosisPipeline;
use clap::Parser;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use domain::models::Query;
use infrastructure::config::Config;
use infrastructure::openai_client::OpenAiClient;
use infrastructure::vector_store::SqliteVectorStore;
use shared::telemetry::init_tracing;
use shared::types::Result;
use std::sync::Arc;
use tracing::info;

type Pipeline = DiagnosisPipeline<OpenAiClient, OpenAiClient, SqliteVectorStore>;

#[derive(Parser, Debug)]
#[command(name = "deepsymp")]
#[command(
    about = "Suggests possible diagnoses for described symptoms, grounded in a medical textbook index"
)]
pub struct Cli {
    /// Preset example to analyze when no symptoms are given (see --list-examples)
    #[arg(long, short, default_value_t = 1)]
    pub example: usize,

    /// List the preset examples and exit
    #[arg(long)]
    pub list_examples: bool,

    /// Keep prompting for symptoms until 'exit'
    #[arg(long, short)]
    pub interactive: bool,

    /// Symptom description
    #[arg(trailing_var_arg = true)]
    pub symptoms: Vec<String>,
}

pub struct CliApp {
    pipeline: Option<Pipeline>,
}

impl CliApp {
    pub fn new() -> Self {
        Self { pipeline: None }
    }

    pub async fn run(&mut self, cli: Cli) -> Result<()> {
        if cli.list_examples {
            Self::list_examples();
            return Ok(());
        }

        init_tracing("warn");
        let config = Config::load()
            .context("configuration error")
            .inspect_err(|e| eprintln!("{}", format!("{e:#}").red()))?;
        info!(?config, "configuration loaded");
        self.run_with_config(cli, &config).await
    }

    async fn run_with_config(&mut self, cli: Cli, config: &Config) -> Result<()> {
        // One-shot input is checked before the store is touched.
        let one_shot = if cli.interactive {
            None
        } else {
            let symptoms = cli.symptoms.join(" ");
            Some(resolve_query(&symptoms, cli.example, config.max_query_chars)?)
        };

        if let Err(e) = self.connect(config) {
            eprintln!("{}", format!("{e:#}").red());
            return Err(e);
        }

        match one_shot {
            None => self.handle_interactive().await,
            Some((query, _)) => {
                if !self.analyze(&query).await? {
                    bail!("analysis did not complete");
                }
                Ok(())
            }
        }
    }

    fn list_examples() {
        for (i, case) in EXAMPLES.iter().enumerate() {
            println!("{}", display_name(i + 1, case).bold());
            println!("  {}\n", case.text);
        }
    }

    /// Build every client once. An unreachable store stops the process here.
    fn connect(&mut self, config: &Config) -> Result<()> {
        let store =
            SqliteVectorStore::connect(&config.store_uri, &config.collection, &config.index_name)
                .context("cannot open the vector store")?;
        store.ping().context("vector store check failed")?;

        let client = Arc::new(OpenAiClient::new(config)?);
        let pipeline_config = PipelineConfig::from_config(config);
        self.pipeline = Some(DiagnosisPipeline::new(
            &pipeline_config,
            Arc::clone(&client),
            client,
            Arc::new(store),
        ));
        Ok(())
    }

    fn pipeline(&self) -> Result<&Pipeline> {
        self.pipeline
            .as_ref()
            .context("pipeline used before connecting")
    }

    async fn handle_interactive(&self) -> Result<()> {
        let max_query_chars = self.pipeline()?.config().max_query_chars;
        println!("Describe your symptoms. Leave empty to pick an example, type 'exit' to quit.");
        loop {
            let input: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Input your symptom here")
                .allow_empty(true)
                .interact_text()?;
            if input.trim().eq_ignore_ascii_case("exit") {
                break;
            }
            let example_number = if input.trim().is_empty() {
                Self::pick_example()?
            } else {
                1
            };
            match resolve_query(&input, example_number, max_query_chars) {
                Ok((query, source)) => {
                    if let InputSource::Example(n) = source {
                        info!(example = n, "using preset example");
                    }
                    self.analyze(&query).await?;
                }
                Err(e) => println!("{}", format!("{e:#}").yellow()),
            }
            println!();
        }
        Ok(())
    }

    fn pick_example() -> Result<usize> {
        let names: Vec<String> = EXAMPLES
            .iter()
            .enumerate()
            .map(|(i, case)| display_name(i + 1, case))
            .collect();
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Example")
            .items(&names)
            .default(0)
            .interact()?;
        Ok(selection + 1)
    }

    /// Run one query and stream the answer to stdout. Returns whether it completed.
    async fn analyze(&self, query: &Query) -> Result<bool> {
        let pipeline = self.pipeline()?;

        let mut renderer = StreamRenderer::new(std::io::stdout());
        renderer.user_message(query.as_str())?;
        eprint!("{}", "Analyzing...\r".dimmed());

        let mut run = pipeline.run_query(query).await;
        eprint!("\r{:12}\r", "");
        Ok(renderer.render_run(&mut run).await?)
    }
}

impl Default for CliApp {
    fn default() -> Self {
        Self::new()
    }
}
