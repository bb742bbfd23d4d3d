use anyhow::{Context, Result};
use bmad_board::config::{self, Config};
use bmad_board::data::{self, NextAction, PlanningArtifacts, SprintStatus, Story};
use bmad_board::view;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "bmad-board")]
#[command(about = "Sprint dashboard view state, story parsing, and next-action derivation")]
#[command(version)]
struct Args {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a story markdown file
    ParseStory {
        file: PathBuf,
        /// Print the parsed story as JSON
        #[arg(long)]
        json: bool,
    },
    /// Recommend the next workflow step
    NextAction {
        /// Project root (defaults to the current directory)
        #[arg(long)]
        root: Option<PathBuf>,
        /// Sprint status file (defaults to the configured location under the root)
        #[arg(long)]
        sprint: Option<PathBuf>,
        /// Story file currently being worked on
        #[arg(long)]
        story: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Drive an editor panel over stdio (JSON lines in, JSON lines out)
    Serve,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Command::Init { force } = &args.command {
        let path = config::init(args.config.as_deref(), *force)?;
        println!("Config saved to {}", path.display());
        return Ok(());
    }

    let config = config::load(args.config.as_deref())?;

    // Logs go to stderr; stdout carries command output and protocol messages
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.logging.filter.parse()?),
        )
        .init();

    match args.command {
        Command::ParseStory { file, json } => parse_story(&file, json),
        Command::NextAction {
            root,
            sprint,
            story,
            json,
        } => next_action(&config, root, sprint, story, json),
        Command::Serve => view::run(config).await,
        Command::Init { .. } => Ok(()),
    }
}

fn read_story(path: &Path) -> Result<Story> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read story from {}", path.display()))?;
    data::parse_story_content(&content, &path.to_string_lossy())
        .with_context(|| format!("{} has no '# Story E.S: Title' header", path.display()))
}

fn parse_story(path: &Path, json: bool) -> Result<()> {
    let story = read_story(path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&story)?);
        return Ok(());
    }

    println!("Story {}: {}", story.display_number(), story.title);
    println!("  key:     {}", story.key);
    println!("  status:  {}", story.status.display_name());
    println!(
        "  tasks:   {}/{} (subtasks {}/{})",
        story.completed_tasks, story.total_tasks, story.completed_subtasks, story.total_subtasks
    );
    println!("  ACs:     {}", story.acceptance_criteria.len());
    if !story.user_story.is_empty() {
        println!("  {}", story.user_story);
    }
    Ok(())
}

fn next_action(
    config: &Config,
    root: Option<PathBuf>,
    sprint: Option<PathBuf>,
    story: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let root = match root {
        Some(r) => r,
        None => std::env::current_dir().context("Could not determine current directory")?,
    };

    let sprint_path = sprint.unwrap_or_else(|| config.project.sprint_status_path(&root));
    let sprint = if sprint_path.exists() {
        let sprint = SprintStatus::load(&sprint_path)?;
        match sprint.generated_date() {
            Some(date) => tracing::info!("Sprint status for {} generated {}", sprint.project, date),
            None => tracing::debug!("Sprint status has no generated date"),
        }
        Some(sprint)
    } else {
        tracing::info!("No sprint status at {}", sprint_path.display());
        None
    };

    let current_story = story.as_deref().map(read_story).transpose()?;

    let planning_dir = config.project.planning_path(&root);
    let planning = PlanningArtifacts::detect(&planning_dir)
        .with_context(|| format!("Failed to scan {}", planning_dir.display()))?;

    let action = data::get_next_action(sprint.as_ref(), current_story.as_ref(), Some(&planning));
    print_action(&action, json)
}

fn print_action(action: &NextAction, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(action)?);
        return Ok(());
    }

    println!("{}", action.label);
    println!("  {}", action.description);
    if let Some(key) = &action.story_key {
        println!("  story:    {}", key);
    }
    if let Some(command) = action.action_type.workflow_command() {
        println!("  workflow: {}", command);
    }
    Ok(())
}
