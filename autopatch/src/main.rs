//! `autopatch` command-line entry point.
//!
//! Every flag can also be supplied through an environment variable so CI
//! workflows can pass plain env vars. Diagnostics go to stderr; stdout is
//! reserved for `--dry-run` prompt output.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use autopatch::autofix::{autofix_prompt, run_autofix};
use autopatch::error::PreconditionError;
use autopatch::exit_codes;
use autopatch::io::completion::HttpCompletionClient;
use autopatch::io::config::{AgentConfig, ConfigOverrides};
use autopatch::io::context::{DiffSource, IssueInput, PullRequestInput};
use autopatch::review::{review_prompt, run_review};

#[derive(Parser)]
#[command(
    name = "autopatch",
    version,
    about = "Turn issues into patches and diffs into reviews with an LLM"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Repository checkout the run operates on.
    #[arg(long, env = "AUTOPATCH_REPO_ROOT", global = true)]
    repo_root: Option<PathBuf>,
    /// Directory receiving the outcome record (default: OS temp dir).
    #[arg(long, env = "AUTOPATCH_OUTPUT_DIR", global = true)]
    output_dir: Option<PathBuf>,
    /// Settings file (default: `<repo-root>/.autopatch.toml`).
    #[arg(long = "config", env = "AUTOPATCH_CONFIG", global = true)]
    settings_path: Option<PathBuf>,
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,
    /// OpenAI-compatible API root (default: https://api.openai.com/v1).
    #[arg(long, env = "LLM_BASE_URL", global = true)]
    base_url: Option<String>,
    /// Azure OpenAI `api-version` query parameter.
    #[arg(long, env = "LLM_API_VERSION", global = true)]
    api_version: Option<String>,
    #[arg(long, env = "LLM_MODEL", global = true)]
    model: Option<String>,
}

impl GlobalArgs {
    fn overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            repo_root: non_empty_path(self.repo_root),
            output_dir: non_empty_path(self.output_dir),
            settings_path: non_empty_path(self.settings_path),
            api_key: self.api_key,
            base_url: self.base_url,
            api_version: self.api_version,
            model: self.model,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Propose and apply a patch for an issue.
    Fix(FixArgs),
    /// Review a pull-request diff.
    Review(ReviewArgs),
}

#[derive(Args, Debug)]
struct FixArgs {
    #[arg(long, env = "ISSUE_NUMBER")]
    issue_number: u64,
    #[arg(long, env = "ISSUE_TITLE")]
    issue_title: Option<String>,
    #[arg(long, env = "ISSUE_BODY")]
    issue_body: Option<String>,
    /// Print the rendered prompt and exit without calling the endpoint.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct ReviewArgs {
    #[arg(long, env = "PR_NUMBER")]
    pr_number: u64,
    #[arg(long, env = "PR_TITLE")]
    pr_title: Option<String>,
    #[arg(long, env = "PR_BODY")]
    pr_body: Option<String>,
    /// Unified diff text.
    #[arg(long, env = "PR_DIFF")]
    diff: Option<String>,
    /// Read the diff from a file instead; wins over `--diff`.
    #[arg(long, env = "PR_DIFF_FILE")]
    diff_file: Option<PathBuf>,
    /// Print the rendered prompt and exit without calling the endpoint.
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    autopatch::logging::init();
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            if err.downcast_ref::<PreconditionError>().is_some() {
                exit_codes::PRECONDITION
            } else {
                exit_codes::COMPLETION_FAILED
            }
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    let overrides = cli.global.overrides();
    match cli.command {
        Command::Fix(args) => cmd_fix(overrides, args),
        Command::Review(args) => cmd_review(overrides, args),
    }
}

fn cmd_fix(overrides: ConfigOverrides, args: FixArgs) -> Result<i32> {
    let input = IssueInput {
        number: args.issue_number,
        title: args.issue_title.unwrap_or_default(),
        body: args.issue_body.unwrap_or_default(),
    };
    input.validate()?;
    let config = AgentConfig::resolve(overrides)?;

    if args.dry_run {
        print!("{}", autofix_prompt(&config, &input)?);
        return Ok(exit_codes::OK);
    }

    let client = HttpCompletionClient::new(&config.llm)?;
    let run = run_autofix(&config, &input, &client)?;
    info!(
        output = %config.patch_output_path().display(),
        skip = run.record.skip,
        "wrote patch outcome"
    );
    Ok(run.exit_code())
}

fn cmd_review(overrides: ConfigOverrides, args: ReviewArgs) -> Result<i32> {
    let input = PullRequestInput {
        number: args.pr_number,
        title: args.pr_title.unwrap_or_default(),
        body: args.pr_body.unwrap_or_default(),
    };
    let diff = DiffSource::from_options(args.diff, non_empty_path(args.diff_file)).load()?;
    let config = AgentConfig::resolve(overrides)?;

    if args.dry_run {
        match &diff {
            Some(diff) => print!("{}", review_prompt(&config, &input, diff)?),
            None => info!("no diff supplied, nothing to review"),
        }
        return Ok(exit_codes::OK);
    }

    let client = HttpCompletionClient::new(&config.llm)?;
    let run = run_review(&config, &input, diff.as_deref(), &client)?;
    info!(
        output = %config.review_output_path().display(),
        approved = run.record.approved,
        "wrote review outcome"
    );
    Ok(run.exit_code())
}

fn non_empty_path(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|path| !path.as_os_str().is_empty())
}
