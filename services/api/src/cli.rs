use crate::report::{run_rules_report, run_score_report, RulesArgs, ScoreArgs};
use crate::server;
use activity_points::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Activity Points",
    about = "Serve the activity-points API or score certificate exports from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a certificate CSV export and print per-student breakdowns
    Score(ScoreArgs),
    /// Validate a rule table and print its categories and caps
    Rules(RulesArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score_report(args),
        Command::Rules(args) => run_rules_report(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["activity-points"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn score_accepts_student_and_rules_overrides() {
        let cli = Cli::try_parse_from([
            "activity-points",
            "score",
            "--activities",
            "export.csv",
            "--student",
            "21A91A0501",
            "--rules",
            "rules.json",
            "--level-mismatch",
            "lowest-tier",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Score(args)) => {
                assert_eq!(args.student.as_deref(), Some("21A91A0501"));
                assert!(args.rules.is_some());
                assert_eq!(
                    args.level_mismatch,
                    Some(activity_points::scoring::LevelMismatchPolicy::LowestTier)
                );
            }
            other => panic!("expected score command, got {other:?}"),
        }
    }
}
