use crate::commands::{
    run_build, run_convert_encoding, run_rename_columns, run_report, run_score, run_trends,
    BuildArgs, ConvertEncodingArgs, ReportArgs, ScoreArgs, TrendsArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use gopchang_locator::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Gopchang Locator",
    about = "Score, classify and explore candidate districts for a gopchang restaurant",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP dashboard service (default command)
    Serve(ServeArgs),
    /// Join the raw sources into master layers and persist them
    Build(BuildArgs),
    /// Score a persisted master layer and write the ranked tables
    Score(ScoreArgs),
    /// Print a filtered dashboard summary to the terminal
    Report(ReportArgs),
    /// Re-encode CSV files to UTF-8 in place
    ConvertEncoding(ConvertEncodingArgs),
    /// Rename Korean column headers of the raw sources to English
    RenameColumns,
    /// Collect search trend signals for the menu
    Trends(TrendsArgs),
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
        Command::Build(args) => run_build(args),
        Command::Score(args) => run_score(args),
        Command::Report(args) => run_report(args),
        Command::ConvertEncoding(args) => run_convert_encoding(args),
        Command::RenameColumns => run_rename_columns(),
        Command::Trends(args) => run_trends(args).await,
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
        let cli = Cli::try_parse_from(["gopchang-locator"]).expect("parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_report_filters() {
        let cli = Cli::try_parse_from([
            "gopchang-locator",
            "report",
            "--archetype",
            "university_area",
            "--min-score",
            "38",
        ])
        .expect("parse");
        match cli.command {
            Some(Command::Report(args)) => {
                assert_eq!(args.archetype.as_deref(), Some("university_area"));
                assert_eq!(args.min_score, Some(38.0));
                assert_eq!(args.max_score, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn build_requires_a_supported_crs() {
        let parsed = Cli::try_parse_from([
            "gopchang-locator",
            "build",
            "--out",
            "master",
            "--crs",
            "5186",
        ]);
        assert!(parsed.is_ok());

        let rejected = Cli::try_parse_from([
            "gopchang-locator",
            "build",
            "--out",
            "master",
            "--crs",
            "2097",
        ]);
        assert!(rejected.is_err());
    }
}
