use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config;

/// Import a Mantis CSV export into a GitLab project, keeping issue numbers.
#[derive(Debug, Parser)]
#[command(name = "mantis2gitlab", version)]
pub struct Cli {
    /// GitLab instance URL
    #[arg(long, env = "GITLAB_URL")]
    pub gitlab_url: String,

    /// Admin private token (required for Sudo)
    #[arg(long, env = "GITLAB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Target project, as namespace/path
    #[arg(short, long)]
    pub project: String,

    /// Mantis CSV export
    #[arg(short, long)]
    pub input: PathBuf,

    /// Mapping file (JSON, or TOML by extension)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Skip Mantis issues with a lower id
    #[arg(long = "from", default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub from: u64,

    /// Read from GitLab but do not write anything
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also write JSON logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(config::default_config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Cli, clap::Error> {
        let mut args = vec![
            "mantis2gitlab",
            "--gitlab-url",
            "https://gitlab.example.com",
            "--token",
            "secret",
            "--project",
            "acme/tracker",
            "--input",
            "export.csv",
        ];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args)
    }

    #[test]
    fn parse_defaults() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.project, "acme/tracker");
        assert_eq!(cli.input, PathBuf::from("export.csv"));
        assert_eq!(cli.from, 1);
        assert!(!cli.dry_run);
        assert_eq!(cli.verbose, 0);
        assert!(cli.config_path().ends_with(".mantis2gitlab/config.json"));
    }

    #[test]
    fn parse_all_options() {
        let cli = parse(&["-c", "map.toml", "--from", "250", "--dry-run", "-vv"]).unwrap();
        assert_eq!(cli.config_path(), PathBuf::from("map.toml"));
        assert_eq!(cli.from, 250);
        assert!(cli.dry_run);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn parse_rejects_zero_start_id() {
        assert!(parse(&["--from", "0"]).is_err());
    }

    #[test]
    fn parse_quiet_conflicts_with_verbose() {
        assert!(parse(&["-q", "-v"]).is_err());
    }

    #[test]
    fn parse_requires_project() {
        let result = Cli::try_parse_from([
            "mantis2gitlab",
            "--gitlab-url",
            "https://gitlab.example.com",
            "--token",
            "secret",
            "--input",
            "export.csv",
        ]);
        assert!(result.is_err());
    }
}
