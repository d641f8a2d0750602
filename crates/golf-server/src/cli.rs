//! Command-line arguments for the `golf` binary.

use clap::Parser;
use std::path::PathBuf;

/// Realtime server for multiplayer golf sessions.
#[derive(Parser, Debug)]
#[command(name = "golf", version, about, long_about = None)]
pub struct Args {
    /// Configuration file to use instead of the search path.
    ///
    /// `GOLF_*` environment variables still override its values.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_config_flag_forms() {
        for argv in [
            &["golf", "--config", "golf.toml"][..],
            &["golf", "--config=golf.toml"],
            &["golf", "-c", "golf.toml"],
        ] {
            let args = Args::try_parse_from(argv.iter().copied()).unwrap();
            assert_eq!(args.config, Some(PathBuf::from("golf.toml")));
        }

        assert!(Args::try_parse_from(["golf"]).unwrap().config.is_none());
    }

    #[test]
    fn test_help_and_unknown_arguments() {
        let help = Args::try_parse_from(["golf", "--help"]).unwrap_err();
        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);

        let unknown = Args::try_parse_from(["golf", "--shuffle"]).unwrap_err();
        assert_eq!(unknown.kind(), clap::error::ErrorKind::UnknownArgument);

        assert!(Args::try_parse_from(["golf", "--config"]).is_err());
    }
}
