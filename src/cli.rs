use clap::Parser;

const LONG_ABOUT: &str = r#"
http-control - edit a running program's variables from a browser

The demo registers two variables and serves a form for them:
  running  tick box; untick it and submit to end the demo
  msg      free text; every change is logged

Environment:
  HTTP_CONTROL_HOST, HTTP_CONTROL_PORT         listen address
  HTTP_CONTROL_MESSAGE_CAPACITY                messages kept on the page
  HTTP_CONTROL_NO_DISCOVERY                    do not advertise the server
  HTTP_CONTROL_LOG_LEVEL, RUST_LOG             log filtering
"#;

#[derive(Parser, Clone, Debug)]
#[command(name = "http-control")]
#[command(about = "Serve a web form that edits live program variables")]
#[command(long_about = LONG_ABOUT)]
#[command(version)]
pub struct Cli {
    /// Interface to listen on (overrides HTTP_CONTROL_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on, 0 for any free port (overrides HTTP_CONTROL_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// How often the demo checks for submissions, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub poll_ms: u64,

    /// Enable verbose output (-v)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output (-q)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output logs in JSON format
    #[arg(long)]
    pub json: bool,

    /// Write logs to ~/.http-control/logs/demo.log instead of stdout
    #[arg(long)]
    pub log_file: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_overrides() {
        let cli = Cli::parse_from(["http-control", "--host", "0.0.0.0", "-p", "0", "-vv"]);
        assert_eq!(cli.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(cli.port, Some(0));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.poll_ms, 100);
    }

    #[test]
    fn test_rejects_out_of_range_port() {
        assert!(Cli::try_parse_from(["http-control", "--port", "70000"]).is_err());
    }
}
