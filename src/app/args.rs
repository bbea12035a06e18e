use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "webview-logger-demo")]
#[command(about = "Streams sample log traffic to the browser log viewer")]
pub struct AppArgs {
    #[arg(long, help = "Port of the log viewer (or set WEBVIEW_LOGGER_PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "Disable automatic recovery of the viewer")]
    pub no_recover: bool,

    #[arg(long, help = "Echo every record to stderr")]
    pub console: bool,

    #[arg(long, help = "Stop after this many records (runs until Ctrl-C if omitted)")]
    pub count: Option<u64>,

    #[arg(long, default_value_t = 1000, help = "Minimum delay between records in milliseconds")]
    pub min_delay_ms: u64,

    #[arg(long, default_value_t = 2000, help = "Maximum delay between records in milliseconds")]
    pub max_delay_ms: u64,
}

impl AppArgs {
    pub fn from_cli() -> Self {
        <Self as Parser>::parse()
    }
}
