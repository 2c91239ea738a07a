use super::Parser;

#[derive(Parser, Debug)]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,
    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}
