pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Args, Parser, Subcommand};

use commands::extract::{ExtractRequest, TextSource};
use commands::render::RenderRequest;

#[derive(Debug, Parser)]
#[command(
    name = "camquote",
    about = "Camquote operator CLI",
    long_about = "Inspect configuration, check readiness, extract quotation items from raw text, and render quotation PDFs.",
    after_help = "Examples:\n  camquote doctor --json\n  camquote extract --text \"4 dome camera, 1 nvr\" --offline\n  camquote render --items quote.json --output quote.pdf"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, prompt template, inventory store, and extractor chain")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run the extraction pipeline over raw text and print the line items")]
    Extract(ExtractArgs),
    #[command(about = "Print the flattened inventory as JSON")]
    Inventory,
    #[command(about = "Render a JSON list of line items into a quotation PDF")]
    Render(RenderArgs),
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("input").required(true).args(["text", "file"])))]
struct ExtractArgs {
    #[arg(long, help = "Raw requirement text")]
    text: Option<String>,
    #[arg(long, help = "Read the raw requirement text from a file")]
    file: Option<PathBuf>,
    #[arg(long, help = "Skip AI providers and use rule-based parsing only")]
    offline: bool,
    #[arg(long, help = "Persist the outcome as the latest extraction result")]
    save: bool,
}

#[derive(Debug, Args)]
struct RenderArgs {
    #[arg(long, help = "JSON file holding an array of line items")]
    items: PathBuf,
    #[arg(long, help = "Where to write the PDF")]
    output: PathBuf,
    #[arg(long)]
    customer_name: Option<String>,
    #[arg(long)]
    customer_location: Option<String>,
    #[arg(long, help = "Leave out the informational page")]
    no_info_page: bool,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Extract(args) => {
            let source = match (args.text, args.file) {
                (Some(text), _) => TextSource::Inline(text),
                (None, Some(path)) => TextSource::File(path),
                (None, None) => TextSource::Inline(String::new()),
            };
            commands::extract::run(ExtractRequest { source, offline: args.offline, save: args.save })
        }
        Command::Inventory => commands::inventory::run(),
        Command::Render(args) => commands::render::run(RenderRequest {
            items_path: args.items,
            output_path: args.output,
            customer_name: args.customer_name,
            customer_location: args.customer_location,
            include_info_page: !args.no_info_page,
        }),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
