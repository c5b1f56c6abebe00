use std::path::Path;

use clap::{Parser, Subcommand};

use kolink_cli::commands::scan_ops::ScanArgs;
use kolink_cli::commands::{compile_ops, config_ops, scan_ops};
use kolink_cli::pattern_list::PatternFormat;
use kolink_cli::trace_init;

#[derive(Parser)]
#[command(name = "kolink", about = "Korean expression linker tool")]
struct Cli {
    /// Custom settings TOML (see `settings-export`)
    #[arg(long, global = true)]
    settings: Option<String>,
    /// Write JSON trace lines here instead of stderr (requires --features trace)
    #[arg(long, global = true)]
    trace_dir: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a pattern list (file or directory) into a binary automaton
    Compile {
        /// JSON entry array or pattern<TAB>entry_ref lines
        input: String,
        /// Output file
        output: String,
        /// Input format (default: by file extension; a directory reads both)
        #[arg(long, value_enum)]
        format: Option<PatternFormat>,
        /// Abort on the first invalid row
        #[arg(long)]
        strict: bool,
    },
    /// Show automaton statistics
    Info {
        /// Compiled automaton file
        file: String,
    },
    /// Look up the entry refs of one pattern (exact match)
    Lookup {
        /// Compiled automaton file
        file: String,
        /// Pattern to look up
        pattern: String,
    },
    /// Find expressions in a text
    Scan {
        /// Compiled automaton file
        file: String,
        /// Text to scan (reads stdin when omitted)
        text: Option<String>,
        /// Entry ref to leave out (the entry whose own text is scanned)
        #[arg(long)]
        exclude: Option<String>,
        /// Skip matches up to N chars that sit inside a Hangul word
        #[arg(long)]
        boundary: Option<usize>,
        /// Print matches as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export default settings as TOML
    SettingsExport,
    /// Validate a custom settings TOML file
    SettingsValidate {
        /// Path to the TOML file
        file: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let _trace_guard = trace_init::init_tracing(cli.trace_dir.as_deref().map(Path::new));

    if let Some(file) = &cli.settings {
        config_ops::load_settings(file);
    }

    match cli.command {
        Command::Compile {
            input,
            output,
            format,
            strict,
        } => compile_ops::compile(&input, &output, format, strict),
        Command::Info { file } => compile_ops::info(&file),
        Command::Lookup { file, pattern } => compile_ops::lookup(&file, &pattern),
        Command::Scan {
            file,
            text,
            exclude,
            boundary,
            json,
        } => {
            let args = ScanArgs {
                exclude: exclude.as_deref(),
                boundary,
                json,
            };
            scan_ops::scan(&file, text.as_deref(), &args);
        }
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
    }
}
