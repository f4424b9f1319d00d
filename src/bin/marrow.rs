//! Marrow CLI - distill a source tree into a single LLM-ready context document.

use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use marrow::builder::Marrow;
use marrow::errors::{exit_code, MarrowError};
use marrow::tokens::{count_tokens_with_encoding, format_number, Encoding};

#[derive(Parser)]
#[command(name = "marrow")]
#[command(about = "Distill a source tree into a single LLM-ready context document")]
#[command(version)]
struct Cli {
    /// Project root directory
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Write the document here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,

    /// Append the combined raw source section
    #[arg(long)]
    include_source: bool,

    /// Restrict to these extensions (comma separated, e.g. py,ts)
    #[arg(long = "ext", value_delimiter = ',')]
    extensions: Vec<String>,

    /// Additional directory names to skip
    #[arg(long = "exclude-dir")]
    exclude_dirs: Vec<String>,

    /// Only include files matching these glob patterns
    #[arg(long = "include")]
    include: Vec<String>,

    /// Emit the structured model as JSON instead of the text document
    #[arg(long)]
    json: bool,

    /// Include hidden files and directories
    #[arg(long)]
    hidden: bool,

    /// Do not respect .gitignore patterns
    #[arg(long)]
    no_gitignore: bool,

    /// Token encoding for the size summary
    #[arg(long, default_value = "cl100k")]
    encoding: Encoding,

    /// Suppress the summary line
    #[arg(long, short)]
    quiet: bool,

    /// Generate shell completions and exit
    #[arg(long, value_enum)]
    completions: Option<Shell>,
}

fn main() {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        generate(shell, &mut Cli::command(), "marrow", &mut std::io::stdout());
        return;
    }

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(exit_code(&e));
    }
}

fn run(cli: Cli) -> Result<(), MarrowError> {
    let mut builder = Marrow::new(&cli.root).include_source(cli.include_source);

    if !cli.extensions.is_empty() {
        let extensions: Vec<&str> = cli.extensions.iter().map(|e| e.as_str()).collect();
        builder = builder.extensions(&extensions);
    }
    for dir in &cli.exclude_dirs {
        builder = builder.exclude_dir(dir);
    }
    for pattern in &cli.include {
        builder = builder.include_glob(glob::Pattern::new(pattern)?);
    }
    builder = builder
        .include_hidden(cli.hidden)
        .respect_gitignore(!cli.no_gitignore);

    let doc = builder.build()?;

    let output = if cli.json { doc.to_json()? } else { doc.text.clone() };

    match &cli.out {
        Some(path) => {
            std::fs::write(path, &output)?;
            if !cli.quiet {
                let tokens = count_tokens_with_encoding(&output, cli.encoding);
                eprintln!(
                    "wrote {} ({} files, {} tokens, {})",
                    path.display(),
                    doc.file_count(),
                    format_number(tokens),
                    cli.encoding
                );
                if doc.error_count() > 0 {
                    eprintln!("{} file(s) failed to parse; see the document", doc.error_count());
                }
            }
        }
        None => {
            print!("{}", output);
        }
    }

    Ok(())
}
