use clap::{Parser, Subcommand};
use notepress::{config, convert, output, publish, site::Site, vectors};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "notepress")]
#[command(about = "Publish an Obsidian/iA Writer note vault as a Hugo content tree")]
#[command(long_about = "\
Publish an Obsidian/iA Writer note vault as a Hugo content tree

Directories below a publishable root that hold a `§ ` article become Hugo
page bundles. Wikilinks, callouts, content blocks, math and anchors are
rewritten into Hugo shortcodes, and every resolved link is recorded in a
backlink registry.

Vault structure:

  vault/
  ├── § Blog/                              # Root: section from first subdirectory
  │   └── Posts/                           # Section \"post\" (or [sections] override)
  │       └── 2023 - Hello/                # Bundle: slug \"hello\"
  │           ├── § Hello.md               # → content/post/hello/index.md
  │           ├── § Hello - Chinese.md     # → content/post/hello/index.zh.md
  │           ├── cover.jpg                # Copied into the bundle
  │           └── assets/                  # Copied into the bundle
  └── § Tickler/                           # Root with fixed section \"wiki\"
      └── Rust/
          ├── § Rust.md                    # → content/wiki/rust/index.md
          └── Ownership/
              └── § Ownership.md           # Breadcrumb child of Rust

Without paths, `publish` converts the whole vault and writes the backlink
file. Under watchexec, or with explicit paths, only the affected bundles are
republished.

Run 'notepress gen-config' to generate a documented notepress.toml.")]
#[command(version)]
struct Cli {
    /// Config file (optional; defaults apply when missing)
    #[arg(long, default_value = "notepress.toml", global = true)]
    config: PathBuf,

    /// Vault directory (overrides source_dir)
    #[arg(long, env = "KB_SRC_DIR", global = true)]
    source: Option<PathBuf>,

    /// Hugo content directory (overrides content_dir)
    #[arg(long, env = "KB_CONTENT_DIR", global = true)]
    content: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Publish the vault, or only the bundles affected by PATHS
    Publish {
        /// Changed files; when empty, watchexec variables or a full run apply
        paths: Vec<PathBuf>,
    },
    /// Print one converted article to stdout
    Convert {
        /// Article to convert
        file: PathBuf,
    },
    /// Convert every article without writing anything
    Check,
    /// Run *.in.md → *.out.md test vectors, writing *.real.md
    Verify {
        /// Directory holding the vectors
        dir: PathBuf,
    },
    /// Print a stock notepress.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    initialize_logging(cli.verbose)?;
    let load = || load_site(&cli.config, cli.source.as_deref(), cli.content.as_deref());

    match &cli.command {
        Command::Publish { paths } => {
            let mut site = load()?;
            let env = |key: &str| std::env::var(key).ok();
            let report = if !paths.is_empty() {
                publish::publish_changed(&mut site, paths)?
            } else if publish::is_watchexec(env) {
                publish::publish_changed(&mut site, &publish::changed_paths_from(env))?
            } else {
                publish::publish_all(&mut site)?
            };
            output::print_publish_output(
                &report,
                &site.config.source_dir,
                &site.config.content_dir,
            );
        }
        Command::Convert { file } => {
            let mut site = load()?;
            let converted = convert::convert_article(&mut site, file)?;
            print!("{}", converted.document);
        }
        Command::Check => {
            let mut site = load()?;
            let report = publish::check_all(&mut site)?;
            output::print_check_output(&report, &site.config.source_dir);
        }
        Command::Verify { dir } => {
            let mut site = load()?;
            let report = vectors::verify_dir(&mut site, dir, true)?;
            output::print_verify_output(&report, dir);
            if !report.passed() {
                return Err(format!("{} test vectors failed", report.failures().count()).into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config file and apply directory overrides from flags or env.
fn load_site(
    path: &Path,
    source: Option<&Path>,
    content: Option<&Path>,
) -> Result<Site, config::ConfigError> {
    let mut site_config = config::load_config(path)?;
    if let Some(source) = source {
        site_config.source_dir = source.to_path_buf();
    }
    if let Some(content) = content {
        site_config.content_dir = content.to_path_buf();
    }
    Ok(Site::new(site_config))
}

/// Install the stderr log subscriber: warnings by default, debug with `-v`.
fn initialize_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
