use clap::{Parser, Subcommand};
use fixgen::cleanup::{CleanupOptions, cleanup_invalid};
use fixgen::config::{self, FixgenConfig};
use fixgen::formats::builtin_registry;
use fixgen::generate::generate_many;
use fixgen::image_set::{self, ImageSetOptions};
use fixgen::options::Options;
use fixgen::output;
use fixgen::validate::validate_path;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser)]
#[command(name = "fixgen")]
#[command(about = "Generate and validate test fixture files")]
#[command(long_about = "\
Generate and validate test fixture files

Write one well-formed file per requested format from a piece of text, check
existing files for structural validity, or sweep a directory of broken ones.

Examples:

  fixgen generate \"Hello, world\" txt json pdf png
  fixgen generate \"name\\tsize\" xlsx -o fixtures -p sheet
  fixgen generate-set icons.json -o public --text FG
  fixgen validate fixtures -r -v
  fixgen cleanup fixtures --dry-run

Run 'fixgen list' for every supported extension and 'fixgen gen-config' for a
documented fixgen.toml.")]
#[command(version = env!("FIXGEN_VERSION"))]
struct Cli {
    /// Config file (default: ./fixgen.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

/// Per-invocation overrides of `[options]` in the config.
#[derive(clap::Args, Clone)]
struct OptionArgs {
    /// Document title (pdf, docx, odt, html)
    #[arg(long)]
    title: Option<String>,
    /// Document author (pdf, docx, odt)
    #[arg(long)]
    author: Option<String>,
    /// Canvas width in pixels, 1-8192 (raster, svg, mp4)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=8192))]
    width: Option<u32>,
    /// Canvas height in pixels, 1-8192 (raster, svg, mp4)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=8192))]
    height: Option<u32>,
    /// Font size, 1-1024 (raster, svg, mp4)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=1024))]
    font_size: Option<u32>,
    /// JPEG quality, 1-100
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,
}

impl OptionArgs {
    fn apply(&self, mut options: Options) -> Options {
        if let Some(title) = &self.title {
            options.title = Some(title.clone());
        }
        if let Some(author) = &self.author {
            options.author = Some(author.clone());
        }
        options.width = self.width.or(options.width);
        options.height = self.height.or(options.height);
        options.font_size = self.font_size.or(options.font_size);
        if let Some(quality) = self.quality {
            options.quality = quality;
        }
        options
    }
}

#[derive(Subcommand)]
enum Command {
    /// Generate one file per extension from the given content
    Generate {
        /// Text content to encode
        content: String,
        /// Target extensions, e.g. txt json png tar.gz
        #[arg(required = true)]
        extensions: Vec<String>,
        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// File name prefix
        #[arg(short, long)]
        prefix: Option<String>,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Generate a set of images from a JSON icon manifest
    GenerateSet {
        /// Manifest of the form {"icons": [{"src": "icon.png", "sizes": "192x192"}]}
        config_json: PathBuf,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
        /// Resize this image instead of rendering placeholders
        #[arg(long)]
        base_image: Option<PathBuf>,
        /// Placeholder background color
        #[arg(long)]
        background_color: Option<String>,
        /// Placeholder text
        #[arg(long)]
        text: Option<String>,
        /// Placeholder text color
        #[arg(long)]
        text_color: Option<String>,
    },
    /// Validate a file, or every file in a directory
    Validate {
        path: PathBuf,
        /// Include subdirectories
        #[arg(short, long)]
        recursive: bool,
        /// Show validation details
        #[arg(short, long)]
        verbose: bool,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete invalid files in a directory
    Cleanup {
        dir: PathBuf,
        /// Include subdirectories
        #[arg(short, long)]
        recursive: bool,
        /// Report what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
        /// Show validation details and valid files
        #[arg(short, long)]
        verbose: bool,
    },
    /// List supported extensions
    List,
    /// Print a stock fixgen.toml with all options documented
    GenConfig,
}

fn init_logging(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(ExitCode::SUCCESS);
    }

    let config: FixgenConfig = config::load_config(cli.config.as_deref())?;
    let registry = builtin_registry()?;

    let code = match cli.command {
        Command::Generate {
            content,
            extensions,
            output_dir,
            prefix,
            options,
        } => {
            let out_dir = output_dir.unwrap_or_else(|| PathBuf::from(&config.output.dir));
            let prefix = prefix.unwrap_or(config.output.prefix);
            let options = options.apply(config.options);
            let results =
                generate_many(&registry, &content, &extensions, &out_dir, &prefix, &options);
            output::print_generate_output(&results);
            if results.iter().any(|(_, r)| r.is_ok()) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Command::GenerateSet {
            config_json,
            output_dir,
            base_image,
            background_color,
            text,
            text_color,
        } => {
            let set = image_set::load_config(&config_json)?;
            let options = ImageSetOptions {
                base_image,
                background_color: background_color.unwrap_or(config.options.background_color),
                text_color: text_color.unwrap_or(config.options.text_color),
                text,
            };
            let report = image_set::generate_set(&registry, &set, &output_dir, &options)?;
            output::print_image_set_output(&report);
            if report.failures.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Command::Validate {
            path,
            recursive,
            verbose,
            json,
        } => {
            let results = validate_path(&registry, &path, recursive);
            if json {
                println!("{}", output::validate_json(&results)?);
            } else {
                output::print_validate_output(&results, verbose);
            }
            if results.values().all(|r| r.is_valid) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Command::Cleanup {
            dir,
            recursive,
            dry_run,
            verbose,
        } => {
            let report = cleanup_invalid(&registry, &dir, CleanupOptions { recursive, dry_run })?;
            output::print_cleanup_output(&report, dry_run, verbose);
            if report.failed() == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Command::List => {
            output::print_extension_list(&registry);
            ExitCode::SUCCESS
        }
        Command::GenConfig => ExitCode::SUCCESS,
    };

    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from([&["fixgen", "generate", "hi", "png"], args].concat())
    }

    #[test]
    fn size_flags_are_range_checked() {
        assert!(parse(&["--width", "640", "--font-size", "24", "--quality", "90"]).is_ok());
        for args in [
            ["--width", "0"],
            ["--width", "4294967295"],
            ["--height", "100000"],
            ["--font-size", "4294967295"],
            ["--quality", "0"],
        ] {
            assert!(parse(&args).is_err(), "{args:?}");
        }
    }
}
