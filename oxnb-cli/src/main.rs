//! OxNB CLI - unpack XNA `.xnb` content into editable documents and back.
//!
//! Unpacking writes a pretty-printed JSON document plus media sidecars
//! (PNG/WAV) next to it; packing reads them back and rebuilds the `.xnb`.

use clap::{Parser, Subcommand};
use oxnb_content::{Container, Content, Document};
use oxnb_core::error::XnbError;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "oxnb")]
#[command(author, version, about = "Unpack and repack XNA .xnb content files")]
#[command(long_about = "
OxNB converts XNA .xnb content files into editable JSON documents with
PNG/WAV media sidecars, and packs them back.

Examples:
  oxnb unpack OfficerHat.xnb
  oxnb unpack Items/ -o unpacked/
  oxnb pack OfficerHat.json
  oxnb info CharacterAnimations.xnb
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Unpack .xnb files into JSON documents plus media sidecars
    #[command(alias = "x")]
    Unpack {
        /// An .xnb file, or a directory to walk for them
        input: PathBuf,

        /// Output directory (defaults to the input's directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show each written file
        #[arg(short, long)]
        verbose: bool,
    },

    /// Pack JSON documents back into .xnb files
    #[command(alias = "p")]
    Pack {
        /// A .json document, or a directory to walk for them
        input: PathBuf,

        /// Output directory (defaults to the input's directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show each written file
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show header and content summary of an .xnb file
    #[command(alias = "i")]
    Info {
        /// The .xnb file to inspect
        input: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Unpack {
            input,
            output,
            verbose,
        } => cmd_batch(&input, output.as_deref(), verbose, "xnb", &cmd_unpack),
        Commands::Pack {
            input,
            output,
            verbose,
        } => cmd_batch(&input, output.as_deref(), verbose, "json", &cmd_pack),
        Commands::Info { input } => cmd_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

type CmdResult = Result<(), Box<dyn Error>>;

/// Run one conversion over a file, or over every matching file under a
/// directory.
fn cmd_batch(
    input: &Path,
    output: Option<&Path>,
    verbose: bool,
    extension: &str,
    convert: &dyn Fn(&Path, &Path, bool) -> CmdResult,
) -> CmdResult {
    if input.is_dir() {
        let mut converted = 0usize;
        for path in collect_files(input, extension)? {
            let out_dir = output.unwrap_or_else(|| path.parent().unwrap_or(input));
            convert(&path, out_dir, verbose)?;
            converted += 1;
        }
        println!("Converted {} file(s)", converted);
        return Ok(());
    }

    let out_dir = match output {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().unwrap_or(Path::new(".")).to_path_buf(),
    };
    convert(input, &out_dir, verbose)
}

/// Recursively collect files with the given extension, sorted for stable
/// output order.
fn collect_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(collect_files(&path, extension)?);
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn cmd_unpack(input: &Path, out_dir: &Path, verbose: bool) -> CmdResult {
    let bytes = fs::read(input)?;
    let document = Container::unpack(&bytes)?;

    let stem = file_stem(input);
    fs::create_dir_all(out_dir)?;

    let json = document.to_json(&mut |bytes, suffix| {
        let name = format!("{stem}{suffix}");
        fs::write(out_dir.join(&name), bytes).map_err(XnbError::from)?;
        Ok(name)
    })?;

    let json_path = out_dir.join(format!("{stem}.json"));
    fs::write(&json_path, json)?;
    if verbose {
        println!("  Unpacked: {} -> {}", input.display(), json_path.display());
    }
    Ok(())
}

fn cmd_pack(input: &Path, out_dir: &Path, verbose: bool) -> CmdResult {
    let text = fs::read_to_string(input)?;
    let sidecar_dir = input.parent().unwrap_or(Path::new(".")).to_path_buf();

    let document = Document::from_json(&text, &mut |name| {
        fs::read(sidecar_dir.join(name)).map_err(XnbError::from)
    })?;
    let bytes = Container::pack(&document)?;

    let stem = file_stem(input);
    fs::create_dir_all(out_dir)?;
    let xnb_path = out_dir.join(format!("{stem}.xnb"));
    fs::write(&xnb_path, bytes)?;
    if verbose {
        println!("  Packed: {} -> {}", input.display(), xnb_path.display());
    }
    Ok(())
}

fn cmd_info(input: &Path) -> CmdResult {
    let bytes = fs::read(input)?;
    let document = Container::unpack(&bytes)?;

    println!("File: {}", input.display());
    println!("Size: {} bytes", bytes.len());
    println!(
        "Target platform: {:?} ('{}')",
        document.header.target_platform,
        document.header.target_platform.as_char()
    );
    println!("XNB version: {}", document.header.xnb_version);
    println!("HiDef: {}", document.header.hidef);
    println!("Compression: {:?}", document.header.compression);
    println!();
    println!("Readers:");
    for (i, entry) in document.readers.iter().enumerate() {
        println!("  [{}] {} (v{})", i + 1, entry.type_name, entry.version);
    }
    println!();

    match &document.content {
        Content::Texture2D(texture) => {
            println!(
                "Texture2D: {}x{} ({:?})",
                texture.width, texture.height, texture.surface_format
            );
        }
        Content::SoundEffect(sound) => {
            println!(
                "SoundEffect: {} sample bytes, {} ms",
                sound.data.len(),
                sound.duration
            );
        }
        Content::Item(item) => {
            println!(
                "Item: {} ({}), {}x{}, {} part(s)",
                item.game_name,
                item.id,
                item.width,
                item.height,
                item.parts.len()
            );
        }
        Content::Animations(animations) => {
            println!("Animations: {}", animations.len());
            for animation in animations {
                println!("  {} ({} frames)", animation.name, animation.frames.len());
            }
        }
    }
    Ok(())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}
