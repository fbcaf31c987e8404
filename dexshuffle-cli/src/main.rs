use clap::{Parser, Subcommand};
use std::error::Error as _;
use std::fs;
use std::path::{Path, PathBuf};

use dexshuffle_core::bans::{ItemGroup, NameMap};
use dexshuffle_core::crc::resource_crc32;
use dexshuffle_core::patch::{apply_patch, apply_patch_in};
use dexshuffle_core::{BanSpec, CustomConfig, RandomizerError, Result, Settings, TweakRegistry};

#[derive(Debug, Parser)]
#[command(name = "dexshuffle", version, about = "Randomizer core tools")]
struct Args {
    /// Log progress at info level (RUST_LOG overrides).
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rebuild a game image from a base image and a named delta patch.
    Patch {
        #[arg(long)]
        base: PathBuf,
        #[arg(long)]
        patch: String,
        /// Directory to search for the patch (defaults to the executable's).
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Line-normalized CRC-32 of a text resource.
    Crc { file: PathBuf },
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Resolve ban lists from names to ids.
    Bans {
        #[arg(long)]
        spec: PathBuf,
        #[arg(long)]
        species: PathBuf,
        #[arg(long)]
        abilities: PathBuf,
        #[arg(long)]
        items: PathBuf,
        #[arg(long)]
        moves: PathBuf,
        #[arg(long)]
        groups: Option<PathBuf>,
    },
    /// List the tweak catalogue in application order.
    Tweaks,
}

#[derive(Debug, Subcommand)]
enum SettingsCommand {
    /// Print a settings string as JSON.
    Decode { string: String },
    /// Build a settings string from a JSON file.
    Encode { file: PathBuf },
    /// Check whether a names file still matches the CRC recorded in a settings string.
    CheckNames { string: String, names: PathBuf },
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| RandomizerError::Config(format!("{}: {}", path.display(), e)))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| RandomizerError::Config(format!("could not serialize output: {}", e)))
}

fn patch(base: &Path, name: &str, dir: Option<&Path>, out: &Path) -> Result<()> {
    let base_bytes = fs::read(base)?;
    let image = match dir {
        Some(dir) => apply_patch_in(dir, &base_bytes, name)?,
        None => apply_patch(&base_bytes, name)?,
    };
    fs::write(out, &image)?;
    log::info!("wrote {} ({} bytes)", out.display(), image.len());
    Ok(())
}

fn settings(cmd: SettingsCommand) -> Result<()> {
    match cmd {
        SettingsCommand::Decode { string } => {
            let loaded = Settings::from_settings_string(&string)?;
            if loaded.upgraded_from_old_version {
                log::warn!("settings string came from an older version and was upgraded");
            }
            println!("{}", loaded.settings.to_json()?);
        }
        SettingsCommand::Encode { file } => {
            let text = fs::read_to_string(&file)?;
            let settings = Settings::from_json(&text)?;
            println!("{}", settings.to_settings_string());
        }
        SettingsCommand::CheckNames { string, names } => {
            let loaded = Settings::from_settings_string(&string)?;
            match loaded.settings.custom_names_crc {
                None => println!("no names CRC recorded"),
                Some(recorded) => {
                    let current = resource_crc32(&names)?;
                    if loaded.settings.names_resource_current(&names)? {
                        println!("match ({:08X})", current);
                    } else {
                        println!("mismatch: recorded {:08X}, file {:08X}", recorded, current);
                    }
                }
            }
        }
    }
    Ok(())
}

fn bans(
    spec: &Path,
    species: &Path,
    abilities: &Path,
    items: &Path,
    moves: &Path,
    groups: Option<&Path>,
) -> Result<()> {
    let spec = BanSpec::from_json(&fs::read_to_string(spec)?)?;
    let mut config = CustomConfig::new(spec);
    config.set_species_names(read_json::<NameMap>(species)?);
    config.set_ability_names(read_json::<NameMap>(abilities)?);
    config.set_item_names(read_json::<NameMap>(items)?);
    config.set_move_names(read_json::<NameMap>(moves)?);
    if let Some(groups) = groups {
        config.set_item_groups(read_json::<Vec<ItemGroup>>(groups)?);
    }
    config.init()?;
    println!("{}", to_json(config.lists()?)?);
    Ok(())
}

fn tweaks() -> Result<()> {
    let registry = TweakRegistry::standard()?;
    for tweak in registry.ordered() {
        println!(
            "{:#07X}  {:>2}  {:<28} {}",
            tweak.value, tweak.priority, tweak.name, tweak.description
        );
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Patch {
            base,
            patch: name,
            dir,
            out,
        } => patch(&base, &name, dir.as_deref(), &out),
        Command::Crc { file } => {
            println!("{:08X}", resource_crc32(&file)?);
            Ok(())
        }
        Command::Settings(cmd) => settings(cmd),
        Command::Bans {
            spec,
            species,
            abilities,
            items,
            moves,
            groups,
        } => bans(&spec, &species, &abilities, &items, &moves, groups.as_deref()),
        Command::Tweaks => tweaks(),
    }
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(err) = run(args) {
        eprintln!("Error: {err}");
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}
