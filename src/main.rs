use anyhow::Result;
use clap::{Parser, Subcommand};

use borg_overlay::cli::{
    handle_create_command, handle_delete_command, handle_list_command, handle_mount_command,
    handle_umount_command, CreateArgs, DeleteArgs, ListArgs, MountArgs, UmountArgs,
};
use borg_overlay::config::{paths::OverlayPaths, settings::Settings};
use borg_overlay::logger;
use borg_overlay::tools::SystemRunner;

#[derive(Parser)]
#[command(
    name = "borg-overlay",
    version,
    about = "Timestamped borg archives, grouped listings and stacked overlay mounts",
    long_about = "borg-overlay names borg archives after a pattern plus a UTC timestamp, \
                  lists archives grouped by naming scheme, and mounts every archive \
                  matching a pattern as one fuse-overlayfs view where newer archives \
                  shadow older ones."
)]
struct Cli {
    /// Log filter (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an archive named after a pattern and the current UTC time
    Create(CreateArgs),

    /// List archives matching a pattern, grouped by naming scheme
    #[command(alias = "ls")]
    List(ListArgs),

    /// Delete every archive matching a pattern
    Delete(DeleteArgs),

    /// Mount matching archives as one overlay, newest on top
    Mount(MountArgs),

    /// Unmount everything mounted under a mount base
    #[command(alias = "unmount")]
    Umount(UmountArgs),

    /// Show current configuration and paths
    Config {
        /// Write the current settings to the config file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = OverlayPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    let level = cli.log_level.as_deref().unwrap_or(&settings.log_level);
    logger::init(level)?;

    let runner = SystemRunner;

    match cli.command {
        Commands::Create(args) => {
            handle_create_command(&runner, &settings, args, chrono::Utc::now())?;
        }
        Commands::List(args) => {
            handle_list_command(&runner, &settings, args)?;
        }
        Commands::Delete(args) => {
            handle_delete_command(&runner, &settings, args)?;
        }
        Commands::Mount(args) => {
            handle_mount_command(&runner, &settings, args)?;
        }
        Commands::Umount(args) => {
            handle_umount_command(&runner, &settings, args)?;
        }
        Commands::Config { init } => {
            if init {
                settings.save(&paths)?;
                println!("Wrote {}", paths.settings_file().display());
                println!();
            }

            println!("borg-overlay Configuration");
            println!("==========================");
            println!("Config file: {}", paths.settings_file().display());
            println!();
            println!("Settings:");
            println!("  borg command:       {}", settings.borg_command);
            println!("  overlay command:    {}", settings.overlay_command);
            println!("  mountpoint command: {}", settings.mountpoint_command);
            println!("  unmount command:    {}", settings.unmount_command.join(" "));
            println!("  timestamp format:   {}", settings.timestamp_format);
            println!("  create options:     {}", settings.create_options.join(" "));
            println!("  log level:          {}", settings.log_level);
        }
    }

    Ok(())
}
