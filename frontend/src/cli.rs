//! Command-line arguments and configuration resolution.

use std::path::{Path, PathBuf};

use clap::Parser;
use coco_machines::config::{ConfigError, Tv};
use coco_machines::MachineConfig;

#[derive(Parser, Debug)]
#[command(name = "coco", about = "Headless Color Computer emulator")]
pub struct Args {
    /// Machine to run (e.g. "coco3"). Use --list to see them all.
    #[arg(required_unless_present = "list")]
    pub machine: Option<String>,

    /// ROM image, or a directory of ROM images.
    #[arg(required_unless_present = "list")]
    pub rom: Option<PathBuf>,

    /// Machine configuration (TOML). Defaults to coco/config.toml in the
    /// user config directory when that file exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Fields to run before exiting.
    #[arg(long, default_value_t = 60)]
    pub frames: u32,

    /// Stop when the CPU is about to execute this address (hex).
    #[arg(long, value_name = "ADDR", value_parser = parse_address)]
    pub trap: Option<u16>,

    /// Save the last field as a PNG.
    #[arg(long, value_name = "FILE")]
    pub screenshot: Option<PathBuf>,

    /// CPU part, overriding the configuration ("MC6809" or "HD6309").
    #[arg(long)]
    pub cpu: Option<String>,

    /// Run at 50 Hz.
    #[arg(long)]
    pub pal: bool,

    /// Fitted RAM in KB, overriding the configuration.
    #[arg(long, value_name = "KB")]
    pub ram_kb: Option<u32>,

    /// Accept ROM images whose checksum does not match.
    #[arg(long)]
    pub skip_checksums: bool,

    /// List registered machines and parts, then exit.
    #[arg(long)]
    pub list: bool,
}

/// Accepts `8006`, `$8006` and `0x8006`.
pub fn parse_address(text: &str) -> Result<u16, String> {
    let digits = text
        .strip_prefix('$')
        .or_else(|| text.strip_prefix("0x"))
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid address '{text}': {e}"))
}

/// `<config dir>/coco/config.toml`, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("coco").join("config.toml"))
}

/// Load the configuration file the arguments point at and apply the
/// command-line overrides on top.
///
/// An explicit `--config` must exist; the default path is only read when
/// present.
pub fn resolve_config(args: &Args, default_path: Option<&Path>) -> Result<MachineConfig, ConfigError> {
    let mut config = match (&args.config, default_path) {
        (Some(path), _) => MachineConfig::load(path)?,
        (None, Some(path)) if path.is_file() => {
            log::info!("using configuration {}", path.display());
            MachineConfig::load(path)?
        }
        _ => MachineConfig::default(),
    };

    if let Some(cpu) = &args.cpu {
        config.cpu = cpu.clone();
    }
    if args.pal {
        config.tv = Tv::Pal;
    }
    if let Some(kb) = args.ram_kb {
        config.ram_kb = kb;
    }
    if args.skip_checksums {
        config.skip_checksums = true;
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["coco", "coco3", "roms"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn addresses_parse_in_every_form() {
        assert_eq!(parse_address("8006"), Ok(0x8006));
        assert_eq!(parse_address("$c000"), Ok(0xC000));
        assert_eq!(parse_address("0xFFFE"), Ok(0xFFFE));
        assert!(parse_address("10000").is_err());
        assert!(parse_address("zz").is_err());
    }

    #[test]
    fn defaults_without_any_file() {
        let args = args(&[]);
        assert_eq!(args.frames, 60);
        assert_eq!(args.trap, None);
        let missing = std::env::temp_dir().join("coco_cli_test_missing.toml");
        let config = resolve_config(&args, Some(&missing)).unwrap();
        assert_eq!(config, MachineConfig::default());
    }

    #[test]
    fn flags_override_the_file() {
        let dir = std::env::temp_dir().join("coco_cli_test_override");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "cpu = \"HD6309\"\nram_kb = 128\n").unwrap();

        let args = args(&["--ram-kb", "64", "--pal", "--trap", "$8006"]);
        let config = resolve_config(&args, Some(&path)).unwrap();
        assert_eq!(config.cpu, "HD6309");
        assert_eq!(config.ram_kb, 64);
        assert_eq!(config.tv, Tv::Pal);
        assert_eq!(args.trap, Some(0x8006));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn explicit_config_must_exist() {
        let missing = std::env::temp_dir().join("coco_cli_test_absent.toml");
        let args = args(&["--config", missing.to_str().unwrap()]);
        assert!(matches!(resolve_config(&args, None), Err(ConfigError::Io(_))));
    }

    #[test]
    fn overrides_are_validated() {
        let args = args(&["--ram-kb", "32"]);
        assert!(matches!(
            resolve_config(&args, None),
            Err(ConfigError::Invalid { field: "ram_kb", .. })
        ));
    }

    #[test]
    fn list_needs_no_positionals() {
        let args = Args::parse_from(["coco", "--list"]);
        assert!(args.list);
        assert!(args.machine.is_none());
    }
}
