//! Project configuration management for `texbuild.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   ├── publish    # [publish]
//! │   ├── sync       # [sync]
//! │   └── watch      # [watch]
//! ├── error          # ConfigError
//! └── mod.rs         # ProjectConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[build]`   | Compiler command, artifact naming, log excerpts  |
//! | `[sync]`    | Command mirroring `src/` into `bld/`             |
//! | `[watch]`   | Debounce window for loop mode                    |
//! | `[publish]` | Durability of the published artifact             |
//!
//! The file is optional: every field has a default matching the classic
//! `rsync` + `latexmk` setup.

mod error;
mod section;

pub use error::ConfigError;
pub use section::{BuildConfig, PublishConfig, SyncConfig, WatchConfig};

use crate::{
    cli::Cli,
    core::{ProjectDirs, ProjectPaths, SetupError},
    debug, log,
    utils::path::{normalize_path, resolve_path},
};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Config file looked up in the project root when `-C` is not given.
pub const DEFAULT_CONFIG: &str = "texbuild.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing texbuild.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Absolute project root, from the command line (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Absolute path to the config file, which may not exist (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Compiler settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Source mirroring settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Loop mode settings
    #[serde(default)]
    pub watch: WatchConfig,

    /// Artifact publishing settings
    #[serde(default)]
    pub publish: PublishConfig,
}

impl ProjectConfig {
    /// Load configuration for the project named on the command line.
    ///
    /// A missing default config file means "all defaults"; a missing file
    /// that was asked for explicitly is an error.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = normalize_path(&cli.root);
        let config_path = resolve_path(&cli.config, &root);

        let mut config = if config_path.is_file() {
            Self::from_path(&config_path)?
        } else if cli.config != Path::new(DEFAULT_CONFIG) {
            bail!("config file `{}` not found", config_path.display());
        } else {
            debug!("config"; "no {} in {}, using defaults", DEFAULT_CONFIG, root.display());
            Self::default()
        };

        config.root = root;
        config.config_path = config_path;
        config.apply_command_options(cli);
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    // ========================================================================
    // command line overrides
    // ========================================================================

    fn apply_command_options(&mut self, cli: &Cli) {
        Self::update_option(&mut self.watch.debounce_ms, cli.debounce_ms().as_ref());

        if let Some(args) = cli.build_args() {
            if args.output_name.is_some() {
                self.build.output_name.clone_from(&args.output_name);
            }
            self.build.extra_args.extend(args.opts.iter().cloned());
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // paths
    // ========================================================================

    pub fn dirs(&self) -> ProjectDirs {
        ProjectDirs::new(&self.root)
    }

    /// Paths for building `document` (a stem inside `src/`).
    pub fn project_paths(&self, document: &str) -> ProjectPaths {
        ProjectPaths::new(
            self.dirs(),
            document,
            self.build.output_name.clone(),
            &self.build.output_ext,
        )
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Check that a build can start at all.
    ///
    /// `compile` also requires the compiler; `copy` only needs the sync tool.
    pub fn validate(&self, compile: bool) -> Result<(), SetupError> {
        let dirs = self.dirs();
        if !dirs.source_root().is_dir() {
            return Err(SetupError::MissingSource(dirs.source_root().to_path_buf()));
        }

        let sync = self
            .sync
            .program()
            .ok_or(SetupError::EmptyCommand("sync.command"))?;
        require_tool(sync, "syncing sources")?;

        if compile {
            if self.build.compiler.is_empty() {
                return Err(SetupError::EmptyCommand("build.compiler"));
            }
            require_tool(&self.build.compiler, "compiling")?;
        }

        Ok(())
    }
}

fn require_tool(tool: &str, purpose: &'static str) -> Result<(), SetupError> {
    match which::which(tool) {
        Ok(path) => {
            debug!("config"; "{} -> {}", tool, path.display());
            Ok(())
        }
        Err(_) => Err(SetupError::MissingTool {
            tool: tool.to_owned(),
            purpose,
        }),
    }
}

/// Parse a config snippet, failing the test on unknown fields.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ProjectConfig {
    let (parsed, ignored) = ProjectConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
