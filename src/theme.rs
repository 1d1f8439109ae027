use crate::error::PreferenceError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

pub const DEFAULT_THEME_FILE: &str = ".jaborandi-theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Light => Palette {
                text: "\x1b[30m",
                muted: "\x1b[90m",
                past: "\x1b[2m",
                emphasis: "\x1b[1m",
                reset: "\x1b[0m",
            },
            Theme::Dark => Palette {
                text: "\x1b[97m",
                muted: "\x1b[37m",
                past: "\x1b[2m",
                emphasis: "\x1b[1m",
                reset: "\x1b[0m",
            },
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        })
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme {other:?}")),
        }
    }
}

/// Terminal escape sequences for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub text: &'static str,
    pub muted: &'static str,
    pub past: &'static str,
    pub emphasis: &'static str,
    pub reset: &'static str,
}

impl Palette {
    /// No escapes at all, for pipes and tests.
    pub const PLAIN: Palette = Palette {
        text: "",
        muted: "",
        past: "",
        emphasis: "",
        reset: "",
    };
}

/// The persisted light/dark choice.
///
/// Read once at startup and written back on every toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemePreference {
    path: PathBuf,
    theme: Theme,
}

impl ThemePreference {
    /// Load the preference, falling back to light when the file is missing
    /// or holds anything other than "dark"/"light".
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let theme = match std::fs::read_to_string(&path) {
            Ok(contents) => contents.parse().unwrap_or_else(|e| {
                warn!(path = %path.display(), "Ignoring theme preference: {}", e);
                Theme::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Theme::default(),
            Err(e) => {
                warn!(path = %path.display(), "Could not read theme preference: {}", e);
                Theme::default()
            }
        };
        Self { path, theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn toggle(&mut self) -> Result<Theme, PreferenceError> {
        self.set(self.theme.toggled())
    }

    pub fn set(&mut self, theme: Theme) -> Result<Theme, PreferenceError> {
        std::fs::write(&self.path, theme.to_string()).map_err(|source| PreferenceError::Write {
            path: self.path.display().to_string(),
            source,
        })?;
        info!(theme = %theme, "Theme preference saved");
        self.theme = theme;
        Ok(theme)
    }
}
