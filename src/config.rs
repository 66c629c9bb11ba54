use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub fn key_match(key: &KeyEvent, bindings: &[String]) -> bool {
    bindings.iter().any(|binding| is_match(key, binding))
}

fn parse_binding(binding: &str) -> (KeyModifiers, KeyCode) {
    let mut modifiers = KeyModifiers::NONE;
    let mut code = KeyCode::Null;

    // A bare "+" binding would otherwise split into two empty parts.
    if binding == "+" {
        return (modifiers, KeyCode::Char('+'));
    }

    for part in binding.split('+') {
        let lower = part.to_lowercase();
        match lower.as_str() {
            "ctrl" => modifiers.insert(KeyModifiers::CONTROL),
            "opt" | "alt" => modifiers.insert(KeyModifiers::ALT),
            "shift" => modifiers.insert(KeyModifiers::SHIFT),
            "enter" => code = KeyCode::Enter,
            "esc" => code = KeyCode::Esc,
            "backspace" => code = KeyCode::Backspace,
            "tab" => code = KeyCode::Tab,
            "backtab" => code = KeyCode::BackTab,
            "space" => code = KeyCode::Char(' '),
            "up" => code = KeyCode::Up,
            "down" => code = KeyCode::Down,
            "left" => code = KeyCode::Left,
            "right" => code = KeyCode::Right,
            "delete" => code = KeyCode::Delete,
            _ if part.chars().count() == 1 => {
                if let Some(ch) = part.chars().next() {
                    code = KeyCode::Char(ch);
                }
            }
            _ => {}
        }
    }
    (modifiers, code)
}

fn is_match(key: &KeyEvent, binding: &str) -> bool {
    let (target_modifiers, target_code) = parse_binding(binding);

    // Letters are case-sensitive so "s" (sync) and "S" (magic sort) can coexist.
    if key.code != target_code {
        return false;
    }

    if target_code == KeyCode::Enter {
        return key.modifiers == target_modifiers;
    }

    // Shift is implied by upper-case and symbol characters.
    let mut key_mods = key.modifiers;
    if !target_modifiers.contains(KeyModifiers::SHIFT) {
        key_mods.remove(KeyModifiers::SHIFT);
    }
    key_mods == target_modifiers
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "meghendra", "taskmatrix")
}

pub fn default_data_dir() -> PathBuf {
    if let Some(path) = std::env::var_os("TASKMATRIX_DATA_DIR") {
        return PathBuf::from(path);
    }
    if let Some(dirs) = project_dirs() {
        return dirs.data_dir().to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".taskmatrix")
}

fn default_log_dir() -> PathBuf {
    default_data_dir().join("logs")
}

pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("TASKMATRIX_CONFIG") {
        return PathBuf::from(path);
    }
    if let Some(dirs) = project_dirs() {
        return dirs.config_dir().join("config.toml");
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".taskmatrix-config.toml")
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub user: UserConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
    pub keybindings: KeyBindings,
    pub theme: Theme,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    /// 0 disables the timeout; a hung request then keeps its control busy.
    pub timeout_seconds: u64,
    /// Value of the server's `session` cookie, copied from a browser login.
    pub session_cookie: String,
    pub sync_on_start: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_seconds: 30,
            session_cookie: String::new(),
            sync_on_start: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct UserConfig {
    pub name: String,
    pub email: String,
}

impl UserConfig {
    pub fn display_name(&self) -> &str {
        if !self.name.trim().is_empty() {
            self.name.trim()
        } else if !self.email.trim().is_empty() {
            self.email.trim()
        } else {
            "Guest"
        }
    }

    pub fn initial(&self) -> char {
        self.display_name()
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?')
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct UiConfig {
    pub transition_ms: u64,
    pub toast_seconds: u64,
    pub confirm_delete: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            transition_ms: 250,
            toast_seconds: 3,
            confirm_delete: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: default_log_dir(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct KeyBindings {
    pub global: GlobalBindings,
    pub tasks: TasksBindings,
    pub composer: ComposerBindings,
    pub inline_edit: InlineEditBindings,
    pub popup: PopupBindings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GlobalBindings {
    pub quit: Vec<String>,
    pub help: Vec<String>,
    pub user_menu: Vec<String>,
    pub compose: Vec<String>,
    pub add: Vec<String>,
    pub sync: Vec<String>,
    pub magic_sort: Vec<String>,
    pub toggle_view: Vec<String>,
}

impl Default for GlobalBindings {
    fn default() -> Self {
        Self {
            quit: vec!["ctrl+q".to_string(), "q".to_string()],
            help: vec!["?".to_string()],
            user_menu: vec!["u".to_string()],
            compose: vec!["i".to_string()],
            add: vec!["a".to_string()],
            sync: vec!["s".to_string()],
            magic_sort: vec!["S".to_string()],
            toggle_view: vec!["m".to_string()],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TasksBindings {
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub toggle: Vec<String>,
    pub edit: Vec<String>,
    pub delete: Vec<String>,
}

impl Default for TasksBindings {
    fn default() -> Self {
        Self {
            up: vec!["k".to_string(), "up".to_string()],
            down: vec!["j".to_string(), "down".to_string()],
            left: vec!["h".to_string(), "left".to_string()],
            right: vec!["l".to_string(), "right".to_string()],
            toggle: vec!["space".to_string(), "x".to_string()],
            edit: vec!["e".to_string(), "enter".to_string()],
            delete: vec!["d".to_string(), "delete".to_string()],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ComposerBindings {
    pub submit: Vec<String>,
    pub cancel: Vec<String>,
    pub clear: Vec<String>,
}

impl Default for ComposerBindings {
    fn default() -> Self {
        Self {
            submit: vec!["enter".to_string()],
            cancel: vec!["esc".to_string()],
            clear: vec!["ctrl+l".to_string()],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct InlineEditBindings {
    pub commit: Vec<String>,
    pub cancel: Vec<String>,
}

impl Default for InlineEditBindings {
    fn default() -> Self {
        Self {
            commit: vec!["enter".to_string(), "tab".to_string()],
            cancel: vec!["esc".to_string()],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PopupBindings {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub up: Vec<String>,
    pub down: Vec<String>,
}

impl Default for PopupBindings {
    fn default() -> Self {
        Self {
            confirm: vec!["enter".to_string(), "y".to_string()],
            cancel: vec!["esc".to_string(), "n".to_string()],
            up: vec!["k".to_string(), "up".to_string()],
            down: vec!["j".to_string(), "down".to_string()],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Theme {
    pub border_default: String,
    pub border_active: String,
    pub text_highlight: String,
    pub task_done: String,
    pub task_open: String,
    pub muted: String,
    pub accent: String,
    pub toast_info: String,
    pub toast_success: String,
    pub toast_error: String,
    pub quadrants: [String; 4],
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            border_default: "Reset".to_string(),
            border_active: "Green".to_string(),
            text_highlight: "50,50,50".to_string(),
            task_done: "Green".to_string(),
            task_open: "Reset".to_string(),
            muted: "DarkGray".to_string(),
            accent: "Cyan".to_string(),
            toast_info: "Yellow".to_string(),
            toast_success: "LightGreen".to_string(),
            toast_error: "LightRed".to_string(),
            quadrants: [
                "LightRed".to_string(),
                "LightBlue".to_string(),
                "LightYellow".to_string(),
                "Gray".to_string(),
            ],
        }
    }
}

/// Problems met while loading the config. Logging is not up yet at that
/// point, so they are handed back to the caller to report.
#[derive(Debug, Error)]
pub enum ConfigWarning {
    #[error("failed to parse {path:?}, using defaults: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to write {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

impl Config {
    pub fn load() -> (Self, Vec<ConfigWarning>) {
        let (mut config, warnings) = Self::load_from(&config_path());
        config.apply_env_overrides();
        (config, warnings)
    }

    fn load_from(config_path: &Path) -> (Self, Vec<ConfigWarning>) {
        let mut warnings = Vec::new();

        let mut config = match fs::read_to_string(config_path) {
            Ok(content) => Self::from_toml(&content).unwrap_or_else(|source| {
                warnings.push(ConfigWarning::Parse {
                    path: config_path.to_path_buf(),
                    source,
                });
                Config::default()
            }),
            Err(_) => Config::default(),
        };

        let changed = config.normalize_paths();
        if (changed || !config_path.exists())
            && let Err(source) = config.save_to_path(config_path)
        {
            warnings.push(ConfigWarning::Write {
                path: config_path.to_path_buf(),
                source,
            });
        }

        (config, warnings)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<Config>(content)
    }

    pub fn save_to_path(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, content)
    }

    fn normalize_paths(&mut self) -> bool {
        let mut changed = false;

        if self.logging.dir.as_os_str().is_empty() {
            self.logging.dir = default_log_dir();
            changed = true;
        }

        if self.logging.dir.is_relative() {
            self.logging.dir = default_data_dir().join(&self.logging.dir);
            changed = true;
        }

        if self.server.base_url.trim().is_empty() {
            self.server.base_url = ServerConfig::default().base_url;
            changed = true;
        }

        changed
    }

    // Environment wins over the file but is never written back.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("TASKMATRIX_SERVER_URL")
            && !url.trim().is_empty()
        {
            self.server.base_url = url.trim().to_string();
        }
        if let Ok(session) = std::env::var("TASKMATRIX_SESSION")
            && !session.trim().is_empty()
        {
            self.server.session_cookie = session.trim().to_string();
        }
    }
}
