use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::search::Market;
use crate::search::filter::DEFAULT_MAX_RESULTS;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080/api/symbols/search";
pub const DEFAULT_QUERY_PARAM: &str = "text";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub endpoint: String,
    pub query_param: String,
    pub market: Market,
    pub theme: String,
    pub placeholder: Option<String>,
    pub search: SearchConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 180,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 3_000,
            request_timeout_ms: 10_000,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            query_param: DEFAULT_QUERY_PARAM.to_string(),
            market: Market::default(),
            theme: "dark".to_string(),
            placeholder: None,
            search: SearchConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub query_param: Option<String>,
    pub market: Option<Market>,
    pub theme: Option<String>,
    pub placeholder: Option<String>,
    pub search: Option<PartialSearchConfig>,
    pub http: Option<PartialHttpConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PartialSearchConfig {
    pub debounce_ms: Option<u64>,
    pub max_results: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PartialHttpConfig {
    pub connect_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
}

impl AppConfig {
    pub fn from_cli(cli: &crate::Cli) -> Result<Self> {
        let project_root = std::env::current_dir().context("resolve current dir")?;

        // Project config wins over the global one.
        let project_cfg = load_project_config(&project_root).unwrap_or_default();
        let file_cfg = load_file_config().unwrap_or_default();

        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self::merge(cli, &env, project_cfg, file_cfg)
    }

    /// Resolve every setting with priority CLI > env > project file > global file > default.
    pub fn merge(
        cli: &crate::Cli,
        env: &dyn Fn(&str) -> Option<String>,
        project_cfg: FileConfig,
        file_cfg: FileConfig,
    ) -> Result<Self> {
        let defaults = AppConfig::default();

        let endpoint = cli
            .endpoint
            .clone()
            .or_else(|| env("SYMSEARCH_ENDPOINT"))
            .or(project_cfg.endpoint)
            .or(file_cfg.endpoint)
            .unwrap_or(defaults.endpoint);

        let query_param = cli
            .query_param
            .clone()
            .or(project_cfg.query_param)
            .or(file_cfg.query_param)
            .unwrap_or(defaults.query_param);

        let env_market = match env("SYMSEARCH_MARKET") {
            Some(v) => Some(
                Market::from_str(&v, true)
                    .map_err(|e| anyhow::anyhow!("SYMSEARCH_MARKET: {e}"))?,
            ),
            None => None,
        };
        let market = cli
            .market
            .or(env_market)
            .or(project_cfg.market)
            .or(file_cfg.market)
            .unwrap_or(defaults.market);

        let theme = cli
            .theme
            .clone()
            .or(project_cfg.theme)
            .or(file_cfg.theme)
            .unwrap_or(defaults.theme);

        let placeholder = cli
            .placeholder
            .clone()
            .or(project_cfg.placeholder)
            .or(file_cfg.placeholder);

        let search = {
            let project = project_cfg.search.unwrap_or_default();
            let file = file_cfg.search.unwrap_or_default();
            let env_debounce = match env("SYMSEARCH_DEBOUNCE_MS") {
                Some(v) => Some(
                    v.parse::<u64>()
                        .with_context(|| format!("SYMSEARCH_DEBOUNCE_MS must be a number: {v}"))?,
                ),
                None => None,
            };
            SearchConfig {
                debounce_ms: cli
                    .debounce_ms
                    .or(env_debounce)
                    .or(project.debounce_ms)
                    .or(file.debounce_ms)
                    .unwrap_or(defaults.search.debounce_ms),
                // Never above the hard row cap, whatever the files say.
                max_results: project
                    .max_results
                    .or(file.max_results)
                    .unwrap_or(defaults.search.max_results)
                    .min(DEFAULT_MAX_RESULTS),
            }
        };

        let http = {
            let project = project_cfg.http.unwrap_or_default();
            let file = file_cfg.http.unwrap_or_default();
            HttpConfig {
                connect_timeout_ms: project
                    .connect_timeout_ms
                    .or(file.connect_timeout_ms)
                    .unwrap_or(defaults.http.connect_timeout_ms),
                request_timeout_ms: project
                    .request_timeout_ms
                    .or(file.request_timeout_ms)
                    .unwrap_or(defaults.http.request_timeout_ms),
            }
        };

        Ok(Self {
            endpoint,
            query_param,
            market,
            theme,
            placeholder,
            search,
            http,
        })
    }
}

pub fn load_file_config() -> Result<FileConfig> {
    use std::env;

    fn candidate_paths() -> Vec<PathBuf> {
        let mut v = Vec::new();
        if let Ok(p) = env::var("SYMSEARCH_CONFIG") {
            v.push(PathBuf::from(p));
        }
        if let Ok(xdg_home) = env::var("XDG_CONFIG_HOME") {
            v.push(Path::new(&xdg_home).join("symsearch/config.toml"));
        } else if let Ok(home) = env::var("HOME") {
            v.push(Path::new(&home).join(".config/symsearch/config.toml"));
        }
        if let Ok(dirs) = env::var("XDG_CONFIG_DIRS") {
            for d in dirs.split(':') {
                if !d.is_empty() {
                    v.push(Path::new(d).join("symsearch/config.toml"));
                }
            }
        }
        v
    }

    for p in candidate_paths() {
        if p.exists() {
            let s = fs::read_to_string(&p)
                .with_context(|| format!("read config file: {}", p.display()))?;
            match toml::from_str::<FileConfig>(&s) {
                Ok(cfg) => {
                    info!(path=%p.display(), "loaded config file");
                    return Ok(cfg);
                }
                Err(e) => {
                    warn!(path=%p.display(), error=%e.to_string(), "parse config failed");
                    continue;
                }
            }
        }
    }
    Ok(FileConfig::default())
}

/// Load project-specific configuration from .symsearch/config.toml
pub fn load_project_config(project_root: &Path) -> Result<FileConfig> {
    let project_config_path = project_root.join(".symsearch").join("config.toml");

    if project_config_path.exists() {
        let s = fs::read_to_string(&project_config_path).with_context(|| {
            format!(
                "read project config file: {}",
                project_config_path.display()
            )
        })?;
        match toml::from_str::<FileConfig>(&s) {
            Ok(cfg) => {
                info!(path=%project_config_path.display(), "loaded project config file");
                Ok(cfg)
            }
            Err(e) => {
                warn!(path=%project_config_path.display(), error=%e.to_string(), "parse project config failed");
                Ok(FileConfig::default())
            }
        }
    } else {
        Ok(FileConfig::default())
    }
}
