//! INI file configuration adapter.

use crate::domain::error::MultipassError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MultipassError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| MultipassError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, MultipassError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| MultipassError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[data]
path = ./data
assets = AAPL,MSFT

[backtest]
start_date = 2020-01-01
end_date = 2024-12-31
lookback_days = 365
risk_free_rate = 0.02
check_forward_looking = off

[strategy]
name = ma_crossover
fast_period = 20
slow_period = 200
"#;

    #[test]
    fn from_string_parses_sections() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("data", "path"), Some("./data".into()));
        assert_eq!(
            adapter.get_string("strategy", "name"),
            Some("ma_crossover".into())
        );
        assert_eq!(adapter.get_int("backtest", "lookback_days", 0), 365);
        assert_eq!(adapter.get_double("backtest", "risk_free_rate", 0.0), 0.02);
        assert!(!adapter.get_bool("backtest", "check_forward_looking", true));
    }

    #[test]
    fn missing_keys_fall_back() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
        assert_eq!(adapter.get_int("backtest", "lookback_days", 42), 42);
        assert_eq!(adapter.get_double("backtest", "risk_free_rate", 0.5), 0.5);
        assert!(adapter.get_bool("backtest", "check_forward_looking", true));
    }

    #[test]
    fn malformed_numbers_fall_back() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nfast_period = abc\nrate = x\n").unwrap();
        assert_eq!(adapter.get_int("strategy", "fast_period", 20), 20);
        assert_eq!(adapter.get_double("strategy", "rate", 1.5), 1.5);
    }

    #[test]
    fn bool_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[b]\na = true\nb = YES\nc = 1\nd = no\ne = 0\nf = maybe\n",
        )
        .unwrap();
        assert!(adapter.get_bool("b", "a", false));
        assert!(adapter.get_bool("b", "b", false));
        assert!(adapter.get_bool("b", "c", false));
        assert!(!adapter.get_bool("b", "d", true));
        assert!(!adapter.get_bool("b", "e", true));
        assert!(adapter.get_bool("b", "f", true));
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE).unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("backtest", "end_date"),
            Some("2024-12-31".into())
        );
    }

    #[test]
    fn from_file_missing_is_config_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(MultipassError::ConfigParse { .. })));
    }
}
