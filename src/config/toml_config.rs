use crate::domain::constraints::{ConstraintSet, FieldRule};
use crate::domain::model::{Car, Domain, Liability};
use crate::utils::error::{ImportError, Result};
use crate::utils::validation::{
    validate_path, validate_positive_number, validate_separator, validate_socket_address, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:5000";
pub const DEFAULT_UPLOAD_DIR: &str = "./uploads";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
    pub server: ServerConfig,
    pub import: ImportSettings,
    pub constraints: ConstraintsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_address: String,
    pub upload_dir: String,
    pub max_upload_bytes: usize,
    pub json_logs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            upload_dir: DEFAULT_UPLOAD_DIR.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            json_logs: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportSettings {
    pub csv_separator: String,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            csv_separator: ",".to_string(),
        }
    }
}

/// 未設定的 domain 使用內建規則
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConstraintsConfig {
    pub car: Option<Vec<FieldRule>>,
    pub liability: Option<Vec<FieldRule>>,
}

impl ImportConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ImportError::ConfigError {
                message: format!("config file not found: {}", path.display()),
            },
            _ => ImportError::IoError(e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ImportError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${UPLOAD_DIR})，未設定者保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ImportError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn constraints_for(&self, domain: Domain) -> Result<ConstraintSet> {
        let configured = match domain {
            Domain::Car => &self.constraints.car,
            Domain::Liability => &self.constraints.liability,
        };

        match configured {
            Some(rules) => ConstraintSet::from_rules(rules.clone()),
            None => Ok(ConstraintSet::builtin(domain)),
        }
    }

    pub fn upload_dir(&self) -> PathBuf {
        PathBuf::from(&self.server.upload_dir)
    }

    pub fn csv_separator(&self) -> &str {
        &self.import.csv_separator
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_socket_address("server.bind_address", &self.server.bind_address)?;
        validate_path("server.upload_dir", &self.server.upload_dir)?;
        validate_positive_number("server.max_upload_bytes", self.server.max_upload_bytes, 1)?;
        validate_separator("import.csv_separator", &self.import.csv_separator)?;

        // 規則必須能編譯且涵蓋模型所有欄位
        self.constraints_for(Domain::Car)?.ensure_covers::<Car>()?;
        self.constraints_for(Domain::Liability)?
            .ensure_covers::<Liability>()?;

        Ok(())
    }
}

impl Validate for ImportConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::constraints::FieldType;
    use crate::domain::model::DomainModel;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const LIABILITY_RULES: &str = r#"
[[constraints.liability]]
field = "legal_identifier"
type = "string"
min_length = 1

[[constraints.liability]]
field = "start_date"
date_format = "%Y-%m-%d"

[[constraints.liability]]
field = "end_date"
date_format = "%Y-%m-%d"

[[constraints.liability]]
field = "car_registration_number"
regex = "^[A-Z0-9]{4,8}$"

[[constraints.liability]]
field = "active"
type = "boolean"
"#;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ImportConfig::from_toml_str("").unwrap();

        assert_eq!(config.server.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.server.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.csv_separator(), ",");
        assert!(config.validate().is_ok());
        assert_eq!(
            config.constraints_for(Domain::Car).unwrap().len(),
            Car::FIELDS.len()
        );
    }

    #[test]
    fn test_parse_constraint_tables() {
        let config = ImportConfig::from_toml_str(LIABILITY_RULES).unwrap();
        let set = config.constraints_for(Domain::Liability).unwrap();

        let fields: Vec<&str> = set.iter().map(|c| c.field()).collect();
        assert_eq!(fields, Liability::FIELDS.to_vec());
        let active = set.iter().last().unwrap();
        assert_eq!(active.rule.field_type, Some(FieldType::Boolean));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("RF_TEST_UPLOAD_DIR", "/tmp/rf-uploads");

        let toml_content = r#"
[server]
upload_dir = "${RF_TEST_UPLOAD_DIR}"
"#;

        let config = ImportConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.server.upload_dir, "/tmp/rf-uploads");

        std::env::remove_var("RF_TEST_UPLOAD_DIR");
    }

    #[test]
    fn test_config_validation() {
        let bad_address = ImportConfig::from_toml_str(
            r#"
[server]
bind_address = "not-an-address"
"#,
        )
        .unwrap();
        assert!(bad_address.validate().is_err());

        let bad_separator = ImportConfig::from_toml_str(
            r#"
[import]
csv_separator = "::"
"#,
        )
        .unwrap();
        assert!(bad_separator.validate().is_err());

        let incomplete = ImportConfig::from_toml_str(
            r#"
[[constraints.car]]
field = "registration"
type = "string"
"#,
        )
        .unwrap();
        assert!(matches!(
            incomplete.validate(),
            Err(ImportError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_untyped_id_rule_is_rejected() {
        let mut toml_content = String::new();
        for field in Car::FIELDS {
            toml_content.push_str(&format!("[[constraints.car]]\nfield = \"{}\"\n", field));
            match *field {
                "fuel_type_id" => toml_content.push_str("regex = \"^.+$\"\n"),
                "vehicle_status_id" => toml_content.push_str("type = \"integer\"\nmin = 1.0\n"),
                _ => toml_content.push_str("type = \"string\"\n"),
            }
        }

        let config = ImportConfig::from_toml_str(&toml_content).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ImportError::ConfigValidationError { ref field, .. } if field == "constraints.car.fuel_type_id"
        ));

        let fixed = toml_content.replace("regex = \"^.+$\"", "type = \"integer\"");
        assert!(ImportConfig::from_toml_str(&fixed).unwrap().validate().is_ok());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result = ImportConfig::from_toml_str(
            r#"
[server]
port = 8080
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[server]\nbind_address = \"127.0.0.1:8080\"\n")
            .unwrap();

        let config = ImportConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:8080");

        assert!(matches!(
            ImportConfig::from_file("/definitely/not/here.toml"),
            Err(ImportError::ConfigError { .. })
        ));
    }
}
