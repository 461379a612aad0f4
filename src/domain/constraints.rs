use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::model::{Domain, DomainModel};
use crate::utils::error::{ImportError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float)
    }
}

/// 單一欄位的宣告式規則 (TOML 中的 `[[constraints.<domain>]]`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldRule {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: Option<FieldType>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub greater_than: Option<f64>,
    pub less_than: Option<f64>,
    pub regex: Option<String>,
    pub date_format: Option<String>,
}

impl FieldRule {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::default()
        }
    }

    pub fn of_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn between(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn greater_than(mut self, bound: f64) -> Self {
        self.greater_than = Some(bound);
        self
    }

    pub fn less_than(mut self, bound: f64) -> Self {
        self.less_than = Some(bound);
        self
    }

    pub fn matching(mut self, pattern: impl Into<String>) -> Self {
        self.regex = Some(pattern.into());
        self
    }

    pub fn date(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    fn has_numeric_bounds(&self) -> bool {
        self.min.is_some()
            || self.max.is_some()
            || self.greater_than.is_some()
            || self.less_than.is_some()
    }

    fn check_consistency(&self, path: &str) -> Result<()> {
        let invalid = |message: String| ImportError::ConfigValidationError {
            field: path.to_string(),
            message,
        };

        if self.field.trim().is_empty() {
            return Err(invalid("field name cannot be empty".to_string()));
        }

        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                return Err(invalid(format!("min_length {} exceeds max_length {}", min, max)));
            }
        }

        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(invalid(format!("min {} exceeds max {}", min, max)));
            }
        }

        if let Some(field_type) = self.field_type {
            if self.has_numeric_bounds() && !field_type.is_numeric() {
                return Err(invalid(format!(
                    "numeric bounds cannot apply to a {} field",
                    field_type.name()
                )));
            }
            let has_length = self.min_length.is_some() || self.max_length.is_some();
            if has_length && field_type != FieldType::String {
                return Err(invalid(format!(
                    "length bounds cannot apply to a {} field",
                    field_type.name()
                )));
            }
        }

        if matches!(self.date_format.as_deref(), Some(f) if f.trim().is_empty()) {
            return Err(invalid("date_format cannot be empty".to_string()));
        }

        Ok(())
    }
}

/// 編譯後的欄位規則
#[derive(Debug, Clone)]
pub struct FieldConstraint {
    pub rule: FieldRule,
    pub pattern: Option<Regex>,
}

impl FieldConstraint {
    pub fn field(&self) -> &str {
        &self.rule.field
    }
}

/// 每個 domain 一組、執行期不可變的欄位規則，依宣告順序檢查
#[derive(Debug, Clone)]
pub struct ConstraintSet {
    fields: Vec<FieldConstraint>,
}

impl ConstraintSet {
    pub fn from_rules(rules: Vec<FieldRule>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(rules.len());

        for rule in rules {
            let path = format!("constraints.{}", rule.field);
            rule.check_consistency(&path)?;

            if !seen.insert(rule.field.clone()) {
                return Err(ImportError::ConfigValidationError {
                    field: path,
                    message: "field declared more than once".to_string(),
                });
            }

            let pattern = match &rule.regex {
                Some(source) => Some(Regex::new(source).map_err(|e| {
                    ImportError::InvalidConfigValueError {
                        field: format!("{}.regex", path),
                        value: source.clone(),
                        reason: e.to_string(),
                    }
                })?),
                None => None,
            };

            fields.push(FieldConstraint { rule, pattern });
        }

        Ok(Self { fields })
    }

    /// 內建規則：只檢查型別，id 欄位須為正整數
    pub fn builtin(domain: Domain) -> Self {
        let rules = match domain {
            Domain::Car => vec![
                text_rule("registration"),
                text_rule("vin"),
                text_rule("make"),
                text_rule("model"),
                text_rule("first_registration_date"),
                text_rule("production_year"),
                text_rule("mileage"),
                text_rule("fuel_consumption"),
                FieldRule::new("fuel_type_id")
                    .of_type(FieldType::Integer)
                    .greater_than(0.0),
                FieldRule::new("vehicle_status_id")
                    .of_type(FieldType::Integer)
                    .greater_than(0.0),
            ],
            Domain::Liability => vec![
                text_rule("legal_identifier"),
                text_rule("start_date"),
                text_rule("end_date"),
                text_rule("car_registration_number"),
                text_rule("active"),
            ],
        };

        Self {
            fields: rules
                .into_iter()
                .map(|rule| FieldConstraint {
                    rule,
                    pattern: None,
                })
                .collect(),
        }
    }

    /// 領域模型的每個欄位都必須有規則，converter 才能假設記錄完整
    pub fn ensure_covers<M: DomainModel>(&self) -> Result<()> {
        let declared: HashSet<&str> = self.fields.iter().map(|c| c.field()).collect();
        let missing: Vec<&str> = M::FIELDS
            .iter()
            .copied()
            .filter(|field| !declared.contains(field))
            .collect();

        if !missing.is_empty() {
            return Err(ImportError::ConfigValidationError {
                field: format!("constraints.{}", M::DOMAIN),
                message: format!("no constraint declared for: {}", missing.join(", ")),
            });
        }

        for (field, required) in M::TYPED_FIELDS {
            let declared_type = self
                .fields
                .iter()
                .find(|c| c.field() == *field)
                .and_then(|c| c.rule.field_type);
            if declared_type != Some(*required) {
                return Err(ImportError::ConfigValidationError {
                    field: format!("constraints.{}.{}", M::DOMAIN, field),
                    message: format!("field must declare type = \"{}\"", required.name()),
                });
            }
        }

        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldConstraint> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn text_rule(field: &str) -> FieldRule {
    FieldRule::new(field).of_type(FieldType::String)
}
