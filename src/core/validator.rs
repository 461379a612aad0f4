use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::domain::constraints::{ConstraintSet, FieldConstraint, FieldType};
use crate::domain::model::{integer_value, value_text, Record};
use crate::domain::ports::Validator;
use crate::utils::error::{ImportError, Result};

/// 依宣告的欄位規則逐筆檢查；第一個不符的欄位即中止整批
#[derive(Debug, Clone)]
pub struct ConstraintValidator {
    constraints: ConstraintSet,
}

impl ConstraintValidator {
    pub fn new(constraints: ConstraintSet) -> Self {
        Self { constraints }
    }

    fn check_record(&self, row: usize, record: &Record) -> Result<()> {
        for constraint in self.constraints.iter() {
            let value = record.get(constraint.field());
            if let Err(reason) = check_field(constraint, value) {
                return Err(ImportError::ValidationError {
                    row,
                    field: constraint.field().to_string(),
                    value: value.map(display_value).unwrap_or_else(|| "<missing>".to_string()),
                    reason,
                });
            }
        }
        Ok(())
    }
}

impl Validator for ConstraintValidator {
    fn validate(&self, records: Vec<Record>) -> Result<Vec<Record>> {
        for (index, record) in records.iter().enumerate() {
            self.check_record(index + 1, record)?;
        }
        Ok(records)
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 回傳不符原因
fn check_field(constraint: &FieldConstraint, value: Option<&Value>) -> std::result::Result<(), String> {
    let rule = &constraint.rule;
    let value = match value {
        None => return Err("field is missing".to_string()),
        Some(Value::Null) => return Err("value is null".to_string()),
        Some(value) => value,
    };

    if matches!(value, Value::Array(_) | Value::Object(_)) {
        return Err("expected a scalar value".to_string());
    }

    if let Some(field_type) = rule.field_type {
        check_type(field_type, value)?;
    }

    if rule.min_length.is_some() || rule.max_length.is_some() {
        let length = match value {
            Value::String(s) => s.chars().count(),
            _ => return Err("length bounds require a string value".to_string()),
        };
        if let Some(min) = rule.min_length {
            if length < min {
                return Err(format!("length {} is shorter than {}", length, min));
            }
        }
        if let Some(max) = rule.max_length {
            if length > max {
                return Err(format!("length {} is longer than {}", length, max));
            }
        }
    }

    if rule.min.is_some() || rule.max.is_some() || rule.greater_than.is_some() || rule.less_than.is_some() {
        let number = as_number(value).ok_or_else(|| "expected a numeric value".to_string())?;
        if let Some(min) = rule.min {
            if number < min {
                return Err(format!("{} is less than {}", number, min));
            }
        }
        if let Some(max) = rule.max {
            if number > max {
                return Err(format!("{} is greater than {}", number, max));
            }
        }
        if let Some(bound) = rule.greater_than {
            if number <= bound {
                return Err(format!("{} must be greater than {}", number, bound));
            }
        }
        if let Some(bound) = rule.less_than {
            if number >= bound {
                return Err(format!("{} must be less than {}", number, bound));
            }
        }
    }

    let text = value_text(value).unwrap_or_default();

    if let Some(pattern) = &constraint.pattern {
        if !pattern.is_match(&text) {
            return Err(format!("does not match pattern {}", pattern.as_str()));
        }
    }

    if let Some(format) = &rule.date_format {
        let parses = NaiveDateTime::parse_from_str(&text, format).is_ok()
            || NaiveDate::parse_from_str(&text, format).is_ok();
        if !parses {
            return Err(format!("is not a date in format {}", format));
        }
    }

    Ok(())
}

/// 文字來源 (csv/txt/xlsx) 只會產生字串，數值與布林型別允許由字串轉換
fn check_type(field_type: FieldType, value: &Value) -> std::result::Result<(), String> {
    let ok = match field_type {
        FieldType::String => value.is_string(),
        FieldType::Integer => integer_value(value).is_some(),
        FieldType::Float => match value {
            Value::Number(_) => true,
            Value::String(s) => s.trim().parse::<f64>().map(f64::is_finite).unwrap_or(false),
            _ => false,
        },
        FieldType::Boolean => match value {
            Value::Bool(_) => true,
            Value::String(s) => {
                let s = s.trim();
                s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false")
            }
            _ => false,
        },
    };

    if ok {
        Ok(())
    } else {
        Err(format!("expected {}", field_type.name()))
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::constraints::FieldRule;
    use serde_json::json;

    fn mot_validator() -> ConstraintValidator {
        ConstraintValidator::new(
            ConstraintSet::from_rules(vec![
                FieldRule::new("mot_id")
                    .of_type(FieldType::Integer)
                    .greater_than(0.0),
                FieldRule::new("start_date").matching(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{3}$"),
                FieldRule::new("end_date").matching(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{3}$"),
                FieldRule::new("car_id")
                    .of_type(FieldType::Integer)
                    .greater_than(0.0),
            ])
            .unwrap(),
        )
    }

    fn mot(id: Value, start: &str) -> Record {
        let mut record = Record::new();
        record.insert("mot_id", id);
        record.insert("start_date", start);
        record.insert("end_date", "2023-03-15 00:00:00.000");
        record.insert("car_id", 1);
        record
    }

    #[test]
    fn test_validate_returns_input_when_all_valid() {
        let records = vec![
            mot(json!(1), "2022-03-15 00:00:00.000"),
            mot(json!(2), "2023-03-15 00:00:00.000"),
        ];

        let validated = mot_validator().validate(records.clone()).unwrap();
        assert_eq!(validated, records);
    }

    #[test]
    fn test_validate_rejects_whole_batch_on_one_bad_record() {
        let records = vec![
            mot(json!(1), "2022-03-15 00:00:00.000"),
            mot(json!(2), "15/03/2023"),
            mot(json!(3), "2024-03-15 00:00:00.000"),
        ];

        let err = mot_validator().validate(records).unwrap_err();
        match err {
            ImportError::ValidationError { row, field, value, .. } => {
                assert_eq!(row, 2);
                assert_eq!(field, "start_date");
                assert_eq!(value, "15/03/2023");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_names_non_numeric_id() {
        let validator = ConstraintValidator::new(
            ConstraintSet::from_rules(vec![FieldRule::new("id")
                .of_type(FieldType::Integer)
                .greater_than(0.0)])
            .unwrap(),
        );
        let mut record = Record::new();
        record.insert("id", "not_a_number");

        let err = validator.validate(vec![record]).unwrap_err();
        assert!(matches!(err, ImportError::ValidationError { ref field, .. } if field == "id"));
    }

    #[test]
    fn test_integer_coerced_from_text() {
        let validator = mot_validator();
        assert!(validator
            .validate(vec![mot(json!("5"), "2022-03-15 00:00:00.000")])
            .is_ok());
        assert!(validator
            .validate(vec![mot(json!("0"), "2022-03-15 00:00:00.000")])
            .is_err());
        assert!(validator
            .validate(vec![mot(json!(1.5), "2022-03-15 00:00:00.000")])
            .is_err());
    }

    #[test]
    fn test_integer_outside_i64_range_is_rejected() {
        let validator = mot_validator();

        let err = validator
            .validate(vec![mot(json!(u64::MAX), "2022-03-15 00:00:00.000")])
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::ValidationError { ref field, ref value, .. }
                if field == "mot_id" && value == "18446744073709551615"
        ));

        assert!(validator
            .validate(vec![mot(json!("99999999999999999999"), "2022-03-15 00:00:00.000")])
            .is_err());
    }

    #[test]
    fn test_string_type_rejects_numbers() {
        let rule = FieldRule::new("vin").of_type(FieldType::String);
        let set = ConstraintSet::from_rules(vec![rule]).unwrap();
        let constraint = set.iter().next().unwrap();

        assert!(check_field(constraint, Some(&json!("ABC"))).is_ok());
        assert!(check_field(constraint, Some(&json!(123))).is_err());
        assert!(check_field(constraint, Some(&Value::Null)).is_err());
        assert!(check_field(constraint, None).is_err());
    }

    #[test]
    fn test_length_and_range_bounds() {
        let set = ConstraintSet::from_rules(vec![
            FieldRule::new("registration")
                .of_type(FieldType::String)
                .length(Some(4), Some(8)),
            FieldRule::new("fuel_consumption")
                .of_type(FieldType::Float)
                .between(0.0, 40.0),
        ])
        .unwrap();
        let mut constraints = set.iter();
        let registration = constraints.next().unwrap();
        let consumption = constraints.next().unwrap();

        assert!(check_field(registration, Some(&json!("WA12345"))).is_ok());
        assert!(check_field(registration, Some(&json!("WA1"))).is_err());
        assert!(check_field(registration, Some(&json!("WA1234567"))).is_err());

        assert!(check_field(consumption, Some(&json!("6.5"))).is_ok());
        assert!(check_field(consumption, Some(&json!(40))).is_ok());
        assert!(check_field(consumption, Some(&json!(40.1))).is_err());
        assert!(check_field(consumption, Some(&json!("NaN"))).is_err());
    }

    #[test]
    fn test_boolean_and_date_rules() {
        let set = ConstraintSet::from_rules(vec![
            FieldRule::new("active").of_type(FieldType::Boolean),
            FieldRule::new("start_date").date("%Y-%m-%d"),
        ])
        .unwrap();
        let mut constraints = set.iter();
        let active = constraints.next().unwrap();
        let start = constraints.next().unwrap();

        assert!(check_field(active, Some(&json!(true))).is_ok());
        assert!(check_field(active, Some(&json!("False"))).is_ok());
        assert!(check_field(active, Some(&json!("yes"))).is_err());

        assert!(check_field(start, Some(&json!("2023-01-31"))).is_ok());
        assert!(check_field(start, Some(&json!("2023-02-31"))).is_err());
        assert!(check_field(start, Some(&json!("31.01.2023"))).is_err());
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let mut record = mot(json!(1), "2022-03-15 00:00:00.000");
        record.insert("comment", json!({"nested": true}));
        assert!(mot_validator().validate(vec![record]).is_ok());
    }
}
