use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::domain::constraints::FieldType;
use crate::utils::error::ImportError;

/// 單筆原始記錄：欄位名稱 -> 原始值，保留來源欄位順序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以表頭對應列值；長度不一致時取較短者
    pub fn from_pairs<K, V>(header: &[K], row: impl IntoIterator<Item = V>) -> Self
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        let data = header
            .iter()
            .zip(row)
            .map(|(key, value)| (key.as_ref().to_string(), value.into()))
            .collect();
        Self { data }
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// 純量值的文字形式；null 或不存在時為 None
    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).and_then(value_text)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 供 converter 使用：驗證後的記錄必定含有該欄位
    pub(crate) fn require_text(&self, field: &str) -> String {
        match self.text(field) {
            Some(text) => text,
            None => panic!("validated record is missing field '{}'", field),
        }
    }

    pub(crate) fn require_i64(&self, field: &str) -> i64 {
        match self.get(field).and_then(integer_value) {
            Some(n) => n,
            None => panic!("validated record has no integer in field '{}'", field),
        }
    }
}

/// 整數欄位的轉換規則，validator 與 converter 共用
pub(crate) fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Car,
    Liability,
}

impl Domain {
    pub fn name(&self) -> &'static str {
        match self {
            Domain::Car => "car",
            Domain::Liability => "liability",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 匯入端點所對應的實體；保險與 MOT 共用 Liability 結構
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Cars,
    Insurances,
    Mots,
}

impl Entity {
    pub fn domain(&self) -> Domain {
        match self {
            Entity::Cars => Domain::Car,
            Entity::Insurances | Entity::Mots => Domain::Liability,
        }
    }

    pub fn route_prefix(&self) -> &'static str {
        match self {
            Entity::Cars => "load_cars_data",
            Entity::Insurances => "load_insurances_data",
            Entity::Mots => "load_mots_data",
        }
    }

    pub fn response_key(&self) -> &'static str {
        match self {
            Entity::Cars => "all_cars",
            Entity::Insurances => "all_insurances",
            Entity::Mots => "all_mots",
        }
    }
}

impl FromStr for Entity {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cars" | "car" => Ok(Entity::Cars),
            "insurances" | "insurance" => Ok(Entity::Insurances),
            "mots" | "mot" => Ok(Entity::Mots),
            other => Err(ImportError::InvalidConfigValueError {
                field: "entity".to_string(),
                value: other.to_string(),
                reason: "Expected one of: cars, insurances, mots".to_string(),
            }),
        }
    }
}

/// 由已驗證記錄建構的不可變領域物件
pub trait DomainModel: Sized + Clone + PartialEq + fmt::Debug + Send + 'static {
    const DOMAIN: Domain;
    /// 宣告順序即輸出順序
    const FIELDS: &'static [&'static str];
    /// 轉換時需要特定型別的欄位，其規則必須宣告相同型別
    const TYPED_FIELDS: &'static [(&'static str, FieldType)] = &[];

    /// 記錄必須已通過驗證；缺欄位屬於程式缺陷，直接 panic
    fn from_record(record: &Record) -> Self;

    fn as_record(&self) -> Record;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Car {
    pub registration: String,
    pub vin: String,
    pub make: String,
    pub model: String,
    pub first_registration_date: String,
    pub production_year: String,
    pub mileage: String,
    pub fuel_consumption: String,
    pub fuel_type_id: i64,
    pub vehicle_status_id: i64,
}

impl DomainModel for Car {
    const DOMAIN: Domain = Domain::Car;
    const FIELDS: &'static [&'static str] = &[
        "registration",
        "vin",
        "make",
        "model",
        "first_registration_date",
        "production_year",
        "mileage",
        "fuel_consumption",
        "fuel_type_id",
        "vehicle_status_id",
    ];
    const TYPED_FIELDS: &'static [(&'static str, FieldType)] = &[
        ("fuel_type_id", FieldType::Integer),
        ("vehicle_status_id", FieldType::Integer),
    ];

    fn from_record(record: &Record) -> Self {
        Self {
            registration: record.require_text("registration"),
            vin: record.require_text("vin"),
            make: record.require_text("make"),
            model: record.require_text("model"),
            first_registration_date: record.require_text("first_registration_date"),
            production_year: record.require_text("production_year"),
            mileage: record.require_text("mileage"),
            fuel_consumption: record.require_text("fuel_consumption"),
            fuel_type_id: record.require_i64("fuel_type_id"),
            vehicle_status_id: record.require_i64("vehicle_status_id"),
        }
    }

    fn as_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("registration", self.registration.clone());
        record.insert("vin", self.vin.clone());
        record.insert("make", self.make.clone());
        record.insert("model", self.model.clone());
        record.insert("first_registration_date", self.first_registration_date.clone());
        record.insert("production_year", self.production_year.clone());
        record.insert("mileage", self.mileage.clone());
        record.insert("fuel_consumption", self.fuel_consumption.clone());
        record.insert("fuel_type_id", self.fuel_type_id);
        record.insert("vehicle_status_id", self.vehicle_status_id);
        record
    }
}

/// 保險或 MOT 等與車輛綁定的法定責任
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Liability {
    pub legal_identifier: String,
    pub start_date: String,
    pub end_date: String,
    pub car_registration_number: String,
    pub active: String,
}

impl DomainModel for Liability {
    const DOMAIN: Domain = Domain::Liability;
    const FIELDS: &'static [&'static str] = &[
        "legal_identifier",
        "start_date",
        "end_date",
        "car_registration_number",
        "active",
    ];

    fn from_record(record: &Record) -> Self {
        Self {
            legal_identifier: record.require_text("legal_identifier"),
            start_date: record.require_text("start_date"),
            end_date: record.require_text("end_date"),
            car_registration_number: record.require_text("car_registration_number"),
            active: record.require_text("active"),
        }
    }

    fn as_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("legal_identifier", self.legal_identifier.clone());
        record.insert("start_date", self.start_date.clone());
        record.insert("end_date", self.end_date.clone());
        record.insert("car_registration_number", self.car_registration_number.clone());
        record.insert("active", self.active.clone());
        record
    }
}
