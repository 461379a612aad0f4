#![cfg(feature = "server")]

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use resource_factory::app::{build_router, AppState};
use resource_factory::ImportConfig;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;
use tokio::net::TcpListener;

const MOTS_CSV: &str = "\
legal_identifier,start_date,end_date,car_registration_number,active
BT/001,2023-01-01,2024-01-01,WA12345,true
BT/002,2023-06-01,2024-06-01,KR98765,false
";

async fn spawn_app(upload_dir: &Path, max_upload_bytes: usize) -> String {
    let mut config = ImportConfig::default();
    config.server.upload_dir = upload_dir.display().to_string();
    config.server.max_upload_bytes = max_upload_bytes;

    let state = AppState::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });

    format!("http://{address}")
}

fn file_form(name: &str, contents: &str) -> Form {
    Form::new().part(
        "file",
        Part::bytes(contents.as_bytes().to_vec()).file_name(name.to_string()),
    )
}

async fn post(url: String, form: Form) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(url)
        .multipart(form)
        .send()
        .await
        .unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

fn upload_dir_is_empty(dir: &TempDir) -> bool {
    std::fs::read_dir(dir.path()).unwrap().next().is_none()
}

#[tokio::test]
async fn test_upload_csv_returns_mots() {
    let uploads = TempDir::new().unwrap();
    let base = spawn_app(uploads.path(), 1024 * 1024).await;

    let (status, body) = post(
        format!("{base}/load_mots_data/csv"),
        file_form("mots.csv", MOTS_CSV),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["all_mots"].as_array().unwrap().len(), 2);
    assert_eq!(body["all_mots"][1]["legal_identifier"], json!("BT/002"));
    assert!(upload_dir_is_empty(&uploads));
}

#[tokio::test]
async fn test_upload_txt_with_separator_field() {
    let uploads = TempDir::new().unwrap();
    let base = spawn_app(uploads.path(), 1024 * 1024).await;

    let form = file_form("insurances.txt", &MOTS_CSV.replace(',', "|")).text("separator", "|");
    let (status, body) = post(format!("{base}/load_insurances_data/txt"), form).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["all_insurances"][0]["car_registration_number"], json!("WA12345"));
}

#[tokio::test]
async fn test_invalid_record_returns_404_and_removes_upload() {
    let uploads = TempDir::new().unwrap();
    let base = spawn_app(uploads.path(), 1024 * 1024).await;

    let cars = json!([{ "registration": "WA12345", "vin": "1HGCM82633A004352" }]);
    let (status, body) = post(
        format!("{base}/load_cars_data/json"),
        file_form("cars.json", &cars.to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("make"));
    assert!(upload_dir_is_empty(&uploads));
}

#[tokio::test]
async fn test_unknown_format_returns_404() {
    let uploads = TempDir::new().unwrap();
    let base = spawn_app(uploads.path(), 1024 * 1024).await;

    let (status, body) = post(
        format!("{base}/load_cars_data/parquet"),
        file_form("cars.parquet", "irrelevant"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("parquet"));
}

#[tokio::test]
async fn test_missing_file_field_returns_404() {
    let uploads = TempDir::new().unwrap();
    let base = spawn_app(uploads.path(), 1024 * 1024).await;

    let form = Form::new().text("separator", ",");
    let (status, body) = post(format!("{base}/load_mots_data/csv"), form).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("'file'"));
}

#[tokio::test]
async fn test_sqlite_upload_needs_query() {
    let uploads = TempDir::new().unwrap();
    let base = spawn_app(uploads.path(), 1024 * 1024).await;

    let (status, body) = post(
        format!("{base}/load_mots_data/sqlite"),
        file_form("mots.db", "not a database"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("query"));
    assert!(upload_dir_is_empty(&uploads));
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let uploads = TempDir::new().unwrap();
    let base = spawn_app(uploads.path(), 64).await;

    let (status, body) = post(
        format!("{base}/load_mots_data/csv"),
        file_form("mots.csv", &MOTS_CSV.repeat(8)),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.get("error").is_some());
    assert!(upload_dir_is_empty(&uploads));
}
