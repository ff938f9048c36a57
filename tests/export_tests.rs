mod common;

use std::fs;

use serde_json::json;

use annotate::{AnnotateError, CountKind, Data};
use common::{row, Workspace};

#[test]
fn exports_identifier_and_label_columns() {
    let ws = Workspace::new();
    ws.write_rows(json!([
        row("b", "cat"),
        row("a", ""),
        row("c,1", "say \"hi\"")
    ]));
    let mut data = Data::new(ws.config().build().unwrap());
    data.load().unwrap();

    let out = ws.tmp.path().join("labels.csv");
    assert_eq!(data.export(&out, "csv").unwrap(), Some(3));
    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        "id,label\nb,cat\na,\n\"c,1\",\"say \"\"hi\"\"\"\n"
    );
}

#[test]
fn export_uses_row_positions_when_configured() {
    let ws = Workspace::new();
    ws.write_rows(json!([{"img": [[0]], "label": "x"}, {"img": [[1]]}]));
    let mut config = ws.config().build().unwrap();
    config.col_filename = "index".into();
    let mut data = Data::new(config);
    data.load().unwrap();

    let out = ws.tmp.path().join("labels.csv");
    data.export(&out, "csv").unwrap();
    assert_eq!(fs::read_to_string(&out).unwrap(), "id,label\n0,x\n1,\n");
}

#[test]
fn export_rejects_other_formats() {
    let ws = Workspace::new();
    ws.write_rows(json!([row("a", "")]));
    let mut data = Data::new(ws.config().build().unwrap());
    data.load().unwrap();

    let out = ws.tmp.path().join("labels.parquet");
    assert!(matches!(
        data.export(&out, "parquet"),
        Err(AnnotateError::UnsupportedFormat(f)) if f == "parquet"
    ));
    assert!(matches!(
        data.export(&out, "CSV"),
        Err(AnnotateError::UnsupportedFormat(f)) if f == "CSV"
    ));
    assert!(!out.exists());
}

#[test]
fn sample_dataset_loads_and_deploys() {
    let ws = Workspace::new();
    let sample = ws.tmp.path().join("sample.json.gz");

    let mut data = Data::new(ws.config().build().unwrap());
    data.create_sample_dataset(&sample, 25, None).unwrap();

    let config = ws
        .config()
        .datafile(&sample)
        .n(Some(3))
        .random(false)
        .build()
        .unwrap();
    let mut data = Data::new(config);
    data.load().unwrap();
    assert_eq!(data.count(CountKind::All), 25);
    assert_eq!(data.count(CountKind::Annotated), 0);

    let report = data.deploy(Some((1.0, 1.0))).unwrap().unwrap();
    assert_eq!(report.pool, 3);
    let first = fs::read_dir(ws.workdir())
        .unwrap()
        .filter_map(|e| e.ok())
        .next()
        .unwrap()
        .path();
    let img = image::open(first).unwrap();
    assert_eq!((img.width(), img.height()), (100, 100));
}

#[test]
fn sample_dataset_respects_backup_policy() {
    let ws = Workspace::new();
    let sample = ws.tmp.path().join("sample.json");
    fs::write(&sample, "[]").unwrap();

    let mut data = Data::new(ws.config().build().unwrap());
    data.create_sample_dataset(&sample, 4, Some(true)).unwrap();
    assert_eq!(
        fs::read_to_string(ws.tmp.path().join("sample.json~")).unwrap(),
        "[]"
    );

    let rows: serde_json::Value = serde_json::from_str(&fs::read_to_string(&sample).unwrap()).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 4);
}
