use dashboard_pipeline::ingestion::csv::{ingest_csv_from_path, ingest_csv_from_reader};
use dashboard_pipeline::screens;
use dashboard_pipeline::types::{parse_timestamp, DataType, Field, Schema, Value};

fn people_schema() -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Int64),
        Field::new("name", DataType::Utf8),
        Field::new("score", DataType::Float64),
        Field::new("active", DataType::Bool),
    ])
}

fn reader(input: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes())
}

#[test]
fn ingest_csv_from_path_happy_path() {
    let schema = people_schema();
    let ds = ingest_csv_from_path("tests/fixtures/people.csv", &schema).unwrap();

    assert_eq!(ds.row_count(), 2);
    assert_eq!(
        ds.rows[0],
        vec![
            Value::Int64(1),
            Value::Utf8("Ada".to_string()),
            Value::Float64(98.5),
            Value::Bool(true),
        ]
    );
}

#[test]
fn ingest_csv_allows_reordered_columns() {
    let schema = people_schema();
    let ds = ingest_csv_from_reader(&mut reader("name,id,active,score\nAda,1,true,98.5\n"), &schema).unwrap();
    assert_eq!(ds.row_count(), 1);
    assert_eq!(ds.rows[0][0], Value::Int64(1));
    assert_eq!(ds.rows[0][1], Value::Utf8("Ada".to_string()));
}

#[test]
fn ingest_csv_errors_on_missing_required_column() {
    let schema = people_schema();
    let err = ingest_csv_from_reader(&mut reader("id,name,score\n1,Ada,98.5\n"), &schema).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("schema mismatch"));
    assert!(msg.contains("missing required column 'active'"));
}

#[test]
fn ingest_csv_errors_on_type_parse() {
    let schema = people_schema();
    let err = ingest_csv_from_reader(&mut reader("id,name,score,active\nnot_an_int,Ada,98.5,true\n"), &schema)
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("failed to parse value"));
    assert!(msg.contains("column 'id'"));
    assert!(msg.contains("row 2"));
}

#[test]
fn ingest_csv_rejects_non_finite_floats() {
    let schema = people_schema();
    let err = ingest_csv_from_reader(&mut reader("id,name,score,active\n1,Ada,NaN,true\n"), &schema).unwrap_err();
    assert!(err.to_string().contains("column 'score'"));
}

#[test]
fn empty_cells_and_missing_nullable_columns_are_null() {
    let preset = screens::likes_leaderboard(50);
    let ds = ingest_csv_from_path("tests/fixtures/leaderboard.csv", &preset.schema).unwrap();

    assert_eq!(ds.row_count(), 15);
    let stories = preset.schema.index_of("storiesCount").unwrap();
    assert!(ds.rows.iter().all(|row| row[stories].is_null()));

    let schema = Schema::new(vec![
        Field::new("title", DataType::Utf8),
        Field::new("views", DataType::Int64).nullable(),
    ]);
    let ds = ingest_csv_from_reader(&mut reader("title,views\nThe Moonlight Garden,\n"), &schema).unwrap();
    assert_eq!(ds.rows[0][1], Value::Null);
}

#[test]
fn timestamps_parse_from_plain_dates() {
    let preset = screens::leonardo_usage();
    let ds = ingest_csv_from_path("tests/fixtures/leonardo_usage.csv", &preset.schema).unwrap();

    assert_eq!(ds.row_count(), 18);
    assert_eq!(
        ds.value(0, "name"),
        Some(&Value::Timestamp(parse_timestamp("2023-07-10").unwrap()))
    );
    assert_eq!(ds.value(17, "remaining"), Some(&Value::Int64(50)));
    assert_eq!(ds.value(17, "chatGPTCost"), Some(&Value::Float64(35.8)));
}
