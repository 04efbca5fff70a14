use chrono::NaiveDate;
use forecast_trade::data::DataLoader;
use forecast_trade::ForecastError;
use std::io::Write;
use tempfile::NamedTempFile;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_data_loader_from_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date,TSLA,BND,SPY").unwrap();
    writeln!(file, "2024-08-01,216.86,72.10,543.01").unwrap();
    writeln!(file, "2024-08-02,207.67,72.65,533.27").unwrap();
    writeln!(file, "2024-08-05,198.88,72.70,517.38").unwrap();

    let frame = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(frame.len(), 3);
    assert_eq!(frame.assets(), &["TSLA", "BND", "SPY"]);
    assert_eq!(frame.dates()[2], date(2024, 8, 5));

    let tsla = frame.series("TSLA").unwrap();
    assert_eq!(tsla.prices(), &[216.86, 207.67, 198.88]);
}

#[test]
fn test_missing_cells_and_unsorted_rows() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,TSLA,BND").unwrap();
    writeln!(file, "2024-08-05,198.88,72.70").unwrap();
    writeln!(file, "2024-08-01,216.86,").unwrap();
    writeln!(file, "2024-08-02,207.67,72.65").unwrap();

    let frame = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(
        frame.dates(),
        &[date(2024, 8, 1), date(2024, 8, 2), date(2024, 8, 5)]
    );
    assert_eq!(
        frame.column("BND").unwrap(),
        &[None, Some(72.65), Some(72.70)]
    );
    assert_eq!(frame.series("BND").unwrap().len(), 2);
}

#[test]
fn test_load_series() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,TSLA").unwrap();
    writeln!(file, "2024-08-01,216.86").unwrap();
    writeln!(file, "2024-08-02,207.67").unwrap();

    let series = DataLoader::load_series(file.path(), "TSLA").unwrap();
    assert_eq!(series.asset(), "TSLA");
    assert_eq!(series.last_price(), 207.67);

    assert!(matches!(
        DataLoader::load_series(file.path(), "NVDA"),
        Err(ForecastError::Portfolio(_))
    ));
}

#[test]
fn test_missing_file_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let result = DataLoader::from_csv(dir.path().join("prices.csv"));
    assert!(matches!(result, Err(ForecastError::DataUnavailable(_))));
}

#[test]
fn test_duplicate_dates_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,TSLA").unwrap();
    writeln!(file, "2024-08-01,216.86").unwrap();
    writeln!(file, "2024-08-01,207.67").unwrap();

    assert!(DataLoader::from_csv(file.path()).is_err());
}

#[test]
fn test_no_time_column() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "TSLA,BND").unwrap();
    writeln!(file, "216.86,72.10").unwrap();

    assert!(matches!(
        DataLoader::from_csv(file.path()),
        Err(ForecastError::Data(_))
    ));
}
