use slcsp::SlcspError;
use slcsp::output::{write_output, write_output_file};
use slcsp::parser::{load_plans, load_targets, load_zips, read_plans, read_targets, read_zips};
use slcsp::pipeline::{
    InsufficientRatesPolicy, assign_areas_to_zipcodes, assign_rates_to_zipcodes, create_area_rates,
    dedup_zip_areas, resolve_ambiguity, run_pipeline,
};
use slcsp::types::{AreaRate, AreaRates, OutputRecord, TargetZip, ZipAreaRecord};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn out(zipcode: &str, rate: Option<f64>) -> OutputRecord {
    OutputRecord {
        zipcode: zipcode.to_string(),
        rate,
    }
}

#[test]
fn test_full_pipeline() {
    let plans = load_plans(fixture("plans.csv")).expect("Failed to load plans");
    let zips = load_zips(fixture("zips.csv")).expect("Failed to load zips");
    let targets = load_targets(fixture("slcsp.csv")).expect("Failed to load targets");

    let result = run_pipeline(&plans, &zips, &targets, InsufficientRatesPolicy::Fail).unwrap();

    assert_eq!(
        result.records,
        vec![
            out("64148", Some(245.2)),
            out("54923", None),
            out("00501", Some(150.25)),
            out("40813", None),
        ]
    );

    let stats = &result.stats;
    assert_eq!(stats.target_zips, 5);
    assert_eq!(stats.matched_zips, 4);
    assert_eq!(stats.unmatched_zips, 1);
    assert_eq!(stats.rated_zips, 2);
    assert_eq!(stats.ambiguous_zips, 1);
    assert_eq!(stats.unrated_zips, 1);
    assert_eq!(stats.rate_areas, 4);
}

#[test]
fn test_full_pipeline_output_matches_expected_file() {
    let plans = load_plans(fixture("plans.csv")).unwrap();
    let zips = load_zips(fixture("zips.csv")).unwrap();
    let targets = load_targets(fixture("slcsp.csv")).unwrap();
    let result = run_pipeline(&plans, &zips, &targets, InsufficientRatesPolicy::Fail).unwrap();

    let path = format!("{}/slcsp_integration_output.csv", std::env::temp_dir().display());
    let _ = std::fs::remove_file(&path);
    write_output_file(&path, &result.records).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    let expected = std::fs::read_to_string(fixture("expected.csv")).unwrap();
    assert_eq!(written, expected);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_stages_compose_step_by_step() {
    let plans = load_plans(fixture("plans.csv")).unwrap();
    let zips = load_zips(fixture("zips.csv")).unwrap();
    let targets = load_targets(fixture("slcsp.csv")).unwrap();

    let area_rates = create_area_rates(&plans).unwrap();
    assert_eq!(area_rates.get(3), Some(245.2));
    assert_eq!(area_rates.get(15), Some(196.64));
    assert_eq!(area_rates.get(11), Some(235.65));
    assert_eq!(area_rates.get(1), Some(150.25));
    assert_eq!(area_rates.get(8), None);

    let zip_areas = assign_areas_to_zipcodes(&targets, &zips);
    let pairs: Vec<(&str, u32)> = zip_areas
        .iter()
        .map(|z| (z.zipcode.as_str(), z.rate_area))
        .collect();
    assert_eq!(
        pairs,
        vec![("64148", 3), ("54923", 15), ("54923", 11), ("00501", 1), ("40813", 8)]
    );

    let zip_rates = assign_rates_to_zipcodes(&zip_areas, &area_rates);
    assert_eq!(zip_rates.len(), 5);
    assert_eq!(zip_rates[4].rate, None);

    let output = resolve_ambiguity(&zip_rates);
    assert_eq!(output.len(), 4);
}

#[test]
fn test_end_to_end_second_lowest_distinct() {
    let plans = read_plans(
        "plan_id,metal_level,rate,rate_area\n\
         p1,Silver,100.0,1\n\
         p2,Silver,100.0,1\n\
         p3,Silver,150.0,1\n"
            .as_bytes(),
    )
    .unwrap();
    let zips = read_zips("zipcode,rate_area\n00501,1\n".as_bytes()).unwrap();
    let targets = read_targets("zipcode,rate\n00501,\n".as_bytes()).unwrap();

    let result = run_pipeline(&plans, &zips, &targets, InsufficientRatesPolicy::Fail).unwrap();
    assert_eq!(result.records, vec![out("00501", Some(150.0))]);
}

#[test]
fn test_end_to_end_ambiguous_zip() {
    let zip_areas = assign_areas_to_zipcodes(
        &[TargetZip {
            zipcode: "54923".to_string(),
        }],
        &[
            ZipAreaRecord {
                zipcode: "54923".to_string(),
                rate_area: 15,
            },
            ZipAreaRecord {
                zipcode: "54923".to_string(),
                rate_area: 11,
            },
        ],
    );
    let area_rates: AreaRates = vec![
        AreaRate { rate_area: 15, rate: 196.64 },
        AreaRate { rate_area: 11, rate: 235.65 },
    ]
    .into_iter()
    .collect();

    let output = resolve_ambiguity(&assign_rates_to_zipcodes(&zip_areas, &area_rates));
    assert_eq!(output, vec![out("54923", None)]);
}

#[test]
fn test_area_rate_survives_join_exactly() {
    let plans = read_plans(
        "metal_level,rate,rate_area\n\
         Silver,1165.5,6\n\
         Silver,1000.123456789,6\n\
         Silver,1165.500000001,6\n"
            .as_bytes(),
    )
    .unwrap();
    let area_rates = create_area_rates(&plans).unwrap();
    let zip_areas = vec![ZipAreaRecord {
        zipcode: "31551".to_string(),
        rate_area: 6,
    }];

    let rows = assign_rates_to_zipcodes(&zip_areas, &area_rates);
    assert_eq!(rows[0].rate, area_rates.get(6));
    assert_eq!(rows[0].rate, Some(1165.5));
}

#[test]
fn test_zip_absent_from_mapping_is_absent_from_output() {
    let plans = load_plans(fixture("plans.csv")).unwrap();
    let zips = load_zips(fixture("zips.csv")).unwrap();
    let targets = vec![TargetZip {
        zipcode: "99999".to_string(),
    }];

    let result = run_pipeline(&plans, &zips, &targets, InsufficientRatesPolicy::Fail).unwrap();
    assert!(result.records.is_empty());

    let mut buf = Vec::new();
    write_output(&mut buf, &result.records).unwrap();
    assert_eq!(String::from_utf8(buf).unwrap(), "zipcode,rate\n");
}

#[test]
fn test_dedup_of_fixture_is_idempotent() {
    let zips = load_zips(fixture("zips.csv")).unwrap();
    let once = dedup_zip_areas(&zips);

    assert_eq!(once.len(), zips.len() - 1);
    assert_eq!(dedup_zip_areas(&once), once);
}

#[test]
fn test_insufficient_rates_is_fatal() {
    let plans = read_plans("metal_level,rate,rate_area\nSilver,100.0,2\nSilver,100.0,2\n".as_bytes()).unwrap();
    let zips = read_zips("zipcode,rate_area\n00501,2\n".as_bytes()).unwrap();
    let targets = read_targets("zipcode\n00501\n".as_bytes()).unwrap();

    let err = run_pipeline(&plans, &zips, &targets, InsufficientRatesPolicy::Fail).unwrap_err();
    assert!(matches!(err, SlcspError::InsufficientRates { rate_area: 2, distinct: 1 }));
}

#[test]
fn test_malformed_zip_row_names_line() {
    let err = read_zips("zipcode,rate_area\n00501,1\n00502,x\n".as_bytes()).unwrap_err();
    let msg = err.to_string();

    assert!(msg.contains("zips table"));
    assert!(msg.contains("line 3"));
    assert!(msg.contains("rate_area"));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = load_plans(fixture("does_not_exist.csv")).unwrap_err();
    assert!(matches!(err, SlcspError::Io(_)));
}
