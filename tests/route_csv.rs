use approx::assert_relative_eq;
use indicatif::ProgressBar;
use muskingum_rs::config::{ColumnConfig, RunConfig};
use muskingum_rs::io::csv::{read_flow_table, write_flow_table};
use muskingum_rs::run::route_table;
use muskingum_rs::{ReachParams, route};

const GAGE_FLOW: &str = "\
timestamp,Flow (cfs)
2024-05-01 00:00:00,1
2024-05-01 00:15:00,2
2024-05-01 00:30:00,3
2024-05-01 00:45:00,5
";

const CONFIG: &str = r#"
[reach]
k = "1h"
x = 0.25
initial_outflow = 1.0

[columns]
index = "timestamp"
flows = ["Flow (cfs)"]
"#;

fn run_pipeline(csv: &str, config: &str) -> String {
    let settings = RunConfig::parse(config).unwrap().resolve().unwrap();
    let table = read_flow_table(csv.as_bytes(), &settings.columns).unwrap();
    let time_step = settings
        .time_step
        .unwrap_or_else(|| table.infer_time_step().unwrap());
    let reach = ReachParams::new(settings.k, settings.x, time_step);

    let routed = route_table(
        &table,
        &reach,
        settings.sub_reaches,
        settings.initial_outflow,
        &ProgressBar::hidden(),
    )
    .unwrap();

    let mut out = Vec::new();
    write_flow_table(&mut out, &routed).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn routes_gage_csv_with_inferred_time_step() {
    let output = run_pipeline(GAGE_FLOW, CONFIG);
    let routed = read_flow_table(output.as_bytes(), &ColumnConfig::new()).unwrap();

    assert_eq!(routed.index_name, "timestamp");
    assert_eq!(
        routed.index,
        vec![
            "2024-05-01 00:00:00",
            "2024-05-01 00:15:00",
            "2024-05-01 00:30:00",
            "2024-05-01 00:45:00",
        ]
    );

    let flows = &routed.column("Flow (cfs)").unwrap().values;
    let expected = [1.0, 6.0 / 7.0, 51.0 / 49.0, 451.0 / 343.0];
    assert_eq!(flows.len(), expected.len());
    for (o, e) in flows.iter().zip(expected) {
        assert_relative_eq!(*o, e, epsilon = 1e-12);
    }
}

#[test]
fn sub_reaches_from_config_match_library_call() {
    let config = format!("{CONFIG}\n").replace("x = 0.25", "x = 0.25\nsub_reaches = 12");
    let output = run_pipeline(GAGE_FLOW, &config);
    let routed = read_flow_table(output.as_bytes(), &ColumnConfig::new()).unwrap();

    let reach = ReachParams::new(
        chrono::TimeDelta::hours(1),
        0.25,
        chrono::TimeDelta::minutes(15),
    );
    let direct = route(&[1.0, 2.0, 3.0, 5.0], &reach, 12, Some(1.0)).unwrap();
    let flows = &routed.column("Flow (cfs)").unwrap().values;
    for (o, e) in flows.iter().zip(direct) {
        assert_relative_eq!(*o, e, epsilon = 1e-12);
    }
}

#[test]
fn irregular_index_cannot_infer_time_step() {
    let csv = "time,q\n2024-05-01 00:00,1\n2024-05-01 00:15,2\n2024-05-01 01:00,3\n";
    let table = read_flow_table(csv.as_bytes(), &ColumnConfig::new()).unwrap();
    assert!(table.infer_time_step().is_err());
}
