use quantity_report_core::{
    Computation, ExecutorKind, InMemoryStore, Key, Label, Library, Operation, Quantity, ReportError, Reporter,
    ReporterConfig, Value,
};
use std::sync::Arc;

const STORE: &str = r#"{"parameters": {
    "demand": {"dims": ["region", "year"], "rows": [
        {"region": "north", "year": 2020, "value": 10.0},
        {"region": "north", "year": 2030, "value": 12.0},
        {"region": "south", "year": 2020, "value": 5.0},
        {"region": "south", "year": 2030, "value": 8.0}
    ]},
    "capacity": {"dims": ["region"], "rows": [
        {"region": "north", "value": 30.0},
        {"region": "south", "value": 20.0}
    ]}
}}"#;

const SHARES: &str = r#"{"dims": ["region", "fuel"], "rows": [
    {"region": "north", "fuel": "gas", "value": 0.4},
    {"region": "north", "fuel": "wind", "value": 0.6},
    {"region": "south", "fuel": "gas", "value": 0.9},
    {"region": "south", "fuel": "wind", "value": 0.1}
]}"#;

fn key(s: &str) -> Key {
    Key::parse(s).unwrap()
}

fn quantity(value: &Value) -> &Quantity {
    value.as_quantity().expect("quantity")
}

fn build(executor: ExecutorKind, dir: &tempfile::TempDir) -> Reporter {
    let store_path = dir.path().join("scenario.json");
    std::fs::write(&store_path, STORE).unwrap();
    let config_path = dir.path().join("config.json");
    std::fs::write(&config_path, format!(r#"{{"executor": "{}"}}"#, match executor {
        ExecutorKind::Sequential => "sequential",
        ExecutorKind::Parallel => "parallel",
    }))
    .unwrap();

    let store = InMemoryStore::from_path(&store_path).unwrap();
    let config = ReporterConfig::from_path(&config_path).unwrap();
    Reporter::from_scenario_with(Arc::new(store), Library::standard(), config).unwrap()
}

#[test]
fn scenario_aggregates_and_file_disaggregation() {
    for executor in [ExecutorKind::Sequential, ExecutorKind::Parallel] {
        let dir = tempfile::tempdir().unwrap();
        let mut rep = build(executor, &dir);

        assert_eq!(rep.full_key("demand"), Some(&key("demand:region-year")));
        assert_eq!(quantity(&rep.get("capacity").unwrap()).total(), 50.0);

        let shares_path = dir.path().join("shares.json");
        std::fs::write(&shares_path, SHARES).unwrap();
        let shares = rep.add_file(&shares_path).unwrap();

        let by_fuel = rep
            .disaggregate("demand:region-year", "fuel", None, vec![Computation::alias(shares)])
            .unwrap();
        rep.add_aggregates(&by_fuel).unwrap();

        let values = rep
            .get_many([
                Label::from(by_fuel.clone()),
                Label::from(key("demand:fuel")),
                Label::from(key("demand:region-year")),
            ])
            .unwrap();

        assert_eq!(quantity(&values[0]).get(&["south", "2030", "gas"]), Some(8.0 * 0.9));
        let fuel = quantity(&values[1]);
        assert!((fuel.get(&["wind"]).unwrap() - (22.0 * 0.6 + 13.0 * 0.1)).abs() < 1e-9);
        assert!((fuel.total() - quantity(&values[2]).total()).abs() < 1e-9);
    }
}

#[test]
fn ratio_of_two_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let mut rep = build(ExecutorKind::Sequential, &dir);

    let ratio = Operation::new("ratio", |args| {
        let num = args[0].as_quantity().ok_or_else(|| ReportError::computation("ratio", "numerator"))?;
        let den = args[1].as_quantity().ok_or_else(|| ReportError::computation("ratio", "denominator"))?;
        let mut out = Quantity::new(num.dims().iter().cloned())?;
        for (coords, value) in num.iter() {
            let refs: Vec<&str> = coords.iter().map(String::as_str).collect();
            let d = den
                .get(&refs)
                .ok_or_else(|| ReportError::computation("ratio", format!("no denominator for {:?}", coords)))?;
            out.insert(coords.to_vec(), value / d)?;
        }
        Ok(Value::from(out))
    });

    rep.add(
        "utilisation:region",
        Computation::apply(ratio, vec![Computation::alias(key("demand:region")), Computation::alias(key("capacity:region"))]),
        true,
    )
    .unwrap();

    let util = rep.get("utilisation:region").unwrap();
    assert!((quantity(&util).get(&["north"]).unwrap() - 22.0 / 30.0).abs() < 1e-12);

    // Unknown labels fail without disturbing the registry.
    let before = rep.keys().count();
    assert!(matches!(rep.get("missing"), Err(ReportError::UnresolvedLabel(_))));
    assert_eq!(rep.keys().count(), before);
    assert!(rep.validate().is_ok());
}
