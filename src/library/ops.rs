//! Implementations behind the standard catalogue.

use super::quantity::Quantity;
use crate::compute::ledger::Value;
use crate::error::{ReportError, Result};
use crate::scenario::ScenarioStore;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

fn arg<'v>(op: &str, args: &'v [Value], i: usize) -> Result<&'v Value> {
    args.get(i)
        .ok_or_else(|| ReportError::computation(op, format!("expected at least {} arguments, got {}", i + 1, args.len())))
}

fn quantity_arg<'v>(op: &str, args: &'v [Value], i: usize) -> Result<&'v Arc<Quantity>> {
    let value = arg(op, args, i)?;
    value
        .as_quantity()
        .ok_or_else(|| ReportError::computation(op, format!("argument {} must be a quantity, got {}", i, value.kind())))
}

fn text_arg<'v>(op: &str, args: &'v [Value], i: usize) -> Result<&'v str> {
    let value = arg(op, args, i)?;
    value
        .as_text()
        .ok_or_else(|| ReportError::computation(op, format!("argument {} must be text, got {}", i, value.kind())))
}

/// `(quantity, dim)` -> quantity summed over `dim`. `dim` may also be a list
/// of dimension names, summed over in turn.
pub fn aggregate(args: &[Value]) -> Result<Value> {
    let op = "aggregate";
    let quantity = quantity_arg(op, args, 0)?;
    let mut out = match arg(op, args, 1)? {
        Value::List(dims) => {
            let mut current = Quantity::clone(quantity);
            for (i, dim) in dims.iter().enumerate() {
                let dim = dim
                    .as_text()
                    .ok_or_else(|| ReportError::computation(op, format!("dimension {} is not text", i)))?;
                current = current.sum_over(dim)?;
            }
            current
        }
        _ => quantity.sum_over(text_arg(op, args, 1)?)?,
    };
    if out.dims().is_empty() && out.is_empty() {
        out = Quantity::scalar(0.0);
    }
    Ok(Value::from(out))
}

/// `(quantity, shares)` -> quantity with the extra dimension of `shares`.
pub fn disaggregate_shares(args: &[Value]) -> Result<Value> {
    let op = "disaggregate_shares";
    let quantity = quantity_arg(op, args, 0)?;
    let shares = quantity_arg(op, args, 1)?;
    Ok(Value::from(quantity.disaggregate_shares(shares)?))
}

/// `(path)` -> quantity read from a JSON table file.
pub fn load_file(args: &[Value]) -> Result<Value> {
    let path = Path::new(text_arg("load_file", args, 0)?);
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => {}
        other => {
            return Err(ReportError::computation(
                "load_file",
                format!("unsupported file type {:?} for '{}'", other, path.display()),
            ))
        }
    }

    debug!(path = %path.display(), "loading file");
    let text = std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
    let quantity: Quantity = serde_json::from_str(&text)?;
    Ok(Value::from(quantity))
}

/// `(name, store)` -> the raw parameter `name` from the bound store.
pub fn load_parameter(args: &[Value]) -> Result<Value> {
    let op = "load_parameter";
    let name = text_arg(op, args, 0)?;
    let value = arg(op, args, 1)?;
    let store: &Arc<dyn ScenarioStore> = value
        .as_store()
        .ok_or_else(|| ReportError::computation(op, format!("argument 1 must be a store, got {}", value.kind())))?;
    debug!(parameter = name, "loading parameter");
    Ok(Value::from(store.parameter_data(name)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> Value {
        Value::from(
            Quantity::from_rows(["region", "year"], [(["north", "2020"], 1.0), (["south", "2020"], 2.0)]).unwrap(),
        )
    }

    #[test]
    fn test_aggregate_single_and_list() {
        let by_year = aggregate(&[sample(), Value::text("region")]).unwrap();
        assert_eq!(by_year.as_quantity().unwrap().get(&["2020"]), Some(3.0));

        let total = aggregate(&[sample(), Value::List(vec![Value::text("region"), Value::text("year")])]).unwrap();
        assert_eq!(total.as_quantity().unwrap().total(), 3.0);
    }

    #[test]
    fn test_argument_errors() {
        let err = aggregate(&[sample()]).unwrap_err();
        assert!(matches!(err, ReportError::Computation { ref op, .. } if op == "aggregate"));
        assert!(aggregate(&[Value::Scalar(1.0), Value::text("region")]).is_err());
        assert!(load_parameter(&[Value::text("demand"), Value::Scalar(0.0)]).is_err());
    }

    #[test]
    fn test_load_file_reads_json_table() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"dims": ["year"], "rows": [{{"year": "2020", "value": 5.0}}]}}"#).unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let loaded = load_file(&[Value::text(path)]).unwrap();
        assert_eq!(loaded.as_quantity().unwrap().get(&["2020"]), Some(5.0));
    }

    #[test]
    fn test_load_file_errors() {
        let missing = load_file(&[Value::text("/definitely/not/here.json")]).unwrap_err();
        assert!(matches!(missing, ReportError::Io { .. }));

        let csv = load_file(&[Value::text("data.csv")]).unwrap_err();
        assert!(matches!(csv, ReportError::Computation { .. }));
    }
}
