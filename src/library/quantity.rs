//! quantity.rs
//! Sparse labelled tables: one coordinate per dimension, one `f64` per row.

use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const VALUE_FIELD: &str = "value";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Table", into = "Table")]
pub struct Quantity {
    dims: Vec<String>,
    data: BTreeMap<Vec<String>, f64>,
}

impl Quantity {
    /// `value` is reserved: it names the number column of the JSON form.
    pub fn new<I, S>(dims: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Self::default();
        for dim in dims {
            let dim = dim.into();
            if dim.is_empty() || dim == VALUE_FIELD || out.dims.contains(&dim) {
                return Err(ReportError::computation("quantity", format!("invalid dimension '{}'", dim)));
            }
            out.dims.push(dim);
        }
        Ok(out)
    }

    /// A dimensionless quantity holding one value.
    pub fn scalar(value: f64) -> Self {
        let mut data = BTreeMap::new();
        data.insert(Vec::new(), value);
        Self { dims: Vec::new(), data }
    }

    pub fn from_rows<D, DS, R, C, CS>(dims: D, rows: R) -> Result<Self>
    where
        D: IntoIterator<Item = DS>,
        DS: Into<String>,
        R: IntoIterator<Item = (C, f64)>,
        C: IntoIterator<Item = CS>,
        CS: Into<String>,
    {
        let mut out = Self::new(dims)?;
        for (coords, value) in rows {
            out.insert(coords.into_iter().map(Into::into).collect(), value)?;
        }
        Ok(out)
    }

    /// Sets the value at `coords`, replacing any previous value.
    pub fn insert(&mut self, coords: Vec<String>, value: f64) -> Result<()> {
        if coords.len() != self.dims.len() {
            return Err(ReportError::computation(
                "quantity",
                format!("expected {} coordinates for {:?}, got {:?}", self.dims.len(), self.dims, coords),
            ));
        }
        self.data.insert(coords, value);
        Ok(())
    }

    pub fn dims(&self) -> &[String] { &self.dims }
    pub fn len(&self) -> usize { self.data.len() }
    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    pub fn get(&self, coords: &[&str]) -> Option<f64> {
        let key: Vec<String> = coords.iter().map(|c| c.to_string()).collect();
        self.data.get(&key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[String], f64)> {
        self.data.iter().map(|(k, v)| (k.as_slice(), *v))
    }

    pub fn total(&self) -> f64 { self.data.values().sum() }

    fn position(&self, dim: &str) -> Option<usize> { self.dims.iter().position(|d| d == dim) }

    /// Sums over `dim`, grouping by the remaining dimensions.
    pub fn sum_over(&self, dim: &str) -> Result<Quantity> {
        let idx = self.position(dim).ok_or_else(|| {
            ReportError::computation("aggregate", format!("dimension '{}' not in {:?}", dim, self.dims))
        })?;

        let mut dims = self.dims.clone();
        dims.remove(idx);
        let mut data = BTreeMap::new();
        for (coords, value) in &self.data {
            let mut reduced = coords.clone();
            reduced.remove(idx);
            *data.entry(reduced).or_insert(0.0) += value;
        }
        Ok(Quantity { dims, data })
    }

    /// Splits every row along the one dimension of `shares` that this
    /// quantity lacks. The remaining dimensions of `shares` must all exist
    /// here; they select which shares apply to which row. Rows with no
    /// matching shares are dropped.
    pub fn disaggregate_shares(&self, shares: &Quantity) -> Result<Quantity> {
        let new_dims: Vec<&String> = shares.dims.iter().filter(|d| self.position(d).is_none()).collect();
        let new_dim = match new_dims.as_slice() {
            [one] => (*one).clone(),
            _ => {
                return Err(ReportError::computation(
                    "disaggregate_shares",
                    format!("shares {:?} must add exactly one dimension to {:?}", shares.dims, self.dims),
                ))
            }
        };

        // Positions of the shared dimensions, in the order they appear in `shares`.
        let mut here = Vec::new();
        let mut there = Vec::new();
        let mut new_pos = 0;
        for (j, dim) in shares.dims.iter().enumerate() {
            match self.position(dim) {
                Some(i) => {
                    here.push(i);
                    there.push(j);
                }
                None => new_pos = j,
            }
        }

        let mut by_group: HashMap<Vec<&str>, Vec<(&str, f64)>> = HashMap::new();
        for (coords, share) in &shares.data {
            let group = there.iter().map(|&j| coords[j].as_str()).collect();
            by_group.entry(group).or_default().push((coords[new_pos].as_str(), *share));
        }

        let mut dims = self.dims.clone();
        dims.push(new_dim);
        let mut data = BTreeMap::new();
        for (coords, value) in &self.data {
            let group: Vec<&str> = here.iter().map(|&i| coords[i].as_str()).collect();
            for (label, share) in by_group.get(&group).into_iter().flatten() {
                let mut split = coords.clone();
                split.push(label.to_string());
                data.insert(split, value * share);
            }
        }
        Ok(Quantity { dims, data })
    }

    /// Same dimensions in the same order, same rows, values within `tol`.
    pub fn approx_eq(&self, other: &Quantity, tol: f64) -> bool {
        self.dims == other.dims
            && self.data.len() == other.data.len()
            && self
                .data
                .iter()
                .all(|(k, v)| other.data.get(k).is_some_and(|o| (v - o).abs() <= tol))
    }
}

/// Row-oriented serde form: `{"dims": [...], "rows": [{"<dim>": "<coord>", "value": 1.0}]}`.
#[derive(Serialize, Deserialize)]
struct Table {
    dims: Vec<String>,
    rows: Vec<Record>,
}

#[derive(Serialize, Deserialize)]
struct Record {
    #[serde(flatten)]
    coords: BTreeMap<String, serde_json::Value>,
    value: f64,
}

impl TryFrom<Table> for Quantity {
    type Error = ReportError;

    fn try_from(table: Table) -> Result<Self> {
        let mut out = Quantity::new(table.dims)?;
        for record in table.rows {
            if record.coords.len() != out.dims.len() {
                return Err(ReportError::computation(
                    "quantity",
                    format!("row {:?} does not match dimensions {:?}", record.coords, out.dims),
                ));
            }
            let mut coords = Vec::with_capacity(out.dims.len());
            for dim in &out.dims {
                let coord = match record.coords.get(dim) {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(serde_json::Value::Number(n)) => n.to_string(),
                    other => {
                        return Err(ReportError::computation(
                            "quantity",
                            format!("bad coordinate for '{}': {:?}", dim, other),
                        ))
                    }
                };
                coords.push(coord);
            }
            out.insert(coords, record.value)?;
        }
        Ok(out)
    }
}

impl From<Quantity> for Table {
    fn from(q: Quantity) -> Self {
        let rows = q
            .data
            .into_iter()
            .map(|(coords, value)| Record {
                coords: q
                    .dims
                    .iter()
                    .cloned()
                    .zip(coords.into_iter().map(serde_json::Value::String))
                    .collect(),
                value,
            })
            .collect();
        Table { dims: q.dims, rows }
    }
}
