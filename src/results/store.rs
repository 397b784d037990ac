//! Append-only results table.
//!
//! One row per sample, in processing order. Every numeric column starts out
//! missing and is written independently; writing the same value twice leaves
//! the row unchanged. Values are rounded here and nowhere else.

use serde::Serialize;
use tracing::warn;

use crate::domain::{LinearRegion, MechanicalProperties, SampleResult, UnitSystem};

/// Numeric columns of the results table, in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    ElasticModulus,
    LinearLimit,
    Strength,
    Toughness,
    ElongationAtBreak,
    SlopeLimit,
    InterceptLimit,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::ElasticModulus,
        Column::LinearLimit,
        Column::Strength,
        Column::Toughness,
        Column::ElongationAtBreak,
        Column::SlopeLimit,
        Column::InterceptLimit,
    ];

    /// Column title with unit labels, e.g. `e_modulus [kPa]`.
    pub fn title(self, units: &UnitSystem) -> String {
        let strain = match units.strain.label() {
            "" => "-",
            label => label,
        };
        let stress = units.stress.as_str();
        match self {
            Column::ElasticModulus => format!("e_modulus [{stress}]"),
            Column::LinearLimit => format!("linear_limit [{strain}]"),
            Column::Strength => format!("strength [{stress}]"),
            Column::Toughness => format!("toughness [{stress}] (Pa = J/m^3)"),
            Column::ElongationAtBreak => format!("elongation_at_break [{strain}]"),
            Column::SlopeLimit => format!("slope_limit [{stress}/{strain}]"),
            Column::InterceptLimit => format!("intercept_limit [{stress}]"),
        }
    }

    /// Decimal places kept in the table (`None` = unrounded).
    pub fn decimals(self) -> Option<i32> {
        match self {
            Column::ElasticModulus => Some(3),
            Column::Strength | Column::Toughness | Column::ElongationAtBreak => Some(1),
            Column::LinearLimit | Column::SlopeLimit | Column::InterceptLimit => None,
        }
    }

    pub fn get(self, row: &SampleResult) -> Option<f64> {
        match self {
            Column::ElasticModulus => row.elastic_modulus,
            Column::LinearLimit => row.linear_limit,
            Column::Strength => row.strength,
            Column::Toughness => row.toughness,
            Column::ElongationAtBreak => row.elongation_at_break,
            Column::SlopeLimit => row.slope_at_limit,
            Column::InterceptLimit => row.intercept_at_limit,
        }
    }

    fn slot(self, row: &mut SampleResult) -> &mut Option<f64> {
        match self {
            Column::ElasticModulus => &mut row.elastic_modulus,
            Column::LinearLimit => &mut row.linear_limit,
            Column::Strength => &mut row.strength,
            Column::Toughness => &mut row.toughness,
            Column::ElongationAtBreak => &mut row.elongation_at_break,
            Column::SlopeLimit => &mut row.slope_at_limit,
            Column::InterceptLimit => &mut row.intercept_at_limit,
        }
    }
}

/// Handle to a row returned by [`ResultsStore::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(usize);

impl RowId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsStore {
    units: UnitSystem,
    rows: Vec<SampleResult>,
}

impl ResultsStore {
    pub fn new(units: UnitSystem) -> Self {
        Self {
            units,
            rows: Vec::new(),
        }
    }

    pub fn units(&self) -> &UnitSystem {
        &self.units
    }

    /// Append an all-missing row for `name`.
    pub fn append(&mut self, name: impl Into<String>) -> RowId {
        self.rows.push(SampleResult::missing(name));
        RowId(self.rows.len() - 1)
    }

    /// Write one column of one row. Non-finite values are stored as missing.
    pub fn set(&mut self, row: RowId, column: Column, value: f64) {
        let Some(result) = self.rows.get_mut(row.0) else {
            warn!(row = row.0, "ignoring write to unknown results row");
            return;
        };
        let stored = value
            .is_finite()
            .then(|| column.decimals().map_or(value, |d| round_to(value, d)));
        *column.slot(result) = stored;
    }

    /// Record the linear region columns.
    pub fn record_region(&mut self, row: RowId, region: &LinearRegion) {
        self.set(row, Column::ElasticModulus, region.elastic_modulus);
        self.set(row, Column::LinearLimit, region.linear_limit);
        self.set(row, Column::SlopeLimit, region.slope_at_limit);
        self.set(row, Column::InterceptLimit, region.intercept_at_limit);
    }

    /// Record the curve-wide property columns.
    pub fn record_properties(&mut self, row: RowId, properties: &MechanicalProperties) {
        self.set(row, Column::Strength, properties.strength);
        self.set(row, Column::Toughness, properties.toughness);
        self.set(row, Column::ElongationAtBreak, properties.elongation_at_break);
    }

    pub fn rows(&self) -> &[SampleResult] {
        &self.rows
    }

    pub fn row(&self, row: RowId) -> Option<&SampleResult> {
        self.rows.get(row.0)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `sample` followed by the unit-labelled numeric column titles.
    pub fn headers(&self) -> Vec<String> {
        std::iter::once("sample".to_string())
            .chain(Column::ALL.iter().map(|c| c.title(&self.units)))
            .collect()
    }

    /// Rows that have at least one numeric value.
    pub fn usable_rows(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| Column::ALL.iter().any(|c| c.get(r).is_some()))
            .count()
    }
}

/// Round half to even at `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ResultsStore {
        ResultsStore::new(UnitSystem::new("%", "kPa").unwrap())
    }

    #[test]
    fn headers_carry_unit_labels() {
        let headers = store().headers();
        assert_eq!(headers[0], "sample");
        assert_eq!(headers[1], "e_modulus [kPa]");
        assert_eq!(headers[2], "linear_limit [%]");
        assert_eq!(headers[4], "toughness [kPa] (Pa = J/m^3)");
        assert_eq!(headers[6], "slope_limit [kPa/%]");

        let dimensionless = ResultsStore::new(UnitSystem::new("", "MPa").unwrap());
        assert_eq!(dimensionless.headers()[2], "linear_limit [-]");
    }

    #[test]
    fn rows_start_missing_and_keep_append_order() {
        let mut s = store();
        let a = s.append("A");
        let b = s.append("B");
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(s.rows()[0], SampleResult::missing("A"));

        s.set(b, Column::Strength, 12.34);
        assert_eq!(s.rows()[1].strength, Some(12.3));
        assert_eq!(s.rows()[0].strength, None);
        assert_eq!(s.rows()[1].name, "B");
        assert_eq!(s.usable_rows(), 1);
    }

    #[test]
    fn writes_are_independent_and_idempotent() {
        let mut s = store();
        let row = s.append("A");
        let props = MechanicalProperties {
            strength: 5.04,
            toughness: 0.2,
            elongation_at_break: 1.0,
        };
        s.record_properties(row, &props);
        let once = s.clone();
        s.record_properties(row, &props);
        assert_eq!(s, once);

        let r = s.row(row).unwrap();
        assert_eq!(r.strength, Some(5.0));
        assert_eq!(r.toughness, Some(0.2));
        assert_eq!(r.elastic_modulus, None);
    }

    #[test]
    fn region_columns_are_rounded_only_where_configured() {
        let mut s = store();
        let row = s.append("A");
        let region = LinearRegion {
            k: 10,
            linear_limit: 4.123456,
            linear_limit_stress: 8.0,
            slope_at_limit: 2.0000123,
            intercept_at_limit: -0.0001,
            r_squared_at_limit: 0.999,
            elastic_modulus: 200.00123,
            trace: None,
        };
        s.record_region(row, &region);
        let r = s.row(row).unwrap();
        assert_eq!(r.elastic_modulus, Some(200.001));
        assert_eq!(r.linear_limit, Some(4.123456));
        assert_eq!(r.slope_at_limit, Some(2.0000123));
    }

    #[test]
    fn non_finite_values_are_missing() {
        let mut s = store();
        let row = s.append("A");
        s.set(row, Column::Toughness, f64::NAN);
        assert_eq!(s.row(row).unwrap().toughness, None);
    }

    #[test]
    fn rounding_is_half_to_even() {
        assert_eq!(round_to(0.25, 1), 0.2);
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(round_to(3.5, 0), 4.0);
    }
}
