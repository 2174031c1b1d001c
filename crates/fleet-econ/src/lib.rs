#![deny(warnings)]

//! Cost model: discounted cash flows for an incumbent vehicle and an
//! alternative powertrain.
//!
//! This module provides validated utilities for:
//! - Fuel cost per km across efficiency unit families
//! - Cumulative discounted cost of ownership, year by year
//! - Present-value cost breakdown by category
//! - Display scaling and chart payloads for both views
//!
//! Money stays in `Decimal` throughout; conversion to `f64` happens only when
//! a chart payload is built.

use fleet_core::{FuelType, Paired};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors produced by the cost model.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Discount rates are fractions in [0, 1].
    #[error("discount rate must be within [0, 1], got {0}")]
    InvalidRate(Decimal),
    /// Depreciation is a yearly percentage in [0, 100].
    #[error("depreciation rate must be within [0, 100] percent, got {0}")]
    InvalidDepreciation(Decimal),
    /// Insurance is a per-km rate in [0, 1].
    #[error("insurance rate must be within [0, 1] $/km, got {0}")]
    InvalidInsurance(Decimal),
    /// Prices, rates and subsidies must not be negative.
    #[error("negative monetary value for {0}")]
    NegativeMoney(&'static str),
    /// Ownership period must cover at least one year.
    #[error("vehicle lifetime must be at least one year")]
    ZeroLifetime,
    /// Input above the largest value the cost model accepts.
    #[error("{field} must be at most {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        max: Decimal,
        value: Decimal,
    },
    /// Arithmetic overflow or failed conversion to floating point.
    #[error("non-finite numeric conversion")]
    NonFinite,
}

/// Energy cost per km.
///
/// Battery-electric efficiency is already per km (kWh/km); every other
/// powertrain is quoted per 100 km.
///
/// Example:
/// let c = fuel_cost_per_km(FuelType::Diesel, Decimal::new(150, 2), Decimal::new(35, 0))?;
/// assert_eq!(c, Decimal::new(525, 3));
pub fn fuel_cost_per_km(
    fuel: FuelType,
    price: Decimal,
    efficiency: Decimal,
) -> Result<Decimal, EconError> {
    price
        .checked_mul(fuel.unit_family().per_km(efficiency))
        .ok_or(EconError::NonFinite)
}

/// Upper bounds enforced by [`CostInputs::validate`]. Within them every sum
/// and product in both cost views stays far below `Decimal::MAX`.
pub const MAX_VEHICLE_COUNT: u32 = 100_000;
pub const MAX_LIFETIME_YEARS: u32 = 100;
pub const MAX_OPERATING_DAYS: u32 = 366;
pub const MAX_DAILY_DISTANCE_KM: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);
/// Prices, subsidies and infrastructure totals, in dollars.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);
/// Maintenance and fuel cost, in $/km.
pub const MAX_COST_PER_KM: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

fn at_most(field: &'static str, value: Decimal, max: Decimal) -> Result<(), EconError> {
    if value > max {
        return Err(EconError::OutOfRange { field, max, value });
    }
    Ok(())
}

/// Present-value multiplier `1 / (1 + rate)^year`.
pub fn discount_factor(rate: Decimal, year: u32) -> Result<Decimal, EconError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(EconError::InvalidRate(rate));
    }
    let growth = (Decimal::ONE + rate)
        .checked_powu(u64::from(year))
        .ok_or(EconError::NonFinite)?;
    Ok(Decimal::ONE / growth)
}

/// Present value of one vehicle sold at the end of its lifetime.
///
/// Resale is `price * (1 - pct/100)^lifetime`, discounted back over the same
/// number of years.
pub fn resale_value_pv(
    price: Decimal,
    depreciation_pct: Decimal,
    lifetime_years: u32,
    rate: Decimal,
) -> Result<Decimal, EconError> {
    if depreciation_pct < Decimal::ZERO || depreciation_pct > Decimal::ONE_HUNDRED {
        return Err(EconError::InvalidDepreciation(depreciation_pct));
    }
    let retained = (Decimal::ONE - depreciation_pct / Decimal::ONE_HUNDRED)
        .checked_powu(u64::from(lifetime_years))
        .ok_or(EconError::NonFinite)?;
    Ok(price * retained * discount_factor(rate, lifetime_years)?)
}

/// Fully resolved inputs to both cost views.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostInputs {
    pub base_fuel: FuelType,
    pub alternative_fuel: FuelType,
    pub vehicle_count: u32,
    pub lifetime_years: u32,
    pub daily_distance_km: Decimal,
    pub operating_days: u32,
    /// Fraction, e.g. 0.03.
    pub discount_rate: Decimal,
    /// Percent, e.g. 13.
    pub provincial_tax_pct: Decimal,
    pub purchase_price: Paired<Decimal>,
    /// $/km
    pub maintenance_per_km: Paired<Decimal>,
    /// $/km
    pub fuel_per_km: Paired<Decimal>,
    /// $/km, `None` when insurance is not modelled.
    pub insurance_per_km: Option<Paired<Decimal>>,
    /// Yearly percent, `None` when resale is not modelled.
    pub depreciation_pct: Option<Paired<Decimal>>,
    /// Subsidy per alternative vehicle.
    pub vehicle_subsidy: Decimal,
    pub infrastructure_cost: Decimal,
    pub infrastructure_subsidy: Decimal,
}

impl CostInputs {
    pub fn validate(&self) -> Result<(), EconError> {
        if self.lifetime_years == 0 {
            return Err(EconError::ZeroLifetime);
        }
        if self.discount_rate < Decimal::ZERO || self.discount_rate > Decimal::ONE {
            return Err(EconError::InvalidRate(self.discount_rate));
        }
        let money = [
            ("daily distance", self.daily_distance_km),
            ("provincial tax", self.provincial_tax_pct),
            ("base purchase price", self.purchase_price.base),
            ("alternative purchase price", self.purchase_price.alternative),
            ("base maintenance", self.maintenance_per_km.base),
            ("alternative maintenance", self.maintenance_per_km.alternative),
            ("base fuel cost", self.fuel_per_km.base),
            ("alternative fuel cost", self.fuel_per_km.alternative),
            ("vehicle subsidy", self.vehicle_subsidy),
            ("infrastructure cost", self.infrastructure_cost),
            ("infrastructure subsidy", self.infrastructure_subsidy),
        ];
        for (name, value) in money {
            if value < Decimal::ZERO {
                return Err(EconError::NegativeMoney(name));
            }
        }
        let counts = [
            ("vehicle count", self.vehicle_count, MAX_VEHICLE_COUNT),
            ("lifetime", self.lifetime_years, MAX_LIFETIME_YEARS),
            ("operating days", self.operating_days, MAX_OPERATING_DAYS),
        ];
        for (name, value, max) in counts {
            at_most(name, Decimal::from(value), Decimal::from(max))?;
        }
        at_most("daily distance", self.daily_distance_km, MAX_DAILY_DISTANCE_KM)?;
        at_most("provincial tax", self.provincial_tax_pct, Decimal::ONE_HUNDRED)?;
        let amounts = [
            ("base purchase price", self.purchase_price.base),
            ("alternative purchase price", self.purchase_price.alternative),
            ("vehicle subsidy", self.vehicle_subsidy),
            ("infrastructure cost", self.infrastructure_cost),
            ("infrastructure subsidy", self.infrastructure_subsidy),
        ];
        for (name, value) in amounts {
            at_most(name, value, MAX_AMOUNT)?;
        }
        let per_km = [
            ("base maintenance", self.maintenance_per_km.base),
            ("alternative maintenance", self.maintenance_per_km.alternative),
            ("base fuel cost", self.fuel_per_km.base),
            ("alternative fuel cost", self.fuel_per_km.alternative),
        ];
        for (name, value) in per_km {
            at_most(name, value, MAX_COST_PER_KM)?;
        }
        if let Some(ins) = self.insurance_per_km {
            for rate in [ins.base, ins.alternative] {
                if rate < Decimal::ZERO || rate > Decimal::ONE {
                    return Err(EconError::InvalidInsurance(rate));
                }
            }
        }
        if let Some(dep) = self.depreciation_pct {
            for pct in [dep.base, dep.alternative] {
                if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
                    return Err(EconError::InvalidDepreciation(pct));
                }
            }
        }
        Ok(())
    }

    /// True when a subsidised alternative series is reported.
    pub fn has_subsidies(&self) -> bool {
        self.vehicle_subsidy > Decimal::ZERO || self.infrastructure_subsidy > Decimal::ZERO
    }

    fn tax_multiplier(&self) -> Decimal {
        Decimal::ONE + self.provincial_tax_pct / Decimal::ONE_HUNDRED
    }

    fn fleet_km_per_year(&self) -> Decimal {
        self.daily_distance_km
            * Decimal::from(self.operating_days)
            * Decimal::from(self.vehicle_count)
    }

    fn insurance(&self) -> Paired<Decimal> {
        self.insurance_per_km.unwrap_or_default()
    }

    fn operating_rate(&self) -> Paired<Decimal> {
        let ins = self.insurance();
        Paired::new(
            self.maintenance_per_km.base + self.fuel_per_km.base + ins.base,
            self.maintenance_per_km.alternative + self.fuel_per_km.alternative + ins.alternative,
        )
    }

    /// Discounted resale of the whole fleet, when both depreciation rates are
    /// given and nonzero.
    fn fleet_resale_pv(&self) -> Result<Option<Paired<Decimal>>, EconError> {
        let Some(dep) = self.depreciation_pct else {
            return Ok(None);
        };
        if dep.base.is_zero() || dep.alternative.is_zero() {
            return Ok(None);
        }
        let n = Decimal::from(self.vehicle_count);
        let base = resale_value_pv(
            self.purchase_price.base,
            dep.base,
            self.lifetime_years,
            self.discount_rate,
        )?;
        let alternative = resale_value_pv(
            self.purchase_price.alternative,
            dep.alternative,
            self.lifetime_years,
            self.discount_rate,
        )?;
        Ok(Some(Paired::new(base * n, alternative * n)))
    }
}

/// Cumulative discounted cost at the end of one year.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CumulativeCostRow {
    pub year: u32,
    pub base: Decimal,
    pub alternative: Decimal,
    pub alternative_with_subsidies: Option<Decimal>,
}

/// Year-indexed cumulative discounted cost of ownership.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CumulativeCost {
    pub base_fuel: FuelType,
    pub alternative_fuel: FuelType,
    pub rows: Vec<CumulativeCostRow>,
}

impl CumulativeCost {
    pub fn has_subsidies(&self) -> bool {
        self.rows
            .first()
            .map(|r| r.alternative_with_subsidies.is_some())
            .unwrap_or(false)
    }

    pub fn max_alternative(&self) -> Decimal {
        self.rows
            .iter()
            .map(|r| r.alternative)
            .max()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Running sum of discounted costs from year 0 to the end of the lifetime.
///
/// Year 0 holds taxed capital (vehicles, plus infrastructure for the
/// alternative). Each later year adds that year's discounted operating cost
/// to the previous total. Discounted resale, if any, is taken off the final
/// year only.
pub fn discounted_tco(inputs: &CostInputs) -> Result<CumulativeCost, EconError> {
    inputs.validate()?;
    let tax = inputs.tax_multiplier();
    let n = Decimal::from(inputs.vehicle_count);
    let rate = inputs.discount_rate;

    let df0 = discount_factor(rate, 0)?;
    let alt_capital = inputs.purchase_price.alternative * n + inputs.infrastructure_cost;
    let mut base = inputs.purchase_price.base * n * tax * df0;
    let mut alternative = alt_capital * df0 * tax;
    let mut subsidised = inputs.has_subsidies().then(|| {
        (alt_capital - inputs.vehicle_subsidy * n - inputs.infrastructure_subsidy) * df0 * tax
    });

    let mut rows = Vec::with_capacity(inputs.lifetime_years as usize + 1);
    rows.push(CumulativeCostRow {
        year: 0,
        base,
        alternative,
        alternative_with_subsidies: subsidised,
    });

    let per_km = inputs.operating_rate();
    let fleet_km = inputs.fleet_km_per_year();
    for year in 1..=inputs.lifetime_years {
        let df = discount_factor(rate, year)?;
        let op_alt = per_km.alternative * fleet_km * df;
        base += per_km.base * fleet_km * df;
        alternative += op_alt;
        if let Some(s) = subsidised.as_mut() {
            *s += op_alt;
        }
        rows.push(CumulativeCostRow {
            year,
            base,
            alternative,
            alternative_with_subsidies: subsidised,
        });
    }

    if let Some(resale) = inputs.fleet_resale_pv()? {
        if let Some(last) = rows.last_mut() {
            last.base -= resale.base;
            last.alternative -= resale.alternative;
            if let Some(s) = last.alternative_with_subsidies.as_mut() {
                *s -= resale.alternative;
            }
        }
    }

    debug!(
        years = inputs.lifetime_years,
        subsidies = inputs.has_subsidies(),
        "cumulative cost computed"
    );
    Ok(CumulativeCost {
        base_fuel: inputs.base_fuel,
        alternative_fuel: inputs.alternative_fuel,
        rows,
    })
}

/// Category of a present-value cost bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostCategory {
    Vehicle,
    Infrastructure,
    Maintenance,
    Fuel,
    Insurance,
}

impl CostCategory {
    /// Display name; infrastructure is named after the alternative powertrain.
    pub fn label(self, alternative: FuelType) -> &'static str {
        match self {
            CostCategory::Vehicle => "Vehicle",
            CostCategory::Infrastructure => alternative.infrastructure_label(),
            CostCategory::Maintenance => "Maintenance",
            CostCategory::Fuel => "Fuel",
            CostCategory::Insurance => "Insurance",
        }
    }
}

/// Present-value cost of one technology, split by category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TechnologyCost {
    pub name: String,
    pub vehicle: Decimal,
    pub infrastructure: Option<Decimal>,
    pub maintenance: Decimal,
    pub fuel: Decimal,
    pub insurance: Option<Decimal>,
}

impl TechnologyCost {
    /// Buckets in display order: Vehicle, [Infrastructure], Maintenance,
    /// Fuel, [Insurance].
    pub fn buckets(&self) -> Vec<(CostCategory, Decimal)> {
        let mut out = vec![(CostCategory::Vehicle, self.vehicle)];
        if let Some(infra) = self.infrastructure {
            out.push((CostCategory::Infrastructure, infra));
        }
        out.push((CostCategory::Maintenance, self.maintenance));
        out.push((CostCategory::Fuel, self.fuel));
        if let Some(ins) = self.insurance {
            out.push((CostCategory::Insurance, ins));
        }
        out
    }

    pub fn total(&self) -> Decimal {
        self.buckets().into_iter().map(|(_, v)| v).sum()
    }
}

/// Present-value breakdown for the incumbent, the alternative and, when
/// subsidies apply, the subsidised alternative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StackedCost {
    pub alternative_fuel: FuelType,
    pub categories: Vec<CostCategory>,
    pub technologies: Vec<TechnologyCost>,
}

impl StackedCost {
    pub fn category_labels(&self) -> Vec<&'static str> {
        self.categories
            .iter()
            .map(|c| c.label(self.alternative_fuel))
            .collect()
    }

    pub fn max_vehicle(&self) -> Decimal {
        self.technologies
            .iter()
            .map(|t| t.vehicle)
            .max()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Lifetime present-value totals per technology and category.
pub fn stacked_breakdown(inputs: &CostInputs) -> Result<StackedCost, EconError> {
    inputs.validate()?;
    let tax = inputs.tax_multiplier();
    let n = Decimal::from(inputs.vehicle_count);
    let fleet_km = inputs.fleet_km_per_year();
    let insurance = inputs.insurance();
    let with_infra = inputs.infrastructure_cost > Decimal::ZERO;
    let with_insurance = !insurance.base.is_zero() || !insurance.alternative.is_zero();

    let mut maintenance = Paired::<Decimal>::default();
    let mut fuel = Paired::<Decimal>::default();
    let mut ins = Paired::<Decimal>::default();
    for year in 1..=inputs.lifetime_years {
        let df = discount_factor(inputs.discount_rate, year)?;
        let km = fleet_km * df;
        maintenance.base += inputs.maintenance_per_km.base * km;
        maintenance.alternative += inputs.maintenance_per_km.alternative * km;
        fuel.base += inputs.fuel_per_km.base * km;
        fuel.alternative += inputs.fuel_per_km.alternative * km;
        ins.base += insurance.base * km;
        ins.alternative += insurance.alternative * km;
    }

    let resale = inputs.fleet_resale_pv()?.unwrap_or_default();
    let optional = |present: bool, value: Decimal| present.then_some(value);

    let alt_name = inputs.alternative_fuel.name();
    let mut technologies = vec![
        TechnologyCost {
            name: inputs.base_fuel.name().to_string(),
            vehicle: inputs.purchase_price.base * n * tax - resale.base,
            infrastructure: optional(with_infra, Decimal::ZERO),
            maintenance: maintenance.base,
            fuel: fuel.base,
            insurance: optional(with_insurance, ins.base),
        },
        TechnologyCost {
            name: alt_name.to_string(),
            vehicle: inputs.purchase_price.alternative * n * tax - resale.alternative,
            infrastructure: optional(with_infra, inputs.infrastructure_cost * tax),
            maintenance: maintenance.alternative,
            fuel: fuel.alternative,
            insurance: optional(with_insurance, ins.alternative),
        },
    ];
    if inputs.has_subsidies() {
        technologies.push(TechnologyCost {
            name: format!("{alt_name} (with subsidies)"),
            vehicle: (inputs.purchase_price.alternative * n - inputs.vehicle_subsidy * n) * tax
                - resale.alternative,
            infrastructure: optional(
                with_infra,
                (inputs.infrastructure_cost - inputs.infrastructure_subsidy) * tax,
            ),
            maintenance: maintenance.alternative,
            fuel: fuel.alternative,
            insurance: optional(with_insurance, ins.alternative),
        });
    }

    let mut categories = vec![CostCategory::Vehicle];
    if with_infra {
        categories.push(CostCategory::Infrastructure);
    }
    categories.extend([CostCategory::Maintenance, CostCategory::Fuel]);
    if with_insurance {
        categories.push(CostCategory::Insurance);
    }

    Ok(StackedCost {
        alternative_fuel: inputs.alternative_fuel,
        categories,
        technologies,
    })
}

/// Units used when presenting money on a chart axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayScale {
    Thousands,
    Millions,
}

impl DisplayScale {
    /// Thousands below one million, millions otherwise.
    pub fn for_max(max: Decimal) -> Self {
        if max < Decimal::from(1_000_000u32) {
            DisplayScale::Thousands
        } else {
            DisplayScale::Millions
        }
    }

    pub fn divisor(self) -> Decimal {
        match self {
            DisplayScale::Thousands => Decimal::ONE_THOUSAND,
            DisplayScale::Millions => Decimal::from(1_000_000u32),
        }
    }

    pub fn cumulative_axis_label(self) -> &'static str {
        match self {
            DisplayScale::Thousands => "Cumulative Cost of Ownership (Thousands $)",
            DisplayScale::Millions => "Cumulative Cost of Ownership (Millions $)",
        }
    }

    pub fn total_axis_label(self) -> &'static str {
        match self {
            DisplayScale::Thousands => "Total Cost of Ownership (Thousands $)",
            DisplayScale::Millions => "Total Cost of Ownership (Millions $)",
        }
    }

    /// Scaled value rounded to cents of the display unit.
    pub fn apply(self, value: Decimal) -> Result<f64, EconError> {
        (value / self.divisor())
            .round_dp(2)
            .to_f64()
            .ok_or(EconError::NonFinite)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStyle {
    Solid,
    Dashed,
}

/// One line on the cumulative cost chart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub color: String,
    pub style: LineStyle,
    pub years: Vec<u32>,
    pub values: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CumulativeCostChart {
    pub x_axis_label: String,
    pub y_axis_label: String,
    pub legend_title: String,
    pub scale: DisplayScale,
    pub series: Vec<LineSeries>,
}

const BASE_COLOR: &str = "red";
const ALTERNATIVE_COLOR: &str = "#1B5E20";
const BAR_COLORS: [&str; 5] = ["#215E21", "#507250", "#7E9E7E", "#AFCFAF", "#D3E6D3"];

/// Line chart payload, scaled by the largest alternative value.
pub fn cumulative_chart(cost: &CumulativeCost) -> Result<CumulativeCostChart, EconError> {
    let scale = DisplayScale::for_max(cost.max_alternative());
    let years: Vec<u32> = cost.rows.iter().map(|r| r.year).collect();

    let alt_name = cost.alternative_fuel.name();
    let mut series = vec![
        LineSeries {
            name: cost.base_fuel.name().to_string(),
            color: BASE_COLOR.to_string(),
            style: LineStyle::Solid,
            years: years.clone(),
            values: scaled_column(&cost.rows, scale, |r| Some(r.base))?,
        },
        LineSeries {
            name: alt_name.to_string(),
            color: ALTERNATIVE_COLOR.to_string(),
            style: LineStyle::Solid,
            years: years.clone(),
            values: scaled_column(&cost.rows, scale, |r| Some(r.alternative))?,
        },
    ];
    if cost.has_subsidies() {
        series.push(LineSeries {
            name: format!("{alt_name} with subsidies"),
            color: ALTERNATIVE_COLOR.to_string(),
            style: LineStyle::Dashed,
            years,
            values: scaled_column(&cost.rows, scale, |r| r.alternative_with_subsidies)?,
        });
    }

    Ok(CumulativeCostChart {
        x_axis_label: "Years".to_string(),
        y_axis_label: scale.cumulative_axis_label().to_string(),
        legend_title: "Technology".to_string(),
        scale,
        series,
    })
}

fn scaled_column<F>(
    rows: &[CumulativeCostRow],
    scale: DisplayScale,
    pick: F,
) -> Result<Vec<f64>, EconError>
where
    F: Fn(&CumulativeCostRow) -> Option<Decimal>,
{
    rows.iter()
        .filter_map(pick)
        .map(|v| scale.apply(v))
        .collect()
}

/// One stacked segment series: a category's value for every technology.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub category: String,
    pub color: String,
    pub values: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StackedCostChart {
    pub y_axis_label: String,
    pub legend_title: String,
    pub scale: DisplayScale,
    pub technologies: Vec<String>,
    pub series: Vec<BarSeries>,
}

/// Stacked bar payload, scaled by the largest vehicle bucket.
pub fn stacked_chart(stacked: &StackedCost) -> Result<StackedCostChart, EconError> {
    let scale = DisplayScale::for_max(stacked.max_vehicle());
    let technologies = stacked.technologies.iter().map(|t| t.name.clone()).collect();
    let mut series = Vec::with_capacity(stacked.categories.len());
    for (i, category) in stacked.categories.iter().enumerate() {
        let values = stacked
            .technologies
            .iter()
            .map(|t| {
                let amount = t
                    .buckets()
                    .into_iter()
                    .find(|(c, _)| c == category)
                    .map(|(_, v)| v)
                    .unwrap_or(Decimal::ZERO);
                scale.apply(amount)
            })
            .collect::<Result<Vec<f64>, EconError>>()?;
        series.push(BarSeries {
            category: category.label(stacked.alternative_fuel).to_string(),
            color: BAR_COLORS[i % BAR_COLORS.len()].to_string(),
            values,
        });
    }
    Ok(StackedCostChart {
        y_axis_label: scale.total_axis_label().to_string(),
        legend_title: "Category".to_string(),
        scale,
        technologies,
        series,
    })
}
