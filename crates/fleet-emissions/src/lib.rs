#![deny(warnings)]

//! Operational emissions of the incumbent and alternative fleets.
//!
//! GHG totals are reported in tonnes of CO2-equivalent, NOx and PM2.5 in
//! grams. Reductions convert the pollutant totals to kilograms.

use fleet_core::{FuelType, Paired, ProvinceEnergyProfile, UnitFamily, VehicleSpec};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const GRAMS_PER_TONNE: f64 = 1e6;
const GRAMS_PER_KG: f64 = 1e3;

#[derive(Debug, Error, PartialEq)]
pub enum EmissionsError {
    #[error("{0} is not a finite number")]
    NonFinite(&'static str),
    #[error("{0} must not be negative")]
    Negative(&'static str),
}

/// Distance driven by the whole fleet over its lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityProfile {
    pub vehicle_count: u32,
    pub lifetime_years: u32,
    pub daily_distance_km: f64,
    pub operating_days: u32,
}

impl ActivityProfile {
    pub fn lifetime_fleet_km(&self) -> f64 {
        f64::from(self.vehicle_count)
            * f64::from(self.lifetime_years)
            * self.daily_distance_km
            * f64::from(self.operating_days)
    }
}

/// Where a powertrain's GHG factor in g/km comes from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum EmissionFactorSource {
    /// Table factor in gCO2e/km.
    Tailpipe { g_per_km: f64 },
    /// kWh/km times the provincial grid intensity.
    Grid { kwh_per_km: f64, g_per_kwh: f64 },
    /// kg H2 per 100 km times the hydrogen production intensity.
    Hydrogen { kg_per_100km: f64, g_per_kg: f64 },
}

impl EmissionFactorSource {
    pub fn for_fuel(
        fuel: FuelType,
        efficiency: f64,
        table_ghg_ef: f64,
        province: &ProvinceEnergyProfile,
    ) -> Self {
        match fuel.unit_family() {
            UnitFamily::LiquidPer100Km => EmissionFactorSource::Tailpipe {
                g_per_km: table_ghg_ef,
            },
            UnitFamily::ElectricPerKm => EmissionFactorSource::Grid {
                kwh_per_km: efficiency,
                g_per_kwh: province.grid_intensity,
            },
            UnitFamily::HydrogenPer100Km => EmissionFactorSource::Hydrogen {
                kg_per_100km: efficiency,
                g_per_kg: province.hydrogen_intensity,
            },
        }
    }

    /// GHG factor in gCO2e/km.
    pub fn g_per_km(&self) -> f64 {
        match *self {
            EmissionFactorSource::Tailpipe { g_per_km } => g_per_km,
            EmissionFactorSource::Grid {
                kwh_per_km,
                g_per_kwh,
            } => kwh_per_km * g_per_kwh,
            EmissionFactorSource::Hydrogen {
                kg_per_100km,
                g_per_kg,
            } => kg_per_100km / 100.0 * g_per_kg,
        }
    }
}

/// Per-km factors for one technology.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PowertrainFactors {
    pub fuel: FuelType,
    pub ghg: EmissionFactorSource,
    /// g/km
    pub nox_ef: f64,
    /// g/km
    pub pm25_ef: f64,
}

impl PowertrainFactors {
    /// Factors for a vehicle row, using `efficiency` in place of the table
    /// value when the user overrode it.
    pub fn from_spec(
        spec: &VehicleSpec,
        efficiency: Decimal,
        province: &ProvinceEnergyProfile,
    ) -> Result<Self, EmissionsError> {
        let efficiency = efficiency
            .to_f64()
            .ok_or(EmissionsError::NonFinite("efficiency"))?;
        Ok(Self {
            fuel: spec.powertrain,
            ghg: EmissionFactorSource::for_fuel(spec.powertrain, efficiency, spec.ghg_ef, province),
            nox_ef: spec.nox_ef,
            pm25_ef: spec.pm25_ef,
        })
    }

    fn check(&self) -> Result<(), EmissionsError> {
        for (name, value) in [
            ("GHG factor", self.ghg.g_per_km()),
            ("NOx factor", self.nox_ef),
            ("PM2.5 factor", self.pm25_ef),
        ] {
            if !value.is_finite() {
                return Err(EmissionsError::NonFinite(name));
            }
            if value < 0.0 {
                return Err(EmissionsError::Negative(name));
            }
        }
        Ok(())
    }
}

/// Lifetime totals for one technology.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TechnologyEmissions {
    pub ghg_tonnes: f64,
    pub nox_g: f64,
    pub pm25_g: f64,
}

pub fn technology_emissions(
    activity: &ActivityProfile,
    factors: &PowertrainFactors,
) -> Result<TechnologyEmissions, EmissionsError> {
    if !activity.daily_distance_km.is_finite() {
        return Err(EmissionsError::NonFinite("daily distance"));
    }
    if activity.daily_distance_km < 0.0 {
        return Err(EmissionsError::Negative("daily distance"));
    }
    factors.check()?;
    let km = activity.lifetime_fleet_km();
    Ok(TechnologyEmissions {
        ghg_tonnes: km * factors.ghg.g_per_km() / GRAMS_PER_TONNE,
        nox_g: km * factors.nox_ef,
        pm25_g: km * factors.pm25_ef,
    })
}

/// Baseline minus alternative. Percentages are `None` when the baseline is zero.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmissionReductions {
    pub ghg_tonnes: f64,
    pub ghg_percent: Option<f64>,
    pub nox_kg: f64,
    pub nox_percent: Option<f64>,
    pub pm25_kg: f64,
    pub pm25_percent: Option<f64>,
}

fn percent_of(reduction: f64, baseline: f64) -> Option<f64> {
    (baseline != 0.0).then(|| reduction / baseline * 100.0)
}

impl EmissionReductions {
    pub fn between(base: &TechnologyEmissions, alternative: &TechnologyEmissions) -> Self {
        let ghg = base.ghg_tonnes - alternative.ghg_tonnes;
        let nox_g = base.nox_g - alternative.nox_g;
        let pm25_g = base.pm25_g - alternative.pm25_g;
        Self {
            ghg_tonnes: ghg,
            ghg_percent: percent_of(ghg, base.ghg_tonnes),
            nox_kg: nox_g / GRAMS_PER_KG,
            nox_percent: percent_of(nox_g, base.nox_g),
            pm25_kg: pm25_g / GRAMS_PER_KG,
            pm25_percent: percent_of(pm25_g, base.pm25_g),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmissionsReport {
    pub base: TechnologyEmissions,
    pub alternative: TechnologyEmissions,
    pub reductions: EmissionReductions,
}

pub fn emissions_report(
    activity: &ActivityProfile,
    factors: &Paired<PowertrainFactors>,
) -> Result<EmissionsReport, EmissionsError> {
    let base = technology_emissions(activity, &factors.base)?;
    let alternative = technology_emissions(activity, &factors.alternative)?;
    let reductions = EmissionReductions::between(&base, &alternative);
    debug!(
        base = %factors.base.fuel,
        alternative = %factors.alternative.fuel,
        ghg_reduction_t = reductions.ghg_tonnes,
        "emissions computed"
    );
    Ok(EmissionsReport {
        base,
        alternative,
        reductions,
    })
}
