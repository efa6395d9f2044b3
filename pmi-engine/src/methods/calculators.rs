//! Per-method PMI calculations
//!
//! Each method is a pure function of (threshold, temperature, length) and
//! rejects the below-base regime with [`Error::Domain`] instead of clamping.

use super::{PmiEstimate, PmiMethod};
use crate::config::{MethodParams, MethodsConfig, ThermalConfig};
use crate::estimator::{check_length, required_add, LARGE_LENGTH_RATIO, SMALL_LENGTH_RATIO};
use pmi_common::{DevelopmentThreshold, Error, Result, TemperatureReading};

/// Dispatches a [`PmiMethod`] to its calculation
#[derive(Debug, Clone, Default)]
pub struct MethodCalculator {
    methods: MethodsConfig,
    thermal: ThermalConfig,
}

impl MethodCalculator {
    pub fn new(methods: MethodsConfig, thermal: ThermalConfig) -> Self {
        Self { methods, thermal }
    }

    pub fn params(&self, method: PmiMethod) -> MethodParams {
        match method {
            PmiMethod::AddStandard => self.methods.add_standard,
            PmiMethod::AddOptimistic => self.methods.add_optimistic,
            PmiMethod::AddConservative => self.methods.add_conservative,
            PmiMethod::AdhMethod => self.methods.adh_method,
            PmiMethod::IsomegalenMethod => self.methods.isomegalen_method,
            PmiMethod::ThermalSummation => self.methods.thermal_summation,
            PmiMethod::DevelopmentRate => self.methods.development_rate,
        }
    }

    /// Run one method
    pub fn calculate(
        &self,
        method: PmiMethod,
        threshold: &DevelopmentThreshold,
        temperature: &TemperatureReading,
        length_mm: Option<f64>,
    ) -> Result<PmiEstimate> {
        temperature.ensure_finite()?;
        check_length(length_mm)?;

        match method {
            PmiMethod::AddStandard => self.add_standard(threshold, temperature, length_mm),
            PmiMethod::AddOptimistic => self.add_optimistic(threshold, temperature),
            PmiMethod::AddConservative => self.add_conservative(threshold, temperature),
            PmiMethod::AdhMethod => self.adh(threshold, temperature, length_mm),
            PmiMethod::IsomegalenMethod => self.isomegalen(threshold, temperature, length_mm),
            PmiMethod::ThermalSummation => {
                self.thermal_summation(threshold, temperature, length_mm)
            }
            PmiMethod::DevelopmentRate => self.development_rate(threshold, temperature),
        }
    }

    fn estimate(&self, method: PmiMethod, pmi_days: f64) -> PmiEstimate {
        let params = self.params(method);
        PmiEstimate::from_days(
            method,
            pmi_days,
            params.confidence_fraction,
            params.reliability_weight * 100.0,
        )
        .with_detail("method", method.label())
    }

    fn add_standard(
        &self,
        threshold: &DevelopmentThreshold,
        temperature: &TemperatureReading,
        length_mm: Option<f64>,
    ) -> Result<PmiEstimate> {
        let effective_temp = effective_temperature(temperature.avg_temp_c, threshold.base_temp_c)?;
        let add = required_add(threshold, length_mm);

        Ok(self
            .estimate(PmiMethod::AddStandard, add / effective_temp)
            .with_notes(
                &[
                    "Constant temperature during development",
                    "Linear relationship between temperature and development rate",
                    "Laboratory-derived development data applies to field conditions",
                ],
                &[
                    "Does not account for temperature fluctuations",
                    "Assumes optimal development conditions",
                    "Species-specific data may be limited",
                ],
            )
            .with_detail("add_required", add)
            .with_detail("effective_temperature", effective_temp)
            .with_detail("base_temperature", threshold.base_temp_c))
    }

    fn add_optimistic(
        &self,
        threshold: &DevelopmentThreshold,
        temperature: &TemperatureReading,
    ) -> Result<PmiEstimate> {
        let factor = self.methods.optimistic_temp_factor;
        let adjusted_temp = temperature.avg_temp_c * factor;
        let effective_temp = effective_temperature(adjusted_temp, threshold.base_temp_c)?;

        Ok(self
            .estimate(PmiMethod::AddOptimistic, threshold.min_add / effective_temp)
            .with_notes(
                &[
                    "Optimal development conditions",
                    "Fastest possible development rate",
                    "No environmental delays",
                ],
                &[
                    "Represents absolute minimum PMI",
                    "Rarely achieved in field conditions",
                    "Does not account for realistic delays",
                ],
            )
            .with_detail("add_required", threshold.min_add)
            .with_detail("effective_temperature", effective_temp)
            .with_detail("temperature_adjustment", factor))
    }

    fn add_conservative(
        &self,
        threshold: &DevelopmentThreshold,
        temperature: &TemperatureReading,
    ) -> Result<PmiEstimate> {
        let factor = self.methods.conservative_temp_factor;
        let adjusted_temp = temperature.avg_temp_c * factor;
        let effective_temp = effective_temperature(adjusted_temp, threshold.base_temp_c)?;

        Ok(self
            .estimate(PmiMethod::AddConservative, threshold.max_add / effective_temp)
            .with_notes(
                &[
                    "Suboptimal development conditions",
                    "Environmental factors slow development",
                    "Conservative temperature estimates",
                ],
                &[
                    "May overestimate PMI",
                    "Accounts for worst-case scenarios",
                    "Less precise than standard methods",
                ],
            )
            .with_detail("add_required", threshold.max_add)
            .with_detail("effective_temperature", effective_temp)
            .with_detail("temperature_adjustment", factor))
    }

    fn adh(
        &self,
        threshold: &DevelopmentThreshold,
        temperature: &TemperatureReading,
        length_mm: Option<f64>,
    ) -> Result<PmiEstimate> {
        let effective_temp = effective_temperature(temperature.avg_temp_c, threshold.base_temp_c)?;
        let required_adh = required_add(threshold, length_mm) * 24.0;
        let pmi_hours = required_adh / effective_temp;

        // Hours are re-derived from days so that hours == days × 24 holds exactly
        Ok(self
            .estimate(PmiMethod::AdhMethod, pmi_hours / 24.0)
            .with_notes(
                &[
                    "Hourly temperature precision is meaningful",
                    "Linear development rate within temperature range",
                    "Short-term temperature fluctuations matter",
                ],
                &[
                    "Requires more precise temperature data",
                    "May be over-precise for long PMI periods",
                    "Computation complexity vs. benefit trade-off",
                ],
            )
            .with_detail("adh_required", required_adh)
            .with_detail("effective_temperature", effective_temp)
            .with_detail("hourly_precision", true))
    }

    fn isomegalen(
        &self,
        threshold: &DevelopmentThreshold,
        temperature: &TemperatureReading,
        length_mm: Option<f64>,
    ) -> Result<PmiEstimate> {
        let length = length_mm.ok_or_else(|| {
            Error::InvalidInput("Specimen length required for Isomegalen method".to_string())
        })?;

        let typical_length = threshold
            .typical_length_mm
            .unwrap_or(self.methods.isomegalen_default_length_mm);
        let length_ratio = length / typical_length;

        let base_add = threshold.mid_add();
        let adjusted_add = if length_ratio > LARGE_LENGTH_RATIO {
            base_add * (0.8 + 0.4 * length_ratio)
        } else if length_ratio < SMALL_LENGTH_RATIO {
            base_add * (0.6 + 0.5 * length_ratio)
        } else {
            base_add
        };

        let effective_temp = effective_temperature(temperature.avg_temp_c, threshold.base_temp_c)?;

        Ok(self
            .estimate(PmiMethod::IsomegalenMethod, adjusted_add / effective_temp)
            .with_notes(
                &[
                    "Specimen length accurately reflects development stage",
                    "Length-development relationship is linear",
                    "Individual variation is minimal",
                ],
                &[
                    "Requires accurate length measurements",
                    "High individual variation in length",
                    "Limited validation data for all species",
                ],
            )
            .with_detail("specimen_length", length)
            .with_detail("typical_length", typical_length)
            .with_detail("length_ratio", length_ratio)
            .with_detail("adjusted_add", adjusted_add))
    }

    fn thermal_summation(
        &self,
        threshold: &DevelopmentThreshold,
        temperature: &TemperatureReading,
        length_mm: Option<f64>,
    ) -> Result<PmiEstimate> {
        let avg_temp = temperature.avg_temp_c;
        let base_temp = threshold.base_temp_c;
        let offsets = self.thermal.offsets_for(threshold.species);
        let optimal_temp = base_temp + offsets.optimal_offset_c;
        let max_temp = base_temp + offsets.max_offset_c;

        if avg_temp <= base_temp {
            return Err(Error::Domain {
                temp_c: avg_temp,
                base_temp_c: base_temp,
            });
        }
        if optimal_temp <= base_temp {
            return Err(Error::InvalidInput(format!(
                "Thermal optimum offset must be positive for {}",
                threshold.species
            )));
        }

        let stress_adjusted = avg_temp > optimal_temp;
        let effective_temp = if !stress_adjusted {
            let efficiency = (avg_temp - base_temp) / (optimal_temp - base_temp);
            (avg_temp - base_temp) * efficiency
        } else {
            let stress_span = max_temp - optimal_temp;
            let stress = if stress_span > 0.0 {
                ((avg_temp - optimal_temp) / stress_span).min(1.0)
            } else {
                1.0
            };
            (optimal_temp - base_temp) * (1.0 - 0.3 * stress)
        };

        let add = required_add(threshold, length_mm);

        Ok(self
            .estimate(PmiMethod::ThermalSummation, add / effective_temp)
            .with_notes(
                &[
                    "Non-linear temperature-development relationship",
                    "Temperature stress affects development rate",
                    "Optimal temperature exists for each species",
                ],
                &[
                    "Optimal temperature estimates may be imprecise",
                    "Stress factors are species-dependent",
                    "Limited validation in extreme temperatures",
                ],
            )
            .with_detail("add_required", add)
            .with_detail("optimal_temperature", optimal_temp)
            .with_detail("max_temperature", max_temp)
            .with_detail("effective_temperature", effective_temp)
            .with_detail("temperature_efficiency", effective_temp / (avg_temp - base_temp))
            .with_detail("stress_adjusted", stress_adjusted))
    }

    fn development_rate(
        &self,
        threshold: &DevelopmentThreshold,
        temperature: &TemperatureReading,
    ) -> Result<PmiEstimate> {
        let avg_temp = temperature.avg_temp_c;
        let base_temp = threshold.base_temp_c;
        if avg_temp <= base_temp {
            return Err(Error::Domain {
                temp_c: avg_temp,
                base_temp_c: base_temp,
            });
        }

        let reference_temp = base_temp + self.methods.development_rate_reference_offset_c;
        let rate_constant = 1.0 / (threshold.mid_add() * (reference_temp - base_temp));
        let rate = rate_constant * (avg_temp - base_temp);

        Ok(self
            .estimate(PmiMethod::DevelopmentRate, 1.0 / rate)
            .with_notes(
                &[
                    "Linear relationship between temperature and development rate",
                    "Development rate constant is species-specific",
                    "Reference temperature data is accurate",
                ],
                &[
                    "Simplified model may not capture complex biology",
                    "Rate constant estimates may be imprecise",
                    "Does not account for developmental non-linearities",
                ],
            )
            .with_detail("development_rate", rate)
            .with_detail("rate_constant", rate_constant)
            .with_detail("reference_temperature", reference_temp))
    }
}

/// `temp − base`, rejecting the no-development regime
fn effective_temperature(temp_c: f64, base_temp_c: f64) -> Result<f64> {
    let effective = temp_c - base_temp_c;
    if effective <= 0.0 {
        return Err(Error::Domain {
            temp_c,
            base_temp_c,
        });
    }
    Ok(effective)
}
