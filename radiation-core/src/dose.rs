use crate::constants::CPM_PER_MICRO_SV_H;

/// Convert an instrument count rate (CPM) to an equivalent dose rate in µSv/h.
///
/// Negative counts are not rejected; upstream guarantees non-negative values.
pub fn to_dose_rate(cpm: f64) -> f64 {
    cpm / CPM_PER_MICRO_SV_H
}
