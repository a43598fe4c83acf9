pub const MAX_PROJECTION_MONTHS: u32 = 1_200;

pub fn annuity_future_value(monthly: f64, months: u32, rate_pa: f64) -> f64 {
    let months = months as f64;
    let r = rate_pa / 12.0;
    if r.abs() < 1e-12 {
        return monthly * months;
    }
    monthly * ((1.0 + r).powf(months) - 1.0) / r
}

pub fn future_value(lump_sum: f64, monthly: f64, years: f64, rate_pa: f64) -> f64 {
    let months = horizon_months(years);
    let growth = (1.0 + rate_pa / 12.0).powf(months as f64);
    lump_sum * growth + annuity_future_value(monthly, months, rate_pa)
}

pub fn horizon_months(years: f64) -> u32 {
    if years.is_finite() && years > 0.0 {
        (years * 12.0).round().min(MAX_PROJECTION_MONTHS as f64) as u32
    } else {
        0
    }
}
