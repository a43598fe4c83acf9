use serde::{Deserialize, Serialize};

use super::projection::{annuity_future_value, horizon_months};

pub const MAX_AMORTIZATION_MONTHS: u32 = 3_600;
pub const PAY_DOWN_MARGIN: f64 = 0.02;
const PAID_OFF_EPSILON: f64 = 1e-6;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtKind {
    Mortgage,
    Consumer,
    Car,
    #[serde(alias = "credit-card", alias = "creditCard")]
    Card,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Debt {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: DebtKind,
    pub balance: f64,
    #[serde(alias = "rate_pa")]
    pub rate_pa: f64,
    #[serde(alias = "monthly_payment")]
    pub monthly_payment: f64,
    #[serde(alias = "months_remaining")]
    pub months_remaining: u32,
}

impl Debt {
    fn clean_balance(&self) -> f64 {
        non_negative(self.balance)
    }

    fn monthly_rate(&self) -> f64 {
        non_negative(self.rate_pa) / 100.0 / 12.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationResult {
    pub months: u32,
    pub total_interest: f64,
}

impl AmortizationResult {
    pub fn converges(&self) -> bool {
        self.total_interest.is_finite()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Verdict {
    #[serde(rename = "splácať")]
    PayDown,
    #[serde(rename = "investovať")]
    Invest,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayDownOutcome {
    pub months: u32,
    pub saved_interest: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct InvestOutcome {
    pub fv: f64,
    pub er_pa: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResult {
    pub pay_down: PayDownOutcome,
    pub invest: InvestOutcome,
    pub verdict: Verdict,
    pub crossover_month: Option<u32>,
}

/// A schedule whose payment never covers the monthly interest reports
/// `total_interest = NaN` and `months = months_remaining`. Check
/// [`AmortizationResult::converges`] before using the interest figure.
pub fn amortize(debt: &Debt, extra_monthly: f64) -> AmortizationResult {
    let mut balance = debt.clean_balance();
    if balance <= PAID_OFF_EPSILON {
        return AmortizationResult {
            months: 0,
            total_interest: 0.0,
        };
    }

    let rate = debt.monthly_rate();
    let payment = non_negative(debt.monthly_payment) + non_negative(extra_monthly);
    if payment <= balance * rate {
        return AmortizationResult {
            months: debt.months_remaining,
            total_interest: f64::NAN,
        };
    }

    let mut months = 0;
    let mut total_interest = 0.0;
    while balance > PAID_OFF_EPSILON && months < MAX_AMORTIZATION_MONTHS {
        let interest = balance * rate;
        total_interest += interest;
        balance += interest;
        balance -= payment.min(balance);
        months += 1;
    }

    AmortizationResult {
        months,
        total_interest,
    }
}

// `saved_interest` is NaN when the scheduled payment alone does not amortize the debt.
pub fn compare_pay_down_vs_invest(
    debt: &Debt,
    extra_monthly: f64,
    horizon_years: f64,
    expected_return_pa: f64,
) -> CompareResult {
    let expected_return_pa = if expected_return_pa.is_finite() {
        expected_return_pa
    } else {
        0.0
    };
    let extra_monthly = non_negative(extra_monthly);

    let scheduled = amortize(debt, 0.0);
    let accelerated = amortize(debt, extra_monthly);
    let fv = annuity_future_value(
        extra_monthly,
        horizon_months(horizon_years),
        expected_return_pa,
    );

    let hurdle = (expected_return_pa - PAY_DOWN_MARGIN).max(0.0);
    let verdict = if non_negative(debt.rate_pa) / 100.0 > hurdle {
        Verdict::PayDown
    } else {
        Verdict::Invest
    };

    CompareResult {
        pay_down: PayDownOutcome {
            months: accelerated.months,
            saved_interest: scheduled.total_interest - accelerated.total_interest,
        },
        invest: InvestOutcome {
            fv,
            er_pa: expected_return_pa,
        },
        verdict,
        crossover_month: crossover_month(debt, extra_monthly, expected_return_pa),
    }
}

pub fn crossover_month(debt: &Debt, extra_monthly: f64, expected_return_pa: f64) -> Option<u32> {
    let mut balance = debt.clean_balance();
    if balance <= PAID_OFF_EPSILON {
        return Some(0);
    }

    let rate = debt.monthly_rate();
    let payment = non_negative(debt.monthly_payment);
    let contribution = non_negative(extra_monthly);
    let growth = 1.0 + expected_return_pa / 12.0;

    let mut invested = 0.0;
    for month in 1..=MAX_AMORTIZATION_MONTHS {
        balance = (balance * (1.0 + rate) - payment).max(0.0);
        invested = invested * growth + contribution;
        if invested > balance {
            return Some(month);
        }
    }
    None
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}
