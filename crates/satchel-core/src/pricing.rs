//! Session cost assembly.

use serde::Serialize;

use crate::block::Minute;
use crate::money::Money;
use crate::policy::{AddOn, BookingPolicy};

/// One sliding-scale discount step is worth $10 per hour.
pub const DISCOUNT_STEP_PER_HOUR: Money = Money::from_cents(1000);

/// Small groups may take one discount step, larger ones two.
pub fn max_discount_steps(students: u8) -> u8 {
    if students <= 2 {
        1
    } else {
        2
    }
}

/// Everything that feeds a quote besides the policy itself.
#[derive(Debug, Clone, Copy)]
pub struct CostInputs<'a> {
    pub students: u8,
    pub duration_minutes: Minute,
    pub include_summary: bool,
    pub add_ons: &'a [AddOn],
    pub travel_surcharge: Money,
    pub discount_steps: u8,
}

/// Itemized price of one session, in the policy's currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    session: Money,
    summary: Money,
    add_ons: Money,
    travel: Money,
    discount: Money,
    total: Money,
    total_cents: i64,
    currency: String,
}

impl CostBreakdown {
    pub fn session(&self) -> Money {
        self.session
    }

    pub fn summary(&self) -> Money {
        self.summary
    }

    pub fn add_ons(&self) -> Money {
        self.add_ons
    }

    pub fn travel(&self) -> Money {
        self.travel
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    pub fn total(&self) -> Money {
        self.total
    }

    /// Integer minor units for the payment processor.
    pub fn total_cents(&self) -> i64 {
        self.total_cents
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

/// Prices one session occurrence.
///
/// The hourly rate scales with head count, the discount with both the
/// requested steps (clamped to what the head count allows) and the
/// session length. The result never goes below zero.
pub fn quote(policy: &BookingPolicy, inputs: &CostInputs) -> CostBreakdown {
    let students = inputs.students.max(1);
    let hourly = policy.base_session_cost()
        + policy.extra_student_cost().times(u32::from(students) - 1);
    let session = hourly.for_minutes(inputs.duration_minutes);
    let summary = if inputs.include_summary {
        policy.session_summary_cost()
    } else {
        Money::ZERO
    };
    let add_ons: Money = inputs.add_ons.iter().map(AddOn::price_delta).sum();
    let steps = inputs.discount_steps.min(max_discount_steps(students));
    let discount = DISCOUNT_STEP_PER_HOUR
        .times(u32::from(steps))
        .for_minutes(inputs.duration_minutes);
    let total = (session + summary + add_ons + inputs.travel_surcharge - discount).max_zero();
    CostBreakdown {
        session,
        summary,
        add_ons,
        travel: inputs.travel_surcharge,
        discount,
        total,
        total_cents: total.cents(),
        currency: policy.currency().to_owned(),
    }
}
