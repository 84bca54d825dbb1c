//! Client classification: income segment and affinity score.
//!
//! Everything here is pure; the repository and analytics services call these
//! functions on every read.

use crate::models::{Client, ClientView, Segment};

/// Lower income bound (inclusive) of each tier.
pub const VIP_MIN_INCOME: f64 = 150_000.0;
pub const PREMIUM_MIN_INCOME: f64 = 100_000.0;
pub const STANDARD_MIN_INCOME: f64 = 50_000.0;

/// Upper bound of the affinity score.
pub const MAX_SCORE: f64 = 10.0;

/// Assigns the income tier.
pub fn segment(income: f64) -> Segment {
    if income >= VIP_MIN_INCOME {
        Segment::Vip
    } else if income >= PREMIUM_MIN_INCOME {
        Segment::Premium
    } else if income >= STANDARD_MIN_INCOME {
        Segment::Standard
    } else {
        Segment::Basic
    }
}

/// Affinity score: `min(10, income/20000 + age/10)` rounded half-up to one
/// decimal, never below zero.
pub fn score(client: &Client) -> f64 {
    raw_score(client.income, client.age)
}

pub(crate) fn raw_score(income: f64, age: i32) -> f64 {
    let base = income / 20_000.0;
    let age_bonus = f64::from(age) / 10.0;
    let score = (base + age_bonus).min(MAX_SCORE).max(0.0);

    // f64::round rounds half away from zero, i.e. half-up for non-negatives
    (score * 10.0).round() / 10.0
}

/// Builds the outward representation of a client.
///
/// `region_label` replaces the stored region on every read path.
pub fn to_view(client: &Client, region_label: &str) -> ClientView {
    ClientView {
        id: client.id.to_string(),
        name: format!("{} {}", client.first_name, client.last_name),
        income: client.income,
        segment: segment(client.income),
        score: score(client),
        region: region_label.to_string(),
    }
}
