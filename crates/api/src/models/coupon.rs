//! Coupon domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use souq_core::CouponId;

/// A percentage-discount coupon.
#[derive(Debug, Clone, Serialize)]
pub struct Coupon {
    /// Unique coupon ID.
    pub id: CouponId,
    /// Coupon code, stored uppercase, unique.
    pub name: String,
    /// Discount percentage, 1-100.
    pub discount_percent: i32,
    /// When the coupon stops being redeemable.
    pub expires_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
    /// When the coupon was created.
    pub created_at: DateTime<Utc>,
    /// When the coupon was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    /// Whether the coupon has expired as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whether the coupon can be applied to a cart as of `now`.
    #[must_use]
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.deleted_at.is_none() && !self.is_expired(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn coupon(expires_in: TimeDelta, deleted: bool) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: CouponId::new(1),
            name: "RAMADAN20".to_owned(),
            discount_percent: 20,
            expires_at: now + expires_in,
            deleted_at: deleted.then_some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_redeemable_when_live() {
        let c = coupon(TimeDelta::days(1), false);
        assert!(c.is_redeemable(Utc::now()));
    }

    #[test]
    fn test_not_redeemable_when_expired() {
        let c = coupon(TimeDelta::days(-1), false);
        assert!(c.is_expired(Utc::now()));
        assert!(!c.is_redeemable(Utc::now()));
    }

    #[test]
    fn test_not_redeemable_when_deleted() {
        let c = coupon(TimeDelta::days(1), true);
        assert!(!c.is_redeemable(Utc::now()));
    }
}
