use chrono::{DateTime, Local};

use crate::{
    error::Denial,
    model::{DietPreference, PlanType, SubscriptionStatus},
};

pub mod v1 {
    use native_db::*;
    use native_model::{Model, native_model};
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
    #[serde(rename_all = "camelCase")]
    #[native_model(id = 2, version = 1)]
    #[native_db]
    pub struct Subscription {
        /// 每个会员只保留一份当前订阅，续费时原地更新
        #[primary_key]
        pub member_id: String,
        pub plan: PlanType,
        /// 仅作展示，不参与核销判断
        pub diet: DietPreference,
        pub start: DateTime<Local>,
        pub end: DateTime<Local>,
        pub total_meals: u32,
        pub used_meals: u32,
    }
}

impl v1::Subscription {
    pub fn remaining(&self) -> u32 {
        self.total_meals.saturating_sub(self.used_meals)
    }

    /// 与核销时的拒绝顺序一致：先看是否过期，再看餐次是否用完
    pub fn check(&self, now: DateTime<Local>) -> Result<(), Denial> {
        if now > self.end {
            return Err(Denial::Expired);
        }
        if self.used_meals >= self.total_meals {
            return Err(Denial::Exhausted);
        }
        Ok(())
    }

    pub fn status_at(&self, now: DateTime<Local>) -> SubscriptionStatus {
        match self.check(now) {
            Ok(()) => SubscriptionStatus::Active,
            Err(Denial::Expired) => SubscriptionStatus::Expired,
            Err(_) => SubscriptionStatus::Exhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::{v1::Subscription, *};

    fn subscription(now: DateTime<Local>, total_meals: u32, used_meals: u32) -> Subscription {
        Subscription {
            member_id: "m".to_owned(),
            plan: PlanType::OneMealPerDay,
            diet: DietPreference::Veg,
            start: now - TimeDelta::days(1),
            end: now + TimeDelta::days(1),
            total_meals,
            used_meals,
        }
    }

    #[test]
    fn test_status_at() {
        let now = Local::now();
        assert_eq!(subscription(now, 2, 1).status_at(now), SubscriptionStatus::Active);
        assert_eq!(subscription(now, 2, 2).status_at(now), SubscriptionStatus::Exhausted);
        // 同时过期且用完时显示为过期
        let later = now + TimeDelta::days(2);
        assert_eq!(subscription(now, 2, 2).status_at(later), SubscriptionStatus::Expired);
        assert_eq!(subscription(now, 2, 0).status_at(later), SubscriptionStatus::Expired);
        // 结束时刻本身仍然有效
        let sub = subscription(now, 2, 0);
        assert_eq!(sub.status_at(sub.end), SubscriptionStatus::Active);
        assert_eq!(sub.remaining(), 2);
    }
}
