pub mod attendance;
pub mod member;
pub mod subscription;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use attendance::v1::AttendanceRecord;
pub use member::v1::Member;
pub(crate) use member::v1::MemberKey;
pub use subscription::v1::Subscription;

use crate::error::Error;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanType {
    #[display("ONE_MEAL_PER_DAY")]
    OneMealPerDay,
    #[display("TWO_MEALS_PER_DAY")]
    TwoMealsPerDay,
    #[display("THREE_MEALS_PER_DAY")]
    ThreeMealsPerDay,
}

impl PlanType {
    pub fn meals_per_day(self) -> u32 {
        match self {
            PlanType::OneMealPerDay => 1,
            PlanType::TwoMealsPerDay => 2,
            PlanType::ThreeMealsPerDay => 3,
        }
    }

    /// 套餐在给定天数内发放的总餐次，溢出时返回 None
    pub fn credits_for(self, days: u32) -> Option<u32> {
        self.meals_per_day().checked_mul(days)
    }
}

impl FromStr for PlanType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // 兼容管理端旧的 1TIME / 2TIME / 3TIME 写法
        match s.trim() {
            "ONE_MEAL_PER_DAY" | "1TIME" => Ok(PlanType::OneMealPerDay),
            "TWO_MEALS_PER_DAY" | "2TIME" => Ok(PlanType::TwoMealsPerDay),
            "THREE_MEALS_PER_DAY" | "3TIME" => Ok(PlanType::ThreeMealsPerDay),
            other => Err(Error::InvalidPlan(other.to_owned())),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DietPreference {
    #[display("VEG")]
    Veg,
    #[display("NON_VEG")]
    NonVeg,
}

impl FromStr for DietPreference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "VEG" => Ok(DietPreference::Veg),
            "NON_VEG" => Ok(DietPreference::NonVeg),
            other => Err(Error::InvalidPlan(other.to_owned())),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MealType {
    #[display("BREAKFAST")]
    Breakfast,
    #[display("LUNCH")]
    Lunch,
    #[display("DINNER")]
    Dinner,
}

impl FromStr for MealType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BREAKFAST" => Ok(MealType::Breakfast),
            "LUNCH" => Ok(MealType::Lunch),
            "DINNER" => Ok(MealType::Dinner),
            _ => Err(Error::InvalidMealType(s.to_owned())),
        }
    }
}

/// 订阅状态只在读取时根据日期和餐次推导，从不落库
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    #[display("ACTIVE")]
    Active,
    #[display("EXPIRED")]
    Expired,
    #[display("EXHAUSTED")]
    Exhausted,
}
