//! 管理端与扫码页读取的 JSON 结构，字段名沿用前端已有的写法

use chrono::{DateTime, Local};
use mealpass::{
    AttendanceEntry, DailyCounts, DietPreference, MealType, MemberOverview, PlanType, Redemption, SubscriptionStatus,
    model::{AttendanceRecord, Member, Subscription},
};
use serde::Serialize;

/// 前端下拉框里的套餐写法
fn plan_code(plan: PlanType) -> &'static str {
    match plan {
        PlanType::OneMealPerDay => "1TIME",
        PlanType::TwoMealsPerDay => "2TIME",
        PlanType::ThreeMealsPerDay => "3TIME",
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionBody {
    pub plan_type: &'static str,
    pub veg_type: DietPreference,
    pub start_date: DateTime<Local>,
    pub end_date: DateTime<Local>,
    pub total_meals: u32,
    pub used_meals: u32,
    pub remaining_meals: u32,
    pub status: SubscriptionStatus,
}

impl SubscriptionBody {
    pub fn new(subscription: &Subscription, status: SubscriptionStatus) -> Self {
        Self {
            plan_type: plan_code(subscription.plan),
            veg_type: subscription.diet,
            start_date: subscription.start,
            end_date: subscription.end,
            total_meals: subscription.total_meals,
            used_meals: subscription.used_meals,
            remaining_meals: subscription.remaining(),
            status,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MemberBody {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub phone: String,
    pub created_at: DateTime<Local>,
    pub subscription: Option<SubscriptionBody>,
}

impl From<Member> for MemberBody {
    fn from(member: Member) -> Self {
        Self {
            id: member.id,
            name: member.name,
            phone: member.phone,
            created_at: member.created_at,
            subscription: None,
        }
    }
}

impl From<MemberOverview> for MemberBody {
    fn from(overview: MemberOverview) -> Self {
        let subscription = overview
            .subscription
            .as_ref()
            .zip(overview.status)
            .map(|(sub, status)| SubscriptionBody::new(sub, status));
        Self {
            subscription,
            ..Self::from(overview.member)
        }
    }
}

#[derive(Serialize, Debug)]
pub struct MemberRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub phone: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceBody {
    #[serde(rename = "_id")]
    pub id: String,
    pub meal_type: MealType,
    pub created_at: DateTime<Local>,
    /// 会员信息，找不到会员时为空
    pub user_id: Option<MemberRef>,
}

impl AttendanceBody {
    fn new(record: AttendanceRecord, user: Option<MemberRef>) -> Self {
        Self {
            id: record.id.to_string(),
            meal_type: record.meal_type,
            created_at: record.recorded_at,
            user_id: user,
        }
    }
}

impl From<AttendanceEntry> for AttendanceBody {
    fn from(entry: AttendanceEntry) -> Self {
        let user = entry.member_name.zip(entry.phone).map(|(name, phone)| MemberRef {
            id: entry.record.member_id.clone(),
            name,
            phone,
        });
        Self::new(entry.record, user)
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MarkBody {
    pub message: String,
    pub member_name: String,
    pub meal_type: MealType,
    pub remaining_meals: u32,
    pub attendance: AttendanceBody,
}

impl From<Redemption> for MarkBody {
    fn from(redemption: Redemption) -> Self {
        Self {
            message: format!("{} marked for {}", redemption.meal_type, redemption.member_name),
            member_name: redemption.member_name,
            meal_type: redemption.meal_type,
            remaining_meals: redemption.remaining_credits,
            attendance: AttendanceBody::new(redemption.record, None),
        }
    }
}

#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardBody {
    pub breakfast: u64,
    pub lunch: u64,
    pub dinner: u64,
    pub total_meals: u64,
}

impl From<DailyCounts> for DashboardBody {
    fn from(counts: DailyCounts) -> Self {
        Self {
            breakfast: counts.breakfast,
            lunch: counts.lunch,
            dinner: counts.dinner,
            total_meals: counts.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_member_body_field_names() {
        let now = Local::now();
        let member = Member {
            id: "65a1f0c2b3d4e5f601234567".to_owned(),
            name: "Nisha Das".to_owned(),
            phone: "9855555555".to_owned(),
            created_at: now,
        };
        let subscription = Subscription {
            member_id: member.id.clone(),
            plan: PlanType::TwoMealsPerDay,
            diet: DietPreference::NonVeg,
            start: now,
            end: now + TimeDelta::days(10),
            total_meals: 20,
            used_meals: 4,
        };
        let overview = MemberOverview {
            member,
            subscription: Some(subscription),
            status: Some(SubscriptionStatus::Active),
            remaining: Some(16),
        };
        let value = serde_json::to_value(MemberBody::from(overview)).unwrap();
        assert_eq!(value["_id"], "65a1f0c2b3d4e5f601234567");
        let sub = &value["subscription"];
        assert_eq!(sub["planType"], "2TIME");
        assert_eq!(sub["vegType"], "NON_VEG");
        assert_eq!(sub["status"], "ACTIVE");
        assert_eq!(sub["remainingMeals"], 16);
        assert!(sub["endDate"].is_string());
    }

    #[test]
    fn test_attendance_without_member() {
        let record = AttendanceRecord {
            id: 1_700_000_000_000_000,
            member_id: "gone".to_owned(),
            meal_type: MealType::Dinner,
            recorded_at: Local::now(),
        };
        let entry = AttendanceEntry {
            record,
            member_name: None,
            phone: None,
        };
        let value = serde_json::to_value(AttendanceBody::from(entry)).unwrap();
        assert_eq!(value["_id"], "1700000000000000");
        assert_eq!(value["userId"], json!(null));
        assert_eq!(value["mealType"], "DINNER");
    }
}
