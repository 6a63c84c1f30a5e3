use chrono::{DateTime, Local};

use crate::model::MealType;

pub mod v1 {
    use native_db::*;
    use native_model::{Model, native_model};
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
    #[serde(rename_all = "camelCase")]
    #[native_model(id = 3, version = 1)]
    #[native_db]
    pub struct AttendanceRecord {
        /// 由记录时间（微秒）推出的主键，主键顺序即时间顺序
        #[primary_key]
        pub id: u64,
        pub member_id: String,
        pub meal_type: MealType,
        pub recorded_at: DateTime<Local>,
    }
}

/// 把时间映射到主键空间，1970 年之前的时间统一记为 0
pub fn key_of(at: DateTime<Local>) -> u64 {
    u64::try_from(at.timestamp_micros()).unwrap_or_default()
}
