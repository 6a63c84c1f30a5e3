use std::{ops::Range, sync::Arc};

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use native_db::Database;
use serde::Serialize;

use crate::{
    attendance::AttendanceLog,
    clock::Clock,
    error::Result,
    model::{AttendanceRecord, MealType, Member},
};

#[derive(Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DailyCounts {
    pub breakfast: u64,
    pub lunch: u64,
    pub dinner: u64,
    pub total: u64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub member_name: Option<String>,
    pub phone: Option<String>,
}

/// 只读统计，每次都从就餐记录重新计算
pub struct Reporter {
    db: Arc<Database<'static>>,
    log: Arc<AttendanceLog>,
    clock: Arc<dyn Clock>,
}

impl Reporter {
    pub fn new(db: Arc<Database<'static>>, log: Arc<AttendanceLog>, clock: Arc<dyn Clock>) -> Self {
        Self { db, log, clock }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    pub fn daily_counts(&self, date: NaiveDate) -> Result<DailyCounts> {
        let counts = self
            .log
            .query(day_range(date), None)?
            .iter()
            .fold(DailyCounts::default(), |mut counts, record| {
                match record.meal_type {
                    MealType::Breakfast => counts.breakfast += 1,
                    MealType::Lunch => counts.lunch += 1,
                    MealType::Dinner => counts.dinner += 1,
                }
                counts.total += 1;
                counts
            });
        Ok(counts)
    }

    pub fn daily_attendance(&self, date: NaiveDate) -> Result<Vec<AttendanceEntry>> {
        let records = self.log.query(day_range(date), None)?;
        let r = self.db.r_transaction()?;
        records
            .into_iter()
            .map(|record| -> Result<AttendanceEntry> {
                let member: Option<Member> = r.get().primary(record.member_id.as_str())?;
                let (member_name, phone) = member.map(|m| (m.name, m.phone)).unzip();
                Ok(AttendanceEntry {
                    record,
                    member_name,
                    phone,
                })
            })
            .collect()
    }
}

fn start_of(date: NaiveDate) -> DateTime<Local> {
    let midnight = date.and_time(NaiveTime::MIN);
    // 零点恰好落在夏令时空档里时，退回按 UTC 解释
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&midnight))
}

/// 本地日历日对应的 `[当天零点, 次日零点)`
pub fn day_range(date: NaiveDate) -> Range<DateTime<Local>> {
    let start = start_of(date);
    let end = date.succ_opt().map(start_of).unwrap_or(start);
    start..end
}
