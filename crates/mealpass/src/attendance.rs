use std::{ops::Range, sync::Arc};

use chrono::{DateTime, Local};
use native_db::{Database, transaction::RwTransaction};

use crate::{
    error::Result,
    model::{AttendanceRecord, MealType, attendance::key_of},
};

/// 只追加的就餐记录，不提供修改与删除
pub struct AttendanceLog {
    db: Arc<Database<'static>>,
    #[cfg(test)]
    pub(crate) fail_appends: std::sync::atomic::AtomicBool,
}

impl AttendanceLog {
    pub fn new(db: Arc<Database<'static>>) -> Self {
        Self {
            db,
            #[cfg(test)]
            fail_appends: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// 只能在核销事务内部调用，与扣减一同提交
    pub(crate) fn append(
        &self,
        rw: &RwTransaction<'_>,
        member_id: &str,
        meal_type: MealType,
        recorded_at: DateTime<Local>,
    ) -> Result<AttendanceRecord> {
        #[cfg(test)]
        if self.fail_appends.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(crate::Error::PersistenceFailure("injected append failure".into()));
        }
        // 写事务是串行的，同一微秒内的记录顺延到下一个空闲主键
        let mut id = key_of(recorded_at);
        while rw.get().primary::<AttendanceRecord>(id)?.is_some() {
            id += 1;
        }
        let record = AttendanceRecord {
            id,
            member_id: member_id.to_owned(),
            meal_type,
            recorded_at,
        };
        rw.insert(record.clone())?;
        Ok(record)
    }

    /// 查询 `[from, to)` 内的记录，按时间升序
    pub fn query(&self, range: Range<DateTime<Local>>, member_id: Option<&str>) -> Result<Vec<AttendanceRecord>> {
        if range.start >= range.end {
            return Ok(Vec::new());
        }
        let r = self.db.r_transaction()?;
        let records = r
            .scan()
            .primary::<AttendanceRecord>()?
            .range(key_of(range.start)..key_of(range.end))?
            .filter(|record| match (record, member_id) {
                (Ok(record), Some(member_id)) => record.member_id == member_id,
                _ => true,
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeDelta;

    use super::*;
    use crate::{MealPass, RenewalPolicy, clock::ManualClock};

    #[test]
    fn test_query_is_ordered_and_filtered() {
        let now = Local::now();
        let pass = MealPass::in_memory(Arc::new(ManualClock::new(now)), RenewalPolicy::default()).unwrap();
        let log = &pass.log;
        let rw = log.db.rw_transaction().unwrap();
        // 故意乱序写入，并制造同一时刻的两条记录
        log.append(&rw, "b", MealType::Dinner, now + TimeDelta::hours(2)).unwrap();
        log.append(&rw, "a", MealType::Breakfast, now).unwrap();
        log.append(&rw, "b", MealType::Lunch, now).unwrap();
        log.append(&rw, "a", MealType::Lunch, now + TimeDelta::days(1)).unwrap();
        rw.commit().unwrap();

        let all = log.query(now..now + TimeDelta::days(2), None).unwrap();
        let meals: Vec<_> = all.iter().map(|r| (r.member_id.as_str(), r.meal_type)).collect();
        assert_eq!(
            meals,
            vec![
                ("a", MealType::Breakfast),
                ("b", MealType::Lunch),
                ("b", MealType::Dinner),
                ("a", MealType::Lunch),
            ]
        );
        assert!(all.windows(2).all(|w| w[0].recorded_at <= w[1].recorded_at));

        let only_b = log.query(now..now + TimeDelta::days(1), Some("b")).unwrap();
        assert_eq!(only_b.len(), 2);
        assert!(only_b.iter().all(|r| r.member_id == "b"));

        // 区间左闭右开
        let first_hour = log.query(now..now + TimeDelta::hours(2), None).unwrap();
        assert_eq!(first_hour.len(), 2);
        assert!(log.query(now..now, None).unwrap().is_empty());
    }
}
