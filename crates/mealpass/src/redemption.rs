use std::sync::Arc;

use native_db::Database;
use serde::Serialize;

use crate::{
    attendance::AttendanceLog,
    clock::Clock,
    error::{Error, Result},
    ledger::EntitlementLedger,
    model::{AttendanceRecord, MealType, Member},
    resolver::IdentityResolver,
};

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub member_id: String,
    pub member_name: String,
    pub meal_type: MealType,
    pub remaining_credits: u32,
    pub record: AttendanceRecord,
}

/// 一次扫码 = 解析身份 -> 检查并扣减 -> 写入就餐记录，任一步失败都不会留下部分修改
pub struct RedemptionEngine {
    db: Arc<Database<'static>>,
    resolver: IdentityResolver,
    ledger: Arc<EntitlementLedger>,
    log: Arc<AttendanceLog>,
    clock: Arc<dyn Clock>,
}

impl RedemptionEngine {
    pub fn new(
        db: Arc<Database<'static>>,
        resolver: IdentityResolver,
        ledger: Arc<EntitlementLedger>,
        log: Arc<AttendanceLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            resolver,
            ledger,
            log,
            clock,
        }
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    pub async fn redeem(&self, token: &str, meal_type: MealType) -> Result<Redemption> {
        let member = self.resolver.resolve(token).inspect_err(|e| warn!("Scan rejected: {e}"))?;
        // 持锁直到提交完成，同一会员的两次核销不会在扣减与记账之间交错
        let _guard = self.ledger.lock(&member.id).await;
        match self.redeem_locked(&member, meal_type) {
            Ok(redemption) => {
                info!(
                    "Redeemed {} for {} ({}), {} credits left",
                    meal_type, member.name, member.id, redemption.remaining_credits
                );
                Ok(redemption)
            }
            Err(e @ Error::Denied(_)) => {
                warn!("Redemption of {} for {} ({}) denied: {e}", meal_type, member.name, member.id);
                Err(e)
            }
            Err(e) => {
                error!("Redemption of {} for {} ({}) failed: {e:?}", meal_type, member.name, member.id);
                Err(e)
            }
        }
    }

    fn redeem_locked(&self, member: &Member, meal_type: MealType) -> Result<Redemption> {
        let now = self.clock.now();
        // 扣减与记账在同一个写事务里，提交前任何错误都会让事务整体回滚
        let rw = self.db.rw_transaction()?;
        let receipt = self.ledger.debit_within(&rw, &member.id, now)?;
        let record = self.log.append(&rw, &member.id, meal_type, now)?;
        rw.commit()?;
        Ok(Redemption {
            member_id: member.id.clone(),
            member_name: member.name.clone(),
            meal_type,
            remaining_credits: receipt.remaining,
            record,
        })
    }
}
