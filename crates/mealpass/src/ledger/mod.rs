mod policy;

use std::sync::Arc;

use chrono::{DateTime, Local};
use dashmap::DashMap;
use native_db::{Database, transaction::RwTransaction};
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub use policy::{Grant, RenewalPolicy, UnknownPolicy};

use crate::{
    clock::Clock,
    error::{Denial, Error, Result},
    model::{DietPreference, Member, PlanType, Subscription, SubscriptionStatus},
};

/// 扣减成功后的权威状态，调用方无需再读一次
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DebitReceipt {
    pub remaining: u32,
    pub subscription: Subscription,
}

pub struct EntitlementLedger {
    db: Arc<Database<'static>>,
    clock: Arc<dyn Clock>,
    policy: RenewalPolicy,
    // 同一会员的扣减、续费、核销共用一把锁，不同会员之间互不影响
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl EntitlementLedger {
    pub fn new(db: Arc<Database<'static>>, clock: Arc<dyn Clock>, policy: RenewalPolicy) -> Self {
        Self {
            db,
            clock,
            policy,
            locks: DashMap::new(),
        }
    }

    pub fn policy(&self) -> RenewalPolicy {
        self.policy
    }

    /// 调用方必须先确认会员存在，锁表只为真实会员建条目
    pub(crate) async fn lock(&self, member_id: &str) -> OwnedMutexGuard<()> {
        // 先把 Arc 拿出来再等待，避免持有 DashMap 分片锁跨越 await
        let lock = self.locks.entry(member_id.to_owned()).or_default().clone();
        lock.lock_owned().await
    }

    pub fn subscription(&self, member_id: &str) -> Result<Option<Subscription>> {
        let r = self.db.r_transaction()?;
        Ok(r.get().primary(member_id)?)
    }

    pub fn active_subscription(&self, member_id: &str) -> Result<Option<Subscription>> {
        let now = self.clock.now();
        Ok(self
            .subscription(member_id)?
            .filter(|sub| sub.status_at(now) == SubscriptionStatus::Active))
    }

    pub fn status(&self, member_id: &str) -> Result<Option<SubscriptionStatus>> {
        let now = self.clock.now();
        Ok(self.subscription(member_id)?.map(|sub| sub.status_at(now)))
    }

    pub async fn activate_or_renew(
        &self,
        member_id: &str,
        plan: PlanType,
        diet: DietPreference,
        days: i64,
    ) -> Result<Subscription> {
        let grant = Grant::new(plan, diet, days)?;
        self.ensure_member(member_id)?;
        let _guard = self.lock(member_id).await;
        self.apply_grant(member_id, &grant)
    }

    fn apply_grant(&self, member_id: &str, grant: &Grant) -> Result<Subscription> {
        let now = self.clock.now();
        let rw = self.db.rw_transaction()?;
        let current: Option<Subscription> = rw.get().primary(member_id)?;
        let subscription = match current {
            Some(current) => {
                let renewed = self.policy.renew(&current, grant, now)?;
                rw.update(current, renewed.clone())?;
                info!(
                    "Renewed subscription of {member_id} with {} ({}), {} credits left until {}",
                    grant.plan,
                    self.policy,
                    renewed.remaining(),
                    renewed.end.format("%Y-%m-%d %H:%M:%S")
                );
                renewed
            }
            None => {
                let opened = grant.open(member_id, now)?;
                rw.insert(opened.clone())?;
                info!(
                    "Activated subscription of {member_id} with {}, {} credits until {}",
                    grant.plan,
                    opened.total_meals,
                    opened.end.format("%Y-%m-%d %H:%M:%S")
                );
                opened
            }
        };
        rw.commit()?;
        Ok(subscription)
    }

    pub async fn try_debit(&self, member_id: &str) -> Result<DebitReceipt> {
        self.ensure_member(member_id)?;
        let _guard = self.lock(member_id).await;
        let rw = self.db.rw_transaction()?;
        let receipt = self.debit_within(&rw, member_id, self.clock.now())?;
        rw.commit()?;
        Ok(receipt)
    }

    // 会员没有删除操作，锁外检查一次即可
    fn ensure_member(&self, member_id: &str) -> Result<()> {
        let r = self.db.r_transaction()?;
        let member: Option<Member> = r.get().primary(member_id)?;
        match member {
            Some(_) => Ok(()),
            None => Err(Error::IdentityNotFound(member_id.to_owned())),
        }
    }

    /// 在调用方的写事务中完成“检查 + 扣减”，调用方必须已持有该会员的锁，
    /// 事务未提交前任何失败都会连同扣减一起回滚
    pub(crate) fn debit_within(
        &self,
        rw: &RwTransaction<'_>,
        member_id: &str,
        now: DateTime<Local>,
    ) -> Result<DebitReceipt> {
        let current: Subscription = rw.get().primary(member_id)?.ok_or(Denial::NoSubscription)?;
        current.check(now)?;
        let mut updated = current.clone();
        updated.used_meals += 1;
        rw.update(current, updated.clone())?;
        Ok(DebitReceipt {
            remaining: updated.remaining(),
            subscription: updated,
        })
    }
}
