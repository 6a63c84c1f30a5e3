#[macro_use]
extern crate tracing;

pub mod attendance;
pub mod clock;
pub mod error;
pub mod ledger;
pub mod model;
pub mod redemption;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod scanner;
pub mod store;

use std::{path::Path, sync::Arc};

use native_db::Database;

pub use crate::{
    attendance::AttendanceLog,
    clock::{Clock, ManualClock, SystemClock},
    error::{Denial, Error, ErrorKind, Result},
    ledger::{DebitReceipt, EntitlementLedger, RenewalPolicy},
    model::{DietPreference, MealType, PlanType, SubscriptionStatus},
    redemption::{Redemption, RedemptionEngine},
    registry::{MemberOverview, MemberRegistry},
    report::{AttendanceEntry, DailyCounts, Reporter},
    resolver::IdentityResolver,
};

/// 组装好的核销系统，各组件共享同一个数据库、时钟与成员锁
pub struct MealPass {
    pub registry: MemberRegistry,
    pub ledger: Arc<EntitlementLedger>,
    pub log: Arc<AttendanceLog>,
    pub reporter: Reporter,
    pub engine: RedemptionEngine,
    pub clock: Arc<dyn Clock>,
}

impl MealPass {
    pub fn open(path: impl AsRef<Path>, policy: RenewalPolicy) -> Result<Self> {
        Ok(Self::new(store::open(path)?, Arc::new(SystemClock), policy))
    }

    pub fn in_memory(clock: Arc<dyn Clock>, policy: RenewalPolicy) -> Result<Self> {
        Ok(Self::new(store::open_in_memory()?, clock, policy))
    }

    pub fn new(db: Database<'static>, clock: Arc<dyn Clock>, policy: RenewalPolicy) -> Self {
        let db = Arc::new(db);
        let resolver = IdentityResolver::new(db.clone());
        let ledger = Arc::new(EntitlementLedger::new(db.clone(), clock.clone(), policy));
        let log = Arc::new(AttendanceLog::new(db.clone()));
        Self {
            registry: MemberRegistry::new(db.clone(), clock.clone()),
            reporter: Reporter::new(db.clone(), log.clone(), clock.clone()),
            engine: RedemptionEngine::new(db, resolver, ledger.clone(), log.clone(), clock.clone()),
            clock,
            ledger,
            log,
        }
    }
}
