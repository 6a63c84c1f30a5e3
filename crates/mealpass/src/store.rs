use std::{path::Path, sync::LazyLock};

use native_db::{Builder, Database, Models};

use crate::{error::Result, model};

static MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    // 模型定义在编译期就确定了，这里失败只可能是 ID 冲突，属于编码错误
    models
        .define::<model::member::v1::Member>()
        .expect("member model is defined once");
    models
        .define::<model::subscription::v1::Subscription>()
        .expect("subscription model is defined once");
    models
        .define::<model::attendance::v1::AttendanceRecord>()
        .expect("attendance model is defined once");
    models
});

// 目前所有模型都只有 v1，不需要迁移；某个模型升级到 v2 时再对它单独调用 `migrate`
pub fn open(path: impl AsRef<Path>) -> Result<Database<'static>> {
    let db = Builder::new().create(&MODELS, path.as_ref())?;
    info!("Database opened at {}", path.as_ref().display());
    Ok(db)
}

pub fn open_in_memory() -> Result<Database<'static>> {
    Ok(Builder::new().create_in_memory(&MODELS)?)
}

#[cfg(test)]
mod tests {
    use crate::{DietPreference, MealPass, MealType, PlanType, RenewalPolicy, report::day_range};

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mealpass.native_db");
        let (member, record) = {
            let pass = MealPass::open(&path, RenewalPolicy::default()).unwrap();
            let member = pass.registry.enroll("Kavya Nair", "9844444444").unwrap();
            pass.ledger
                .activate_or_renew(&member.id, PlanType::TwoMealsPerDay, DietPreference::Veg, 5)
                .await
                .unwrap();
            let redemption = pass.engine.redeem(&member.id, MealType::Dinner).await.unwrap();
            assert_eq!(redemption.remaining_credits, 9);
            (member, redemption.record)
        };

        let pass = MealPass::open(&path, RenewalPolicy::default()).unwrap();
        assert_eq!(pass.registry.member(&member.id).unwrap(), Some(member.clone()));
        let sub = pass.ledger.subscription(&member.id).unwrap().unwrap();
        assert_eq!(sub.total_meals, 10);
        assert_eq!(sub.used_meals, 1);
        let day = day_range(record.recorded_at.date_naive());
        assert_eq!(pass.log.query(day, Some(&member.id)).unwrap(), vec![record]);

        // 重新打开后继续核销，余量接着上次的扣
        let redemption = pass.engine.redeem(&member.id, MealType::Breakfast).await.unwrap();
        assert_eq!(redemption.remaining_credits, 8);
    }
}
