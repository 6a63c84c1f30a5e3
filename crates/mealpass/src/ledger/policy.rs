use std::{cmp, str::FromStr};

use chrono::{DateTime, Local, TimeDelta};
use thiserror::Error;

use crate::{
    error::{Error, Result},
    model::{DietPreference, PlanType, Subscription},
};

/// 一次开通或续费所发放的权益
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    pub plan: PlanType,
    pub diet: DietPreference,
    pub days: i64,
    pub credits: u32,
    window: TimeDelta,
}

impl Grant {
    pub fn new(plan: PlanType, diet: DietPreference, days: i64) -> Result<Self> {
        if days <= 0 {
            return Err(Error::InvalidDuration(days));
        }
        let credits = u32::try_from(days)
            .ok()
            .and_then(|d| plan.credits_for(d))
            .ok_or(Error::InvalidDuration(days))?;
        let window = TimeDelta::try_days(days).ok_or(Error::InvalidDuration(days))?;
        Ok(Self {
            plan,
            diet,
            days,
            credits,
            window,
        })
    }

    /// 首次开通：从当前时刻开始计算有效期
    pub fn open(&self, member_id: &str, now: DateTime<Local>) -> Result<Subscription> {
        Ok(Subscription {
            member_id: member_id.to_owned(),
            plan: self.plan,
            diet: self.diet,
            start: now,
            end: self.extend(now)?,
            total_meals: self.credits,
            used_meals: 0,
        })
    }

    fn extend(&self, from: DateTime<Local>) -> Result<DateTime<Local>> {
        from.checked_add_signed(self.window)
            .ok_or(Error::InvalidDuration(self.days))
    }
}

#[derive(Error, Debug)]
#[error("Unknown renewal policy {0:?}, expected `accumulate` or `reset`")]
pub struct UnknownPolicy(String);

/// 已有订阅时的续费策略，与核销逻辑完全解耦
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, derive_more::Display)]
pub enum RenewalPolicy {
    /// 有效期从 max(当前时间, 原到期时间) 起顺延，餐次累加，已用餐次不变
    #[default]
    #[display("accumulate")]
    Accumulate,
    /// 按新套餐重新开通，未用完的餐次作废
    #[display("reset")]
    Reset,
}

impl RenewalPolicy {
    pub fn renew(self, current: &Subscription, grant: &Grant, now: DateTime<Local>) -> Result<Subscription> {
        match self {
            RenewalPolicy::Accumulate => Ok(Subscription {
                member_id: current.member_id.clone(),
                plan: grant.plan,
                diet: grant.diet,
                start: current.start,
                end: grant.extend(cmp::max(now, current.end))?,
                total_meals: current
                    .total_meals
                    .checked_add(grant.credits)
                    .ok_or(Error::InvalidDuration(grant.days))?,
                used_meals: current.used_meals,
            }),
            RenewalPolicy::Reset => grant.open(&current.member_id, now),
        }
    }
}

impl FromStr for RenewalPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accumulate" => Ok(RenewalPolicy::Accumulate),
            "reset" => Ok(RenewalPolicy::Reset),
            _ => Err(UnknownPolicy(s.to_owned())),
        }
    }
}
