use std::{fmt::Write, sync::Arc};

use chrono::{DateTime, Local};
use native_db::{Database, transaction::RTransaction};
use rand::Rng;
use serde::Serialize;

use crate::{
    clock::Clock,
    error::{Error, Result},
    model::{Member, MemberKey, Subscription, SubscriptionStatus},
};

const PHONE_DIGITS: usize = 10;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemberOverview {
    #[serde(flatten)]
    pub member: Member,
    pub subscription: Option<Subscription>,
    /// 没有订阅时为空，即尚待开通
    pub status: Option<SubscriptionStatus>,
    pub remaining: Option<u32>,
}

pub struct MemberRegistry {
    db: Arc<Database<'static>>,
    clock: Arc<dyn Clock>,
}

impl MemberRegistry {
    pub fn new(db: Arc<Database<'static>>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub fn enroll(&self, name: &str, phone: &str) -> Result<Member> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidMember("name must not be empty"));
        }
        let phone = normalize_phone(phone)?;
        let rw = self.db.rw_transaction()?;
        // 写事务全局串行，检查手机号与插入之间不会被其他登记打断
        let taken = rw
            .get()
            .secondary::<Member>(MemberKey::phone, phone.as_str())?
            .is_some();
        if taken {
            return Err(Error::DuplicatePhone(phone));
        }
        let mut id = new_member_id();
        while rw.get().primary::<Member>(id.as_str())?.is_some() {
            id = new_member_id();
        }
        let member = Member {
            id,
            name: name.to_owned(),
            phone,
            created_at: self.clock.now(),
        };
        rw.insert(member.clone())?;
        rw.commit()?;
        info!("Enrolled member {} ({})", member.name, member.id);
        Ok(member)
    }

    pub fn member(&self, id: &str) -> Result<Option<Member>> {
        let r = self.db.r_transaction()?;
        Ok(r.get().primary(id)?)
    }

    /// 管理端成员列表，最新登记的在前；`search` 匹配姓名（忽略大小写）或手机号片段
    pub fn overview(&self, search: Option<&str>) -> Result<Vec<MemberOverview>> {
        let now = self.clock.now();
        let search = search.map(str::trim).filter(|s| !s.is_empty()).map(str::to_lowercase);
        let r = self.db.r_transaction()?;
        let mut members = r
            .scan()
            .primary::<Member>()?
            .all()?
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(search) = &search {
            members.retain(|m| m.name.to_lowercase().contains(search.as_str()) || m.phone.contains(search.as_str()));
        }
        members.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        members
            .into_iter()
            .map(|member| describe_with(&r, member, now))
            .collect()
    }

    pub fn describe(&self, id: &str) -> Result<MemberOverview> {
        let r = self.db.r_transaction()?;
        let member: Member = r
            .get()
            .primary(id)?
            .ok_or_else(|| Error::IdentityNotFound(id.to_owned()))?;
        describe_with(&r, member, self.clock.now())
    }
}

fn describe_with(r: &RTransaction<'_>, member: Member, now: DateTime<Local>) -> Result<MemberOverview> {
    let subscription: Option<Subscription> = r.get().primary(member.id.as_str())?;
    Ok(MemberOverview {
        status: subscription.as_ref().map(|sub| sub.status_at(now)),
        remaining: subscription.as_ref().map(Subscription::remaining),
        subscription,
        member,
    })
}

fn normalize_phone(phone: &str) -> Result<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != PHONE_DIGITS {
        return Err(Error::InvalidMember("phone number must be 10 digits"));
    }
    Ok(digits)
}

fn new_member_id() -> String {
    let bytes: [u8; 12] = rand::rng().random();
    bytes.iter().fold(String::with_capacity(24), |mut id, b| {
        let _ = write!(id, "{b:02x}");
        id
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::{DietPreference, ErrorKind, MealPass, PlanType, RenewalPolicy, clock::ManualClock};

    fn setup() -> (MealPass, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Local::now()));
        let pass = MealPass::in_memory(clock.clone(), RenewalPolicy::default()).unwrap();
        (pass, clock)
    }

    #[test]
    fn test_new_member_id() {
        let id = new_member_id();
        assert_eq!(id.len(), 24);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(id, new_member_id());
    }

    #[test]
    fn test_enroll_validation() {
        let (pass, _clock) = setup();
        let member = pass.registry.enroll("  Anil Sharma ", "(987) 654-3210").unwrap();
        assert_eq!(member.name, "Anil Sharma");
        assert_eq!(member.phone, "9876543210");
        assert_eq!(pass.registry.member(&member.id).unwrap(), Some(member));

        let testcases = [
            ("", "9876543211", ErrorKind::InvalidMember),
            ("Anil", "98765", ErrorKind::InvalidMember),
            ("Anil", "98765432101", ErrorKind::InvalidMember),
            ("Someone Else", "98765 43210", ErrorKind::DuplicatePhone),
        ];
        for (name, phone, kind) in testcases {
            assert_eq!(pass.registry.enroll(name, phone).unwrap_err().kind(), kind, "{name} {phone}");
        }
        assert_eq!(pass.registry.overview(None).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_overview() {
        let (pass, clock) = setup();
        let first = pass.registry.enroll("Priya Nair", "9000000001").unwrap();
        clock.advance(TimeDelta::minutes(1));
        let second = pass.registry.enroll("Rahul Verma", "9000000002").unwrap();
        pass.ledger
            .activate_or_renew(&second.id, PlanType::TwoMealsPerDay, DietPreference::NonVeg, 30)
            .await
            .unwrap();
        pass.ledger.try_debit(&second.id).await.unwrap();

        let all = pass.registry.overview(None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].member, second);
        assert_eq!(all[0].status, Some(SubscriptionStatus::Active));
        assert_eq!(all[0].remaining, Some(59));
        assert_eq!(all[1].member, first);
        assert_eq!(all[1].subscription, None);
        assert_eq!(all[1].status, None);

        let found = pass.registry.overview(Some("priya")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].member, first);
        assert_eq!(pass.registry.overview(Some("0002")).unwrap()[0].member, second);
        assert_eq!(pass.registry.overview(Some("   ")).unwrap().len(), 2);
        assert!(pass.registry.overview(Some("nobody")).unwrap().is_empty());

        let described = pass.registry.describe(&second.id).unwrap();
        assert_eq!(described, all[0]);
        assert_eq!(
            pass.registry.describe("ffffffffffffffffffffffff").unwrap_err().kind(),
            ErrorKind::IdentityNotFound
        );

        clock.advance(TimeDelta::days(31));
        assert_eq!(
            pass.registry.overview(Some("rahul")).unwrap()[0].status,
            Some(SubscriptionStatus::Expired)
        );
    }

    #[test]
    fn test_overview_serializes_flat() {
        let (pass, _clock) = setup();
        pass.registry.enroll("Sana Khan", "9000000003").unwrap();
        let value = serde_json::to_value(&pass.registry.overview(None).unwrap()[0]).unwrap();
        assert_eq!(value["name"], "Sana Khan");
        assert_eq!(value["phone"], "9000000003");
        assert!(value["subscription"].is_null());
    }
}
