use std::sync::Arc;

use native_db::Database;

use crate::{
    error::{Error, Result},
    model::Member,
};

pub struct IdentityResolver {
    db: Arc<Database<'static>>,
}

impl IdentityResolver {
    pub fn new(db: Arc<Database<'static>>) -> Self {
        Self { db }
    }

    pub fn resolve(&self, token: &str) -> Result<Member> {
        let id = member_id_of(token);
        if id.is_empty() {
            return Err(Error::IdentityNotFound(token.to_owned()));
        }
        let r = self.db.r_transaction()?;
        let member: Option<Member> = r.get().primary(id)?;
        member.ok_or_else(|| Error::IdentityNotFound(token.to_owned()))
    }
}

/// 二维码里可能是完整的 URL，只取最后一段路径作为会员 ID
fn member_id_of(token: &str) -> &str {
    let token = token.trim();
    let token = token.split(['?', '#']).next().unwrap_or(token);
    let token = token.trim_end_matches('/');
    token.rsplit('/').next().unwrap_or(token).trim()
}

#[cfg(test)]
mod tests {
    use chrono::Local;

    use super::*;
    use crate::{ErrorKind, MealPass, RenewalPolicy, clock::ManualClock};

    #[test]
    fn test_member_id_of() {
        let testcases = [
            ("65a1f0c2b3d4e5f601234567", "65a1f0c2b3d4e5f601234567"),
            ("  65a1f0c2b3d4e5f601234567\n", "65a1f0c2b3d4e5f601234567"),
            (
                "https://mess.example.com/member/65a1f0c2b3d4e5f601234567",
                "65a1f0c2b3d4e5f601234567",
            ),
            (
                "https://mess.example.com/member/65a1f0c2b3d4e5f601234567/?src=qr#top",
                "65a1f0c2b3d4e5f601234567",
            ),
            ("https://mess.example.com/member/", "member"),
            ("///", ""),
            ("", ""),
        ];
        for (token, expected) in testcases {
            assert_eq!(member_id_of(token), expected, "token: {token:?}");
        }
    }

    #[test]
    fn test_resolve() {
        let pass = MealPass::in_memory(Arc::new(ManualClock::new(Local::now())), RenewalPolicy::default()).unwrap();
        let member = pass.registry.enroll("Ravi Kumar", "9000000001").unwrap();
        let resolver = pass.engine.resolver();

        assert_eq!(resolver.resolve(&member.id).unwrap(), member);
        let url = format!("https://mess.example.com/u/{}", member.id);
        assert_eq!(resolver.resolve(&url).unwrap(), member);

        for token in ["https://mess.example.com/u/000000000000000000000000", "", "/"] {
            assert_eq!(resolver.resolve(token).unwrap_err().kind(), ErrorKind::IdentityNotFound);
        }
    }
}
