use std::sync::Arc;

use mealpass::MealPass;

pub struct AppState {
    pub pass: MealPass,
    /// 会员二维码里 ID 前面的地址，不设置时二维码里只有 ID
    pub qr_base_url: Option<String>,
}

impl AppState {
    pub fn new(pass: MealPass, qr_base_url: Option<String>) -> Arc<Self> {
        Arc::new(Self { pass, qr_base_url })
    }

    pub fn qr_content(&self, member_id: &str) -> String {
        match &self.qr_base_url {
            Some(base) => format!("{}/{member_id}", base.trim_end_matches('/')),
            None => member_id.to_owned(),
        }
    }
}
