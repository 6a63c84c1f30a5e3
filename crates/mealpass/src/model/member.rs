use native_db::*;
use native_model::{Model, native_model};
use serde::{Deserialize, Serialize};

pub mod v1 {
    use super::*;

    #[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
    #[serde(rename_all = "camelCase")]
    #[native_model(id = 1, version = 1)]
    #[native_db]
    pub struct Member {
        /// 24 位十六进制 ID，同时印在会员的二维码上
        #[primary_key]
        pub id: String,
        pub name: String,
        /// 去掉非数字字符后的 10 位手机号
        #[secondary_key(unique)]
        pub phone: String,
        pub created_at: chrono::DateTime<chrono::Local>,
    }
}
