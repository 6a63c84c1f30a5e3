use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{Context, Result, anyhow};
use axum::http::HeaderValue;
use mealpass::RenewalPolicy;

pub struct Config {
    pub port: u16,
    pub db_path: PathBuf,
    pub renewal_policy: RenewalPolicy,
    /// 管理端所在的源，不设置时允许任意来源
    pub cors_origin: Option<HeaderValue>,
    /// 写进会员二维码的地址前缀，例如 `https://mess.example.com/u`
    pub qr_base_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let cors_origin = match env::var("MEALPASS_CORS_ORIGIN") {
            Ok(origin) => Some(
                HeaderValue::from_str(&origin)
                    .with_context(|| format!("Invalid MEALPASS_CORS_ORIGIN value {origin:?}"))?,
            ),
            Err(_) => {
                info!("MEALPASS_CORS_ORIGIN not set, allowing any origin");
                None
            }
        };
        Ok(Self {
            port: try_load("MEALPASS_PORT", "5000")?,
            db_path: try_load("MEALPASS_DB_PATH", "./mealpass.native_db")?,
            renewal_policy: try_load("MEALPASS_RENEWAL_POLICY", "accumulate")?,
            cors_origin,
            qr_base_url: env::var("MEALPASS_QR_BASE_URL").ok().filter(|url| !url.trim().is_empty()),
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let value = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_owned()
    });
    value
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value {value:?}: {e}"))
}
