use axum::extract::Query;
use axum::http::Uri;

use crate::error::OgError;

use super::motd::sanitize_motd;

pub const DEFAULT_IP: &str = "mc.hypixel.net";
pub const DEFAULT_MOTD: &str = "A Minecraft Server";
pub const DEFAULT_ONLINE: &str = "N/A";
pub const DEFAULT_MAX: &str = "N/A";

/// OG 卡片查询参数（全部可选，原样作为展示字符串使用）
#[derive(Debug, Clone, Default, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OgQuery {
    /// 服务器地址（默认 mc.hypixel.net）
    #[param(example = "play.example.com")]
    pub ip: Option<String>,
    /// MOTD，渲染前去除 `§x` 颜色/格式代码（默认 A Minecraft Server）
    pub motd: Option<String>,
    /// 在线人数（默认 N/A，不做数值校验）
    pub online: Option<String>,
    /// 最大人数（默认 N/A，不做数值校验）
    pub max: Option<String>,
}

/// 已回填默认值的渲染请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub ip: String,
    pub motd: String,
    pub online: String,
    pub max: String,
}

impl RenderRequest {
    /// 从请求 URI 的查询串构造；缺失或空字符串的参数回退到默认值。
    pub fn from_uri(uri: &Uri) -> Result<Self, OgError> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri)
            .map_err(|e| OgError::Query(e.body_text()))?;
        Ok(Self::from_pairs(pairs))
    }

    /// 按出现顺序收集键值对：重复的键只取第一次出现的值，未知键忽略。
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut query = OgQuery::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "ip" => &mut query.ip,
                "motd" => &mut query.motd,
                "online" => &mut query.online,
                "max" => &mut query.max,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        Self::from_query(query)
    }

    pub fn from_query(query: OgQuery) -> Self {
        Self {
            ip: or_default(query.ip, DEFAULT_IP),
            motd: or_default(query.motd, DEFAULT_MOTD),
            online: or_default(query.online, DEFAULT_ONLINE),
            max: or_default(query.max, DEFAULT_MAX),
        }
    }

    /// 只清洗 MOTD，其余字段原样保留。
    pub fn sanitized(self) -> CardFields {
        CardFields {
            motd: sanitize_motd(&self.motd),
            ip: self.ip,
            online: self.online,
            max: self.max,
        }
    }
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self::from_query(OgQuery::default())
    }
}

/// 卡片上实际展示的字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardFields {
    pub ip: String,
    pub motd: String,
    pub online: String,
    pub max: String,
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(uri: &str) -> RenderRequest {
        let uri: Uri = uri.parse().expect("valid uri");
        RenderRequest::from_uri(&uri).expect("parse query")
    }

    #[test]
    fn missing_query_falls_back_to_defaults() {
        let req = parse("/api/og");
        assert_eq!(req.ip, "mc.hypixel.net");
        assert_eq!(req.motd, "A Minecraft Server");
        assert_eq!(req.online, "N/A");
        assert_eq!(req.max, "N/A");
        assert_eq!(req, RenderRequest::default());
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let req = parse("/api/og?ip=&motd=&online=&max=");
        assert_eq!(req, RenderRequest::default());
    }

    #[test]
    fn values_are_kept_as_strings() {
        let req = parse("/api/og?ip=play.example.com&online=lots&max=-1");
        assert_eq!(req.ip, "play.example.com");
        assert_eq!(req.online, "lots");
        assert_eq!(req.max, "-1");
        assert_eq!(req.motd, DEFAULT_MOTD);
    }

    #[test]
    fn percent_encoded_values_are_decoded() {
        let req = parse("/api/og?motd=%C2%A7aWelcome%C2%A7r&ip=%E6%9C%8D%E5%8A%A1%E5%99%A8+1");
        assert_eq!(req.motd, "§aWelcome§r");
        assert_eq!(req.ip, "服务器 1");
    }

    #[test]
    fn repeated_keys_take_first_value() {
        let req = parse("/api/og?ip=a.example&ip=b.example&online=1&online=2");
        assert_eq!(req.ip, "a.example");
        assert_eq!(req.online, "1");
    }

    #[test]
    fn empty_first_value_still_falls_back() {
        let req = parse("/api/og?max=&max=100&motd=hi&unknown=x&unknown=y");
        assert_eq!(req.max, DEFAULT_MAX);
        assert_eq!(req.motd, "hi");
    }

    #[test]
    fn sanitized_only_touches_motd() {
        let fields = parse("/api/og?ip=%C2%A7a.host&motd=%C2%A7aWelcome%C2%A7r&online=42&max=100")
            .sanitized();
        assert_eq!(fields.ip, "§a.host");
        assert_eq!(fields.motd, "Welcome");
        assert_eq!(fields.online, "42");
        assert_eq!(fields.max, "100");
    }
}
