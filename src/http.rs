use once_cell::sync::OnceCell;
use reqwest::Client;
use std::time::Duration;

/// 字体下载复用的 HTTP Client（统一连接池/Keep-Alive），避免每次请求重复创建。
///
/// `Client` 本身是线程安全的；timeout 以首次初始化时的配置为准。
static CLIENT_FONTS: OnceCell<Client> = OnceCell::new();

/// 字体下载用的 HTTP Client
pub fn font_client(timeout: Duration) -> Result<&'static Client, reqwest::Error> {
    CLIENT_FONTS.get_or_try_init(|| {
        Client::builder()
            .timeout(timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
    })
}
