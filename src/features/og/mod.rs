//! Minecraft 服务器状态 Open Graph 卡片
//!
//! 流水线：查询参数 → MOTD 清洗 → 字体获取 → 视觉树布局 → resvg 栅格化 → PNG。
//! 任何一步失败都折叠为统一的 500 纯文本响应（见 [`crate::error::OgError`]）。

pub mod font;
pub mod handler;
pub mod layout;
pub mod measure;
pub mod motd;
pub mod params;
pub mod renderer;
pub mod tree;

pub use font::{
    CachedFontSource, DEFAULT_FONT_FAMILY, DEFAULT_FONT_URL, FontAsset, FontSource,
    HttpFontSource, build_font_source,
};
pub use handler::{create_og_router, render_og_png};
pub use motd::sanitize_motd;
pub use params::{CardFields, OgQuery, RenderRequest};
pub use renderer::{RenderOptions, render_card_png, render_card_svg};
pub use tree::{CARD_HEIGHT, CARD_WIDTH};
