use std::sync::Arc;
use std::time::Instant;

use resvg::usvg::{self, Options as UsvgOptions, fontdb};
use resvg::{
    render,
    tiny_skia::{Pixmap, Transform},
};

use crate::error::RenderError;

use super::font::FontAsset;
use super::layout::{self, Scene};
use super::measure::TextMeasurer;
use super::params::CardFields;
use super::tree::{CARD_HEIGHT, CARD_WIDTH, compose_card};

/// 栅格化选项
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// 优先速度（OptimizeSpeed + 快速 PNG 压缩），可能略降画质
    pub optimize_speed: bool,
}

/// 组装视觉树并完成布局
pub fn compose_scene(fields: &CardFields, font: &FontAsset) -> Scene {
    let measurer = TextMeasurer::new(&font.data);
    layout::layout(&compose_card(fields), CARD_WIDTH, CARD_HEIGHT, &measurer)
}

/// 生成卡片 SVG 文档
pub fn render_card_svg(fields: &CardFields, font: &FontAsset) -> Result<String, RenderError> {
    compose_scene(fields, font).to_svg(&font.family)
}

/// 只包含本次下载字体的字体库。
///
/// 字体以 `font.family` 对外命名：若文件内部的真实族名不同，则将其登记为 sans-serif
/// 回退族，SVG 中的 `'<family>', sans-serif` 仍能命中该字体。
fn build_font_db(font: &FontAsset) -> Result<Arc<fontdb::Database>, RenderError> {
    let mut db = fontdb::Database::new();
    db.load_font_data(font.data.to_vec());
    let real_family = db
        .faces()
        .next()
        .and_then(|face| face.families.first())
        .map(|(name, _)| name.clone())
        .ok_or(RenderError::UnusableFont)?;
    if real_family != font.family {
        tracing::debug!("字体真实族名为 {}，登记为 sans-serif 回退", real_family);
    }
    db.set_sans_serif_family(real_family);
    Ok(Arc::new(db))
}

/// 完整流水线：视觉树 → SVG → 1200×630 PNG。
pub fn render_card_png(
    fields: &CardFields,
    font: &FontAsset,
    opts: RenderOptions,
) -> Result<Vec<u8>, RenderError> {
    let t0 = Instant::now();
    let font_db = build_font_db(font)?;
    let svg = render_card_svg(fields, font)?;
    let t_layout = t0.elapsed();

    let speed = opts.optimize_speed;
    let usvg_opts = UsvgOptions {
        fontdb: font_db,
        font_family: font.family.clone(),
        font_size: 28.0,
        languages: vec!["zh-CN".to_string(), "en".to_string()],
        shape_rendering: if speed {
            usvg::ShapeRendering::OptimizeSpeed
        } else {
            usvg::ShapeRendering::GeometricPrecision
        },
        text_rendering: if speed {
            usvg::TextRendering::OptimizeSpeed
        } else {
            usvg::TextRendering::OptimizeLegibility
        },
        ..Default::default()
    };

    let tree = usvg::Tree::from_data(svg.as_bytes(), &usvg_opts)
        .map_err(|e| RenderError::Svg(format!("Failed to parse SVG: {e}")))?;
    let t_parse = t0.elapsed();

    // 画布尺寸固定，超出部分直接裁剪
    let mut pixmap = Pixmap::new(CARD_WIDTH, CARD_HEIGHT).ok_or(RenderError::Pixmap {
        width: CARD_WIDTH,
        height: CARD_HEIGHT,
    })?;
    render(&tree, Transform::default(), &mut pixmap.as_mut());
    let t_raster = t0.elapsed();

    let out = encode_png(&pixmap, speed)?;
    let t_encode = t0.elapsed();

    tracing::info!(
        "OG 渲染分段: 布局={:?}, 解析={:?}, 栅格化={:?}, 编码={:?}, 总计={:?}",
        t_layout,
        t_parse - t_layout,
        t_raster - t_parse,
        t_encode - t_raster,
        t_encode
    );

    Ok(out)
}

fn encode_png(pixmap: &Pixmap, speed: bool) -> Result<Vec<u8>, RenderError> {
    let (w, h) = (pixmap.width(), pixmap.height());
    let mut out = Vec::with_capacity((w * h) as usize);
    {
        let mut encoder = png::Encoder::new(&mut out, w, h);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        if speed {
            encoder.set_compression(png::Compression::Fast);
            encoder.set_filter(png::FilterType::NoFilter);
        } else {
            encoder.set_compression(png::Compression::Default);
            encoder.set_filter(png::FilterType::Paeth);
        }
        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::Encode(format!("write_header: {e}")))?;
        writer
            .write_image_data(pixmap.data())
            .map_err(|e| RenderError::Encode(format!("write_image_data: {e}")))?;
        writer
            .finish()
            .map_err(|e| RenderError::Encode(format!("finish: {e}")))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    /// 设置后，缺少系统字体时跳过栅格化用例而不是失败
    const ALLOW_FONTLESS: &str = "MC_MONITOR_ALLOW_FONTLESS_TESTS";

    /// 取一个系统字体充当远端字体。
    ///
    /// 没有任何系统字体时直接 panic；只有显式设置 `MC_MONITOR_ALLOW_FONTLESS_TESTS`
    /// 才返回 None，并在输出中打印 SKIPPED。
    fn system_font_or_skip(test: &str) -> Option<FontAsset> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        let data = db
            .faces()
            .next()
            .and_then(|face| db.with_face_data(face.id, |data, _| data.to_vec()));
        match data {
            Some(data) => Some(FontAsset {
                family: "Noto Sans SC".to_string(),
                data: Bytes::from(data),
            }),
            None if std::env::var_os(ALLOW_FONTLESS).is_some() => {
                eprintln!("SKIPPED {test}: no system fonts ({ALLOW_FONTLESS} is set)");
                None
            }
            None => panic!(
                "{test} needs a system font to rasterize text; install one \
                 (e.g. fonts-dejavu-core) or set {ALLOW_FONTLESS}=1 to skip explicitly"
            ),
        }
    }

    fn fields(ip: &str, motd: &str) -> CardFields {
        CardFields {
            ip: ip.into(),
            motd: motd.into(),
            online: "42".into(),
            max: "100".into(),
        }
    }

    fn png_size(bytes: &[u8]) -> (u32, u32) {
        let decoder = png::Decoder::new(bytes);
        let reader = decoder.read_info().expect("png header");
        let info = reader.info();
        (info.width, info.height)
    }

    #[test]
    fn unusable_font_is_an_error() {
        let font = FontAsset {
            family: "Noto Sans SC".into(),
            data: Bytes::from_static(b"<html>not a font</html>"),
        };
        let err = render_card_png(&fields("a", "b"), &font, RenderOptions::default())
            .expect_err("garbage font must fail");
        assert!(matches!(err, RenderError::UnusableFont));
    }

    #[test]
    fn output_is_always_1200x630() {
        let Some(font) = system_font_or_skip("output_is_always_1200x630") else {
            return;
        };
        for (ip, motd) in [
            ("play.example.com", "Welcome"),
            ("", ""),
            (&"x".repeat(500)[..], &"我的世界服务器".repeat(100)[..]),
        ] {
            let png = render_card_png(&fields(ip, motd), &font, RenderOptions::default())
                .expect("render");
            assert_eq!(png_size(&png), (CARD_WIDTH, CARD_HEIGHT));
        }
    }

    #[test]
    fn control_chars_in_motd_still_render() {
        let Some(font) = system_font_or_skip("control_chars_in_motd_still_render") else {
            return;
        };
        let png = render_card_png(
            &fields("play.example.com", "hi\u{1}there\u{FFFF}"),
            &font,
            RenderOptions::default(),
        )
        .expect("control chars must not break rendering");
        assert_eq!(png_size(&png), (CARD_WIDTH, CARD_HEIGHT));
    }

    #[test]
    fn optimize_speed_still_produces_png() {
        let Some(font) = system_font_or_skip("optimize_speed_still_produces_png") else {
            return;
        };
        let png = render_card_png(
            &fields("mc.hypixel.net", "A Minecraft Server"),
            &font,
            RenderOptions {
                optimize_speed: true,
            },
        )
        .expect("render");
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn svg_contains_sanitized_fields() {
        let font = FontAsset {
            family: "Noto Sans SC".into(),
            data: Bytes::from_static(b""),
        };
        let svg = render_card_svg(&fields("play.example.com", "Welcome"), &font).expect("svg");
        for expected in ["play.example.com", "Welcome", ">42<", ">/<", ">100<"] {
            assert!(svg.contains(expected), "missing {expected}");
        }
    }
}
