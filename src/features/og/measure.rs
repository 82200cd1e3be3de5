use ttf_parser::Face;
use unicode_width::UnicodeWidthChar;

// 字体缺失对应字形（或字体无法解析）时的估算参数，单位为 em
const FALLBACK_NARROW_ADVANCE: f32 = 0.55;
const FALLBACK_WIDE_ADVANCE: f32 = 1.0;
const FALLBACK_ASCENT: f32 = 0.9;
const FALLBACK_DESCENT: f32 = 0.3;

/// 基于字体 hmtx/hhea 表的文本度量
pub struct TextMeasurer<'a> {
    face: Option<Face<'a>>,
}

impl<'a> TextMeasurer<'a> {
    pub fn new(font_data: &'a [u8]) -> Self {
        let face = match Face::parse(font_data, 0) {
            Ok(face) => Some(face),
            Err(e) => {
                tracing::warn!("字体度量表解析失败，改用估算宽度: {}", e);
                None
            }
        };
        Self { face }
    }

    /// 不依赖字体的估算度量
    pub fn estimated() -> Self {
        Self { face: None }
    }

    /// 单行文本宽度（像素）
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().map(|c| self.advance_em(c)).sum::<f32>() * font_size
    }

    /// 基线到行顶的距离（像素）
    pub fn ascent(&self, font_size: f32) -> f32 {
        self.metrics().0 * font_size
    }

    /// 行高，等价于 CSS `line-height: normal`（ascent + descent + lineGap）
    pub fn line_height(&self, font_size: f32) -> f32 {
        let (ascent, descent, gap) = self.metrics();
        (ascent + descent + gap) * font_size
    }

    fn metrics(&self) -> (f32, f32, f32) {
        match &self.face {
            Some(face) => {
                let upem = face.units_per_em() as f32;
                (
                    face.ascender() as f32 / upem,
                    -(face.descender() as f32) / upem,
                    face.line_gap() as f32 / upem,
                )
            }
            None => (FALLBACK_ASCENT, FALLBACK_DESCENT, 0.0),
        }
    }

    fn advance_em(&self, c: char) -> f32 {
        if let Some(face) = &self.face
            && let Some(glyph) = face.glyph_index(c)
            && let Some(advance) = face.glyph_hor_advance(glyph)
        {
            return advance as f32 / face.units_per_em() as f32;
        }
        match UnicodeWidthChar::width(c) {
            Some(2) => FALLBACK_WIDE_ADVANCE,
            Some(0) => 0.0,
            _ => FALLBACK_NARROW_ADVANCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TextMeasurer;

    #[test]
    fn estimated_width_scales_with_font_size() {
        let m = TextMeasurer::estimated();
        let w28 = m.text_width("play.example.com", 28.0);
        let w56 = m.text_width("play.example.com", 56.0);
        assert!(w28 > 0.0);
        assert!((w56 - 2.0 * w28).abs() < 0.01);
    }

    #[test]
    fn wide_chars_are_wider_than_ascii() {
        let m = TextMeasurer::estimated();
        assert!(m.text_width("服务器", 20.0) > m.text_width("abc", 20.0));
        assert_eq!(m.text_width("", 20.0), 0.0);
    }

    #[test]
    fn garbage_font_falls_back_to_estimates() {
        let m = TextMeasurer::new(b"not a font");
        assert_eq!(m.text_width("ab", 10.0), TextMeasurer::estimated().text_width("ab", 10.0));
        assert!((m.line_height(10.0) - 12.0).abs() < 0.001);
    }
}
