use std::fmt::Write;

use crate::error::RenderError;

use super::measure::TextMeasurer;
use super::tree::{Align, Direction, Node, NodeKind, Position, Style};

/// 已定位的绘制图元
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
        fill: Option<&'static str>,
        stroke: Option<(&'static str, f32)>,
    },
    Circle {
        cx: f32,
        cy: f32,
        r: f32,
        fill: &'static str,
    },
    Text {
        x: f32,
        baseline: f32,
        width: f32,
        font_size: f32,
        color: &'static str,
        content: String,
    },
}

/// 布局完成、等待栅格化的场景
#[derive(Debug, Clone)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub primitives: Vec<Primitive>,
}

#[derive(Debug, Clone, Copy)]
struct Inherited {
    color: &'static str,
    font_size: f32,
}

impl Inherited {
    fn apply(self, style: &Style) -> Self {
        Self {
            color: style.color.unwrap_or(self.color),
            font_size: style.font_size.unwrap_or(self.font_size),
        }
    }
}

const ROOT_INHERITED: Inherited = Inherited {
    color: "#000000",
    font_size: 16.0,
};

/// 以根节点铺满画布进行布局
pub fn layout(root: &Node, width: u32, height: u32, measurer: &TextMeasurer<'_>) -> Scene {
    let mut primitives = Vec::new();
    let ctx = LayoutCtx { measurer };
    ctx.place(
        root,
        Rect {
            x: 0.0,
            y: 0.0,
            w: width as f32,
            h: height as f32,
        },
        ROOT_INHERITED,
        &mut primitives,
    );
    Scene {
        width,
        height,
        primitives,
    }
}

#[derive(Debug, Clone, Copy)]
struct Rect {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

struct LayoutCtx<'m, 'a> {
    measurer: &'m TextMeasurer<'a>,
}

impl LayoutCtx<'_, '_> {
    /// border-box 尺寸（不含 margin）
    fn measure(&self, node: &Node, inherited: Inherited) -> (f32, f32) {
        let ts = inherited.apply(&node.style);
        match &node.kind {
            NodeKind::Text(s) => (
                self.measurer.text_width(s, ts.font_size),
                self.measurer.line_height(ts.font_size),
            ),
            NodeKind::Circle(d) => (*d, *d),
            NodeKind::Container(children) => {
                let (mut main, mut cross) = (0.0f32, 0.0f32);
                for child in children.iter().filter(|c| is_flow(c)) {
                    let (ow, oh) = self.outer_size(child, ts);
                    match node.style.direction {
                        Direction::Column => {
                            main += oh;
                            cross = cross.max(ow);
                        }
                        Direction::Row => {
                            main += ow;
                            cross = cross.max(oh);
                        }
                    }
                }
                let (cw, ch) = match node.style.direction {
                    Direction::Column => (cross, main),
                    Direction::Row => (main, cross),
                };
                let bw = border_width(&node.style) * 2.0;
                (
                    cw + node.style.padding.horizontal() + bw,
                    ch + node.style.padding.vertical() + bw,
                )
            }
        }
    }

    fn outer_size(&self, node: &Node, inherited: Inherited) -> (f32, f32) {
        let (w, h) = self.measure(node, inherited);
        (
            w + node.style.margin.horizontal(),
            h + node.style.margin.vertical(),
        )
    }

    fn place(&self, node: &Node, bx: Rect, inherited: Inherited, out: &mut Vec<Primitive>) {
        let ts = inherited.apply(&node.style);
        match &node.kind {
            NodeKind::Text(s) => out.push(Primitive::Text {
                x: bx.x,
                baseline: bx.y + self.measurer.ascent(ts.font_size),
                width: bx.w,
                font_size: ts.font_size,
                color: ts.color,
                content: s.clone(),
            }),
            NodeKind::Circle(d) => {
                if let Some(fill) = node.style.background {
                    out.push(Primitive::Circle {
                        cx: bx.x + bx.w / 2.0,
                        cy: bx.y + bx.h / 2.0,
                        r: d / 2.0,
                        fill,
                    });
                }
            }
            NodeKind::Container(children) => {
                self.place_container(node, children, bx, ts, out);
            }
        }
    }

    fn place_container(
        &self,
        node: &Node,
        children: &[Node],
        bx: Rect,
        ts: Inherited,
        out: &mut Vec<Primitive>,
    ) {
        let style = &node.style;
        let bw = border_width(style);
        if style.background.is_some() || style.border.is_some() {
            // SVG 描边居中于路径，内缩半个边框宽度以对齐 CSS border-box
            out.push(Primitive::Rect {
                x: bx.x + bw / 2.0,
                y: bx.y + bw / 2.0,
                width: (bx.w - bw).max(0.0),
                height: (bx.h - bw).max(0.0),
                radius: style.border_radius,
                fill: style.background,
                stroke: style.border.map(|b| (b.color, b.width)),
            });
        }

        let inner = Rect {
            x: bx.x + bw + style.padding.left,
            y: bx.y + bw + style.padding.top,
            w: bx.w - 2.0 * bw - style.padding.horizontal(),
            h: bx.h - 2.0 * bw - style.padding.vertical(),
        };

        let flow: Vec<(&Node, (f32, f32))> = children
            .iter()
            .filter(|c| is_flow(c))
            .map(|c| (c, self.measure(c, ts)))
            .collect();

        let column = style.direction == Direction::Column;
        let content_main: f32 = flow
            .iter()
            .map(|(c, (w, h))| {
                if column {
                    h + c.style.margin.vertical()
                } else {
                    w + c.style.margin.horizontal()
                }
            })
            .sum();
        let inner_main = if column { inner.h } else { inner.w };
        let mut cursor = match style.justify_content {
            Align::Center => (inner_main - content_main) / 2.0,
            Align::Start => 0.0,
        };

        for (child, (w, h)) in flow {
            let m = child.style.margin;
            let (ow, oh) = (w + m.horizontal(), h + m.vertical());
            let cross_offset = |inner_cross: f32, outer_cross: f32| match style.align_items {
                Align::Center => (inner_cross - outer_cross) / 2.0,
                Align::Start => 0.0,
            };
            let (x, y) = if column {
                let y = inner.y + cursor + m.top;
                cursor += oh;
                (inner.x + cross_offset(inner.w, ow) + m.left, y)
            } else {
                let x = inner.x + cursor + m.left;
                cursor += ow;
                (x, inner.y + cross_offset(inner.h, oh) + m.top)
            };
            self.place(child, Rect { x, y, w, h }, ts, out);
        }

        for child in children {
            if let Position::Absolute { bottom, right } = child.style.position {
                let (w, h) = self.measure(child, ts);
                let child_box = Rect {
                    x: bx.x + bx.w - right - w,
                    y: bx.y + bx.h - bottom - h,
                    w,
                    h,
                };
                self.place(child, child_box, ts, out);
            }
        }
    }
}

fn is_flow(node: &Node) -> bool {
    node.style.position == Position::Flow
}

fn border_width(style: &Style) -> f32 {
    style.border.map(|b| b.width).unwrap_or(0.0)
}

impl Scene {
    /// 序列化为 SVG 文档，文本统一使用给定字体族（回退到 sans-serif）。
    pub fn to_svg(&self, font_family: &str) -> Result<String, RenderError> {
        let fmt_err = |e: std::fmt::Error| RenderError::Svg(format!("SVG formatting error: {e}"));
        let family = escape_xml(font_family);
        let mut svg = String::with_capacity(2048);
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        )
        .map_err(fmt_err)?;

        for p in &self.primitives {
            match p {
                Primitive::Rect {
                    x,
                    y,
                    width,
                    height,
                    radius,
                    fill,
                    stroke,
                } => {
                    let fill = fill.unwrap_or("none");
                    let stroke_attrs = match stroke {
                        Some((color, sw)) => format!(r#" stroke="{color}" stroke-width="{sw:.1}""#),
                        None => String::new(),
                    };
                    writeln!(
                        svg,
                        r#"<rect x="{x:.1}" y="{y:.1}" width="{width:.1}" height="{height:.1}" rx="{radius:.1}" ry="{radius:.1}" fill="{fill}"{stroke_attrs} />"#
                    )
                    .map_err(fmt_err)?;
                }
                Primitive::Circle { cx, cy, r, fill } => {
                    writeln!(
                        svg,
                        r#"<circle cx="{cx:.1}" cy="{cy:.1}" r="{r:.1}" fill="{fill}" />"#
                    )
                    .map_err(fmt_err)?;
                }
                Primitive::Text {
                    x,
                    baseline,
                    font_size,
                    color,
                    content,
                    ..
                } => {
                    writeln!(
                        svg,
                        r#"<text x="{x:.1}" y="{baseline:.1}" font-family="'{family}', sans-serif" font-size="{font_size:.1}" fill="{color}">{}</text>"#,
                        escape_xml(content)
                    )
                    .map_err(fmt_err)?;
                }
            }
        }

        svg.push_str("</svg>\n");
        Ok(svg)
    }
}

/// XML 1.0 `Char` 产生式（Rust `char` 不含代理项）
pub(super) fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}

/// 转义标记字符，并丢弃 XML 不允许出现的字符（C0 控制符、U+FFFE/U+FFFF）。
fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars().filter(|&c| is_xml_char(c)) {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
