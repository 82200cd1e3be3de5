//! 卡片的视觉树：带样式的矩形/文本/圆形节点，布局规则是简化的 flexbox。

use super::layout::is_xml_char;
use super::params::CardFields;

pub const CARD_WIDTH: u32 = 1200;
pub const CARD_HEIGHT: u32 = 630;

pub const TITLE_TEXT: &str = "MC 服务器状态";
pub const ATTRIBUTION_TEXT: &str = "由 mc-monitor 生成";

// 固定配色
pub const BACKGROUND: &str = "#222222";
pub const TEXT_PRIMARY: &str = "#FFFFFF";
pub const TITLE_COLOR: &str = "#5EEAD4";
pub const PANEL_FILL: &str = "#333333";
pub const PANEL_BORDER: &str = "#555555";
pub const MOTD_COLOR: &str = "#CCCCCC";
pub const STATUS_DOT: &str = "#34D399";
pub const SEPARATOR_COLOR: &str = "#888888";
pub const ATTRIBUTION_COLOR: &str = "#666666";

const BASE_FONT_SIZE: f32 = 28.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub const fn symmetric(vertical: f32, horizontal: f32) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub const fn bottom(v: f32) -> Self {
        Self {
            top: 0.0,
            right: 0.0,
            bottom: v,
            left: 0.0,
        }
    }

    pub const fn right(v: f32) -> Self {
        Self {
            top: 0.0,
            right: v,
            bottom: 0.0,
            left: 0.0,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    Row,
    #[default]
    Column,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Start,
    Center,
}

/// 定位方式：参与主轴排布，或相对父容器右下角绝对定位
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Position {
    #[default]
    Flow,
    Absolute { bottom: f32, right: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    pub width: f32,
    pub color: &'static str,
}

/// 节点样式。`color`/`font_size` 为 None 时继承父节点。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub direction: Direction,
    pub align_items: Align,
    pub justify_content: Align,
    pub margin: Edges,
    pub padding: Edges,
    pub background: Option<&'static str>,
    pub border: Option<Border>,
    pub border_radius: f32,
    pub color: Option<&'static str>,
    pub font_size: Option<f32>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Container(Vec<Node>),
    Text(String),
    /// 直径
    Circle(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub style: Style,
    pub kind: NodeKind,
}

impl Node {
    pub fn container(style: Style, children: Vec<Node>) -> Self {
        Self {
            style,
            kind: NodeKind::Container(children),
        }
    }

    pub fn text(style: Style, content: impl AsRef<str>) -> Self {
        Self {
            style,
            kind: NodeKind::Text(collapse_whitespace(content.as_ref())),
        }
    }

    pub fn circle(style: Style, diameter: f32) -> Self {
        Self {
            style,
            kind: NodeKind::Circle(diameter),
        }
    }

    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Container(children) => children,
            _ => &[],
        }
    }

    /// 深度优先收集所有文本内容
    pub fn texts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_texts(&mut out);
        out
    }

    fn collect_texts<'a>(&'a self, out: &mut Vec<&'a str>) {
        match &self.kind {
            NodeKind::Text(s) => out.push(s),
            NodeKind::Container(children) => {
                for c in children {
                    c.collect_texts(out);
                }
            }
            NodeKind::Circle(_) => {}
        }
    }
}

/// 与 CSS `white-space: normal` 一致：空白（含换行）折叠为单个空格并去掉首尾空白。
/// XML 不允许的控制字符在折叠前丢弃，不参与度量与绘制。
fn collapse_whitespace(s: &str) -> String {
    let kept: String = s.chars().filter(|&c| is_xml_char(c)).collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 组装固定结构的卡片：标题、带边框的信息面板、右下角署名。
pub fn compose_card(fields: &CardFields) -> Node {
    let title = Node::text(
        Style {
            font_size: Some(48.0),
            color: Some(TITLE_COLOR),
            margin: Edges::bottom(20.0),
            ..Style::default()
        },
        TITLE_TEXT,
    );

    let status_row = Node::container(
        Style {
            direction: Direction::Row,
            align_items: Align::Center,
            font_size: Some(40.0),
            ..Style::default()
        },
        vec![
            Node::circle(
                Style {
                    background: Some(STATUS_DOT),
                    margin: Edges::right(15.0),
                    ..Style::default()
                },
                18.0,
            ),
            Node::text(Style::default(), &fields.online),
            Node::text(
                Style {
                    color: Some(SEPARATOR_COLOR),
                    margin: Edges::symmetric(0.0, 10.0),
                    ..Style::default()
                },
                "/",
            ),
            Node::text(Style::default(), &fields.max),
        ],
    );

    let panel = Node::container(
        Style {
            direction: Direction::Column,
            align_items: Align::Center,
            padding: Edges::symmetric(20.0, 40.0),
            background: Some(PANEL_FILL),
            border: Some(Border {
                width: 2.0,
                color: PANEL_BORDER,
            }),
            border_radius: 12.0,
            ..Style::default()
        },
        vec![
            Node::text(
                Style {
                    font_size: Some(32.0),
                    margin: Edges::bottom(15.0),
                    ..Style::default()
                },
                &fields.ip,
            ),
            Node::text(
                Style {
                    color: Some(MOTD_COLOR),
                    margin: Edges::bottom(20.0),
                    ..Style::default()
                },
                &fields.motd,
            ),
            status_row,
        ],
    );

    let attribution = Node::text(
        Style {
            position: Position::Absolute {
                bottom: 20.0,
                right: 30.0,
            },
            color: Some(ATTRIBUTION_COLOR),
            font_size: Some(18.0),
            ..Style::default()
        },
        ATTRIBUTION_TEXT,
    );

    Node::container(
        Style {
            direction: Direction::Column,
            align_items: Align::Center,
            justify_content: Align::Center,
            background: Some(BACKGROUND),
            color: Some(TEXT_PRIMARY),
            font_size: Some(BASE_FONT_SIZE),
            ..Style::default()
        },
        vec![title, panel, attribution],
    )
}
