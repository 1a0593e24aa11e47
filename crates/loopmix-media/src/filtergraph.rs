//! Filter graph construction.
//!
//! The graph is an append-only list of labeled nodes with a cursor naming
//! the current visual stream. Each appended node consumes the cursor and
//! replaces it, so the chain is strictly forward-referencing and acyclic by
//! construction. The textual `-filter_complex` syntax is produced only at
//! the subprocess boundary.

use std::path::{Path, PathBuf};

use loopmix_models::{Anchor, LogoOverlay, SimpleOverlay, TextLayout, TextLine};

/// Margin in pixels for corner anchors.
const CORNER_MARGIN: u32 = 40;

/// Frame rate a bare still image is normalized to.
const STILL_FPS: u32 = 24;

/// Vertical fractions for the centered stack: title, subtitle, tagline.
const STACK_FRACTIONS: [f64; 3] = [0.35, 0.50, 0.65];

/// Vertical fractions for the centered logo slots.
const LOGO_BEFORE_TITLE_FRACTION: f64 = 0.22;
const LOGO_AFTER_TAGLINE_FRACTION: f64 = 0.78;

/// Box border width behind stacked lines / the single corner line.
const STACK_BOX_BORDER: u32 = 16;
const CORNER_BOX_BORDER: u32 = 12;

/// Thai Unicode block used for font selection.
const THAI_BLOCK: std::ops::RangeInclusive<u32> = 0x0E00..=0x0E7F;

/// Font files available to drawtext, picked per line of text.
#[derive(Debug, Clone)]
pub struct FontSet {
    /// Default font for Latin and everything else
    pub latin: PathBuf,
    /// Font covering the Thai script
    pub thai: PathBuf,
}

impl Default for FontSet {
    fn default() -> Self {
        Self {
            latin: PathBuf::from("assets/NotoSans-Regular.ttf"),
            thai: PathBuf::from("assets/NotoSansThai-Regular.ttf"),
        }
    }
}

impl FontSet {
    /// Pick the font for a piece of text: Thai when any code point falls in
    /// the Thai block, Latin otherwise (including for empty text).
    pub fn pick(&self, text: &str) -> &Path {
        if has_thai(text) {
            &self.thai
        } else {
            &self.latin
        }
    }
}

/// Whether the text contains any code point in the Thai Unicode block.
pub fn has_thai(text: &str) -> bool {
    text.chars().any(|c| THAI_BLOCK.contains(&(c as u32)))
}

/// Escape text for inclusion inside a drawtext `text='...'` value.
///
/// Applied exactly once, backslash first so already-inserted escapes are
/// never re-escaped: `\` -> `\\`, `:` -> `\:`, `'` -> `\'`.
pub fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

/// Symbol names for positional algebra. The overlay filter sees the frame as
/// `W`/`H` and the overlaid item as `w`/`h`; drawtext sees the frame as
/// `w`/`h` and the rendered text as `text_w`/`text_h`.
#[derive(Debug, Clone, Copy)]
struct SymbolSet {
    frame_w: &'static str,
    frame_h: &'static str,
    item_w: &'static str,
    item_h: &'static str,
}

const OVERLAY_SYMBOLS: SymbolSet = SymbolSet {
    frame_w: "W",
    frame_h: "H",
    item_w: "w",
    item_h: "h",
};

const DRAWTEXT_SYMBOLS: SymbolSet = SymbolSet {
    frame_w: "w",
    frame_h: "h",
    item_w: "text_w",
    item_h: "text_h",
};

/// Resolve a corner anchor to symbolic x/y expressions with the fixed
/// margin. Center slots fall back to the bottom-right default, matching the
/// original behavior outside centered-text mode.
fn corner_position(anchor: Anchor, sym: SymbolSet) -> (String, String) {
    let m = CORNER_MARGIN;
    let near = format!("{m}");
    let far_x = format!("{}-{}-{m}", sym.frame_w, sym.item_w);
    let far_y = format!("{}-{}-{m}", sym.frame_h, sym.item_h);

    match anchor {
        Anchor::TopLeft => (near.clone(), near),
        Anchor::TopRight => (far_x, near),
        Anchor::BottomLeft => (near, far_y),
        Anchor::BottomRight | Anchor::CenterBeforeTitle | Anchor::CenterAfterTagline => {
            (far_x, far_y)
        }
    }
}

/// One `(inputs, expression, output)` triple of the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterNode {
    /// Labels consumed by this node (raw stream specs or earlier outputs)
    pub inputs: Vec<String>,
    /// Filter expression between the labels
    pub expr: String,
    /// Label this node produces
    pub output: String,
}

/// Append-only labeled filter chain with a current-visual-stream cursor.
#[derive(Debug, Clone)]
pub struct FilterGraph {
    nodes: Vec<FilterNode>,
    cursor: String,
}

impl FilterGraph {
    /// Start a graph whose cursor is the raw decoded visual stream.
    pub fn new(initial_label: impl Into<String>) -> Self {
        Self {
            nodes: Vec::new(),
            cursor: initial_label.into(),
        }
    }

    /// Label of the current visual stream (raw stream spec while empty).
    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    /// Whether any node has been appended.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appended nodes, in order.
    pub fn nodes(&self) -> &[FilterNode] {
        &self.nodes
    }

    /// Append a side node that does not consume the cursor (e.g. preparing a
    /// logo stream before overlaying it).
    fn push_side(&mut self, inputs: Vec<String>, expr: String, output: impl Into<String>) {
        self.nodes.push(FilterNode {
            inputs,
            expr,
            output: output.into(),
        });
    }

    /// Append a node consuming the cursor (plus any extra inputs) and make
    /// its output the new cursor.
    fn push_chained(&mut self, extra_inputs: Vec<String>, expr: String, output: impl Into<String>) {
        let output = output.into();
        let mut inputs = vec![self.cursor.clone()];
        inputs.extend(extra_inputs);
        self.nodes.push(FilterNode {
            inputs,
            expr,
            output: output.clone(),
        });
        self.cursor = output;
    }

    /// Normalize a still input to a constant frame rate so it behaves as a
    /// video stream for everything downstream.
    pub fn normalize_still(&mut self) {
        self.push_chained(Vec::new(), format!("fps={STILL_FPS}"), "base");
    }

    /// Composite the logo onto the cursor.
    ///
    /// `logo_input` is the raw stream spec of the logo file (e.g. `2:v`).
    /// The center slots apply only in centered-text mode; otherwise corner
    /// algebra is used.
    pub fn composite_logo(&mut self, logo: &LogoOverlay, logo_input: &str, centered_mode: bool) {
        let opacity = logo.clamped_opacity();
        self.push_side(
            vec![logo_input.to_string()],
            format!(
                "format=rgba,scale=iw*{}:-1,colorchannelmixer=aa={}",
                logo.scale, opacity
            ),
            "lg",
        );

        let (x, y) = if centered_mode && logo.anchor.is_center_slot() {
            let fraction = match logo.anchor {
                Anchor::CenterBeforeTitle => LOGO_BEFORE_TITLE_FRACTION,
                _ => LOGO_AFTER_TAGLINE_FRACTION,
            };
            ("(W-w)/2".to_string(), format!("H*{fraction:.2}"))
        } else {
            corner_position(logo.anchor, OVERLAY_SYMBOLS)
        };

        self.push_chained(
            vec!["lg".to_string()],
            format!("overlay={x}:{y}:format=auto"),
            "with_logo",
        );
    }

    /// Append the centered text stack: one drawtext node per line,
    /// horizontally centered, chained so lines never overlap.
    ///
    /// Each line arrives paired with its slot index (0 = title, 1 =
    /// subtitle, 2 = tagline); the vertical fraction belongs to the slot,
    /// not to the line's position in the filtered list, so a lone tagline
    /// still renders at the tagline height.
    pub fn draw_centered_stack(&mut self, lines: &[(usize, &TextLine)], fonts: &FontSet, boxed: bool) {
        for (i, (slot, line)) in lines.iter().enumerate() {
            let fraction = STACK_FRACTIONS[(*slot).min(STACK_FRACTIONS.len() - 1)];
            let expr = drawtext_expr(
                line.text.trim(),
                line.font_size,
                fonts,
                "(w-text_w)/2".to_string(),
                format!("h*{fraction:.2}-text_h/2"),
                0.98,
                boxed.then_some(STACK_BOX_BORDER),
            );
            self.push_chained(Vec::new(), expr, format!("txt{}", i + 1));
        }
    }

    /// Append the single corner-anchored text line.
    pub fn draw_corner_text(&mut self, overlay: &SimpleOverlay, fonts: &FontSet, boxed: bool) {
        let (x, y) = corner_position(overlay.anchor, DRAWTEXT_SYMBOLS);
        let expr = drawtext_expr(
            overlay.text.trim(),
            overlay.font_size,
            fonts,
            x,
            y,
            0.96,
            boxed.then_some(CORNER_BOX_BORDER),
        );
        self.push_chained(Vec::new(), expr, "vout");
    }

    /// Serialize to the `-filter_complex` syntax: `[in..]expr[out]` clauses
    /// joined by semicolons.
    pub fn to_filter_complex(&self) -> String {
        self.nodes
            .iter()
            .map(|node| {
                let inputs: String = node.inputs.iter().map(|l| format!("[{l}]")).collect();
                format!("{inputs}{}[{}]", node.expr, node.output)
            })
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Render one drawtext expression.
fn drawtext_expr(
    text: &str,
    font_size: u32,
    fonts: &FontSet,
    x: String,
    y: String,
    alpha: f64,
    box_border: Option<u32>,
) -> String {
    let font = fonts.pick(text).to_string_lossy().to_string();
    let escaped = escape_drawtext(text);

    let mut expr = format!(
        "drawtext=fontfile='{font}':text='{escaped}':fontsize={font_size}:\
         fontcolor=white@{alpha}:shadowcolor=black@0.6:shadowx=2:shadowy=2:x={x}:y={y}"
    );
    if let Some(border) = box_border {
        expr.push_str(&format!(":box=1:boxcolor=black@0.25:boxborderw={border}"));
    }
    expr
}

/// Build the full compose graph for the final encode.
///
/// Returns an empty graph (cursor still `0:v`) for the bare pass-through
/// case, in which the caller maps the raw stream directly.
pub fn build_compose_graph(
    is_image: bool,
    logo: Option<&LogoOverlay>,
    logo_input: Option<usize>,
    text: &TextLayout,
    text_background: bool,
    fonts: &FontSet,
) -> FilterGraph {
    let mut graph = FilterGraph::new("0:v");

    if is_image {
        graph.normalize_still();
    }

    if let (Some(logo), Some(index)) = (logo, logo_input) {
        graph.composite_logo(logo, &format!("{index}:v"), text.is_centered());
    }

    match text {
        TextLayout::CenteredStack { .. } => {
            let lines = text.stack_lines();
            graph.draw_centered_stack(&lines, fonts, text_background);
        }
        TextLayout::Corner(overlay) if !overlay.text.trim().is_empty() => {
            graph.draw_corner_text(overlay, fonts, text_background);
        }
        _ => {}
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fonts() -> FontSet {
        FontSet {
            latin: PathBuf::from("/fonts/latin.ttf"),
            thai: PathBuf::from("/fonts/thai.ttf"),
        }
    }

    #[test]
    fn test_escape_each_character_once() {
        assert_eq!(escape_drawtext("a\\b:c'd"), "a\\\\b\\:c\\'d");
    }

    #[test]
    fn test_escape_order_backslash_first() {
        // A lone colon must not end up with a doubled backslash.
        assert_eq!(escape_drawtext(":"), "\\:");
        assert_eq!(escape_drawtext("\\:"), "\\\\\\:");
    }

    #[test]
    fn test_font_selection() {
        let fonts = fonts();
        assert_eq!(fonts.pick("hello"), Path::new("/fonts/latin.ttf"));
        assert_eq!(fonts.pick("สวัสดี"), Path::new("/fonts/thai.ttf"));
        assert_eq!(fonts.pick("mixed สวัสดี text"), Path::new("/fonts/thai.ttf"));
        assert_eq!(fonts.pick(""), Path::new("/fonts/latin.ttf"));
    }

    #[test]
    fn test_corner_algebra_bottom_right_default() {
        let (x, y) = corner_position(Anchor::BottomRight, OVERLAY_SYMBOLS);
        assert_eq!(x, "W-w-40");
        assert_eq!(y, "H-h-40");

        let (x, y) = corner_position(Anchor::BottomRight, DRAWTEXT_SYMBOLS);
        assert_eq!(x, "w-text_w-40");
        assert_eq!(y, "h-text_h-40");
    }

    #[test]
    fn test_corner_algebra_other_corners() {
        let (x, y) = corner_position(Anchor::TopLeft, OVERLAY_SYMBOLS);
        assert_eq!((x.as_str(), y.as_str()), ("40", "40"));

        let (x, y) = corner_position(Anchor::TopRight, OVERLAY_SYMBOLS);
        assert_eq!((x.as_str(), y.as_str()), ("W-w-40", "40"));

        let (x, y) = corner_position(Anchor::BottomLeft, OVERLAY_SYMBOLS);
        assert_eq!((x.as_str(), y.as_str()), ("40", "H-h-40"));
    }

    #[test]
    fn test_logo_center_slots() {
        let mut logo = LogoOverlay::from_path("logo.png");
        logo.anchor = Anchor::CenterBeforeTitle;

        let mut graph = FilterGraph::new("0:v");
        graph.composite_logo(&logo, "2:v", true);
        let filter = graph.to_filter_complex();
        assert!(filter.contains("overlay=(W-w)/2:H*0.22"));

        logo.anchor = Anchor::CenterAfterTagline;
        let mut graph = FilterGraph::new("0:v");
        graph.composite_logo(&logo, "2:v", true);
        assert!(graph.to_filter_complex().contains("H*0.78"));
    }

    #[test]
    fn test_logo_center_slot_outside_centered_mode_falls_back() {
        let mut logo = LogoOverlay::from_path("logo.png");
        logo.anchor = Anchor::CenterBeforeTitle;

        let mut graph = FilterGraph::new("0:v");
        graph.composite_logo(&logo, "2:v", false);
        assert!(graph.to_filter_complex().contains("overlay=W-w-40:H-h-40"));
    }

    #[test]
    fn test_logo_chain_scales_and_fades() {
        let mut logo = LogoOverlay::from_path("logo.png");
        logo.scale = 0.25;
        logo.opacity = 1.4;

        let mut graph = FilterGraph::new("0:v");
        graph.composite_logo(&logo, "2:v", false);

        let filter = graph.to_filter_complex();
        assert!(filter.contains("[2:v]format=rgba,scale=iw*0.25:-1,colorchannelmixer=aa=1[lg]"));
        assert!(filter.contains("[0:v][lg]overlay="));
        assert_eq!(graph.cursor(), "with_logo");
    }

    #[test]
    fn test_centered_stack_fractions_and_chaining() {
        let title = TextLine::new("Title", 64);
        let subtitle = TextLine::new("Sub", 48);
        let tagline = TextLine::new("Tag", 36);

        let mut graph = FilterGraph::new("0:v");
        graph.draw_centered_stack(&[(0, &title), (1, &subtitle), (2, &tagline)], &fonts(), true);

        assert_eq!(graph.nodes().len(), 3);
        let filter = graph.to_filter_complex();
        assert!(filter.contains("y=h*0.35-text_h/2"));
        assert!(filter.contains("y=h*0.50-text_h/2"));
        assert!(filter.contains("y=h*0.65-text_h/2"));
        assert!(filter.contains("x=(w-text_w)/2"));
        assert!(filter.contains("boxborderw=16"));

        // Each line consumes the previous output.
        assert_eq!(graph.nodes()[1].inputs, vec!["txt1".to_string()]);
        assert_eq!(graph.nodes()[2].inputs, vec!["txt2".to_string()]);
        assert_eq!(graph.cursor(), "txt3");
    }

    #[test]
    fn test_tagline_only_renders_at_tagline_height() {
        let tagline = TextLine::new("Tag", 36);

        let mut graph = FilterGraph::new("0:v");
        graph.draw_centered_stack(&[(2, &tagline)], &fonts(), true);

        assert_eq!(graph.nodes().len(), 1);
        let filter = graph.to_filter_complex();
        assert!(filter.contains("y=h*0.65-text_h/2"));
        assert!(!filter.contains("h*0.35"));
        assert_eq!(graph.cursor(), "txt1");
    }

    #[test]
    fn test_title_and_tagline_skip_subtitle_height() {
        let title = TextLine::new("Title", 64);
        let tagline = TextLine::new("Tag", 36);

        let mut graph = FilterGraph::new("0:v");
        graph.draw_centered_stack(&[(0, &title), (2, &tagline)], &fonts(), true);

        let filter = graph.to_filter_complex();
        assert!(filter.contains("y=h*0.35-text_h/2"));
        assert!(filter.contains("y=h*0.65-text_h/2"));
        assert!(!filter.contains("h*0.50"));
        // Labels still number sequentially regardless of slot gaps.
        assert_eq!(graph.nodes()[1].inputs, vec!["txt1".to_string()]);
        assert_eq!(graph.cursor(), "txt2");
    }

    #[test]
    fn test_corner_text_border_and_alpha() {
        let overlay = SimpleOverlay {
            text: "credit".to_string(),
            font_size: 48,
            anchor: Anchor::TopLeft,
        };

        let mut graph = FilterGraph::new("0:v");
        graph.draw_corner_text(&overlay, &fonts(), true);

        let filter = graph.to_filter_complex();
        assert!(filter.contains("fontcolor=white@0.96"));
        assert!(filter.contains("boxborderw=12"));
        assert!(filter.contains("x=40:y=40"));
    }

    #[test]
    fn test_box_can_be_disabled() {
        let overlay = SimpleOverlay {
            text: "credit".to_string(),
            font_size: 48,
            anchor: Anchor::BottomRight,
        };

        let mut graph = FilterGraph::new("0:v");
        graph.draw_corner_text(&overlay, &fonts(), false);
        assert!(!graph.to_filter_complex().contains("box=1"));
    }

    #[test]
    fn test_build_graph_still_image_with_title_only() {
        let layout = TextLayout::CenteredStack {
            title: Some(TextLine::new("Title", 64)),
            subtitle: None,
            tagline: None,
        };
        let graph = build_compose_graph(true, None, None, &layout, true, &fonts());

        // fps normalization node followed by exactly one text-draw node.
        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(graph.nodes()[0].expr, "fps=24");
        assert!(graph.nodes()[1].expr.starts_with("drawtext="));
        assert_eq!(graph.nodes()[1].inputs, vec!["base".to_string()]);
    }

    #[test]
    fn test_build_graph_bare_passthrough_is_empty() {
        let graph = build_compose_graph(false, None, None, &TextLayout::None, true, &fonts());
        assert!(graph.is_empty());
        assert_eq!(graph.cursor(), "0:v");
    }

    #[test]
    fn test_filter_text_stays_valid_for_hostile_input() {
        let overlay = SimpleOverlay {
            text: "a'b:c\\d".to_string(),
            font_size: 40,
            anchor: Anchor::BottomRight,
        };
        let mut graph = FilterGraph::new("0:v");
        graph.draw_corner_text(&overlay, &fonts(), true);

        let filter = graph.to_filter_complex();
        assert!(filter.contains("text='a\\'b\\:c\\\\d'"));
    }
}
