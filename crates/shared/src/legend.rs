use serde::{Deserialize, Serialize};

use crate::models::LegendSpec;

/// One labeled color square.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swatch {
    pub position: usize,
    pub label: String,
    pub color: String,
    pub class_value: i32,
}

/// Project a legend into swatches, one per entry, in class order.
pub fn render(legend: &LegendSpec) -> Vec<Swatch> {
    legend
        .entries
        .iter()
        .enumerate()
        .map(|(position, e)| Swatch {
            position,
            label: e.label.clone(),
            color: e.color.clone(),
            class_value: e.value,
        })
        .collect()
}

/// Standalone legend box markup.
pub fn render_html(legend: &LegendSpec) -> String {
    let mut html = String::from(r#"<div class="legend">"#);
    html.push_str(&format!(
        r#"<h5 class="legend-title">{}</h5>"#,
        html_escape::encode_text(&legend.title)
    ));
    for swatch in render(legend) {
        html.push_str(&format!(
            r#"<div class="legend-item" data-class="{}"><span class="legend-swatch" style="background-color:{}"></span><span>{}</span></div>"#,
            html_escape::encode_double_quoted_attribute(&swatch.class_value.to_string()),
            html_escape::encode_double_quoted_attribute(&swatch.color),
            html_escape::encode_text(&swatch.label)
        ));
    }
    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::models::{LegendEntry, Mode};

    #[test]
    fn test_render_preserves_order_and_pairing() {
        let catalog = Catalog::builtin();
        let legend = catalog.visuals().legend(Mode::LandCover).unwrap();
        let swatches = render(legend);
        let labels: Vec<&str> = swatches.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Mangroves", "Bare", "Water", "Other Vegetation"]);
        assert_eq!(swatches[2].color, "#365dcb");
        assert_eq!(swatches[2].position, 2);
    }

    #[test]
    fn test_change_detection_swatches_carry_transition_codes() {
        let catalog = Catalog::builtin();
        let legend = catalog.visuals().legend(Mode::ChangeDetection).unwrap();
        let values: Vec<i32> = render(legend).iter().map(|s| s.class_value).collect();
        assert_eq!(
            values,
            vec![0, 1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23, 30, 31, 32, 33]
        );
    }

    #[test]
    fn test_render_empty_legend() {
        let legend = LegendSpec {
            title: "Empty".into(),
            entries: vec![],
        };
        assert!(render(&legend).is_empty());
        assert_eq!(
            render_html(&legend),
            r#"<div class="legend"><h5 class="legend-title">Empty</h5></div>"#
        );
    }

    #[test]
    fn test_render_html_escapes_labels() {
        let legend = LegendSpec {
            title: "A & B".into(),
            entries: vec![LegendEntry {
                label: "<script>".into(),
                color: "#000".into(),
                value: 7,
            }],
        };
        let html = render_html(&legend);
        assert!(html.contains("A &amp; B"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains(r#"data-class="7""#));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_render_html_quotes_attribute_values() {
        let legend = LegendSpec {
            title: "T".into(),
            entries: vec![LegendEntry {
                label: "x".into(),
                color: "red\" onclick=\"alert(1)".into(),
                value: 0,
            }],
        };
        let html = render_html(&legend);
        assert!(!html.contains(r#"" onclick=""#));
        assert!(html.contains("&quot;"));
    }
}
